//! Plain-text dashboard output.

use std::io::Write;

use skyglance_weather::{
    display_round, CurrentConditions, ForecastCard, FormattedTimestamp, RenderPort, TemperatureUnit,
    Unavailable,
};

/// Renders dashboard sections as lines of text
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!("Failed to write dashboard output: {}", e);
        }
    }
}

/// Active unit in brackets, then the one a toggle switches to
fn unit_toggle(active: TemperatureUnit) -> String {
    format!("[{}] {}", active.symbol(), active.toggled().symbol())
}

fn forecast_line(card: &ForecastCard) -> String {
    match &card.forecast {
        Some(day) => format!(
            "{:<10} {} {:>3}° / {:>3}°  {}",
            card.day_name,
            day.condition.glyph(),
            display_round(day.high),
            display_round(day.low),
            day.description
        ),
        None => format!("{:<10} --", card.day_name),
    }
}

impl<W: Write + Send> RenderPort for TerminalRenderer<W> {
    fn render_current(&mut self, current: &CurrentConditions) {
        self.line(&format!(
            "{} {}  {}{}  {}",
            current.condition.glyph(),
            current.location_name,
            display_round(current.temperature),
            current.unit.symbol(),
            current.description
        ));
        self.line(&format!(
            "Humidity {}%  Wind {} {}",
            current.humidity,
            display_round(current.wind_speed),
            current.wind_unit.label()
        ));
    }

    fn render_clock(&mut self, clock: &FormattedTimestamp) {
        self.line(&format!("Local time: {clock}"));
    }

    fn render_forecast(&mut self, cards: &[ForecastCard]) {
        for card in cards {
            self.line(&forecast_line(card));
        }
    }

    fn render_unit(&mut self, unit: TemperatureUnit) {
        self.line(&format!("Units: {}", unit_toggle(unit)));
    }

    fn render_unavailable(&mut self, unavailable: &Unavailable) {
        self.line(&format!(
            "! {} unavailable: {}",
            unavailable.section, unavailable.message
        ));
    }
}
