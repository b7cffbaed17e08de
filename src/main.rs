//! Skyglance CLI
//!
//! Current weather, remote local time and a short forecast in the terminal.

mod renderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use skyglance_core::{App, AppError, Config, ProviderKind, TemperatureUnit};
use skyglance_weather::{
    build_provider, build_timezone_lookup, format_timestamp, resolve_remote_wall_clock,
    rotate_weekdays, Dashboard, DashboardContext, DashboardError, Instant, IpGeolocator,
    TimezoneOffset, WeekdayTable,
};

use crate::renderer::TerminalRenderer;

#[derive(Parser)]
#[command(name = "skyglance")]
#[command(author, version, about = "Weather and local time at a glance", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SKYGLANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Show this city instead of the detected location
    #[arg(long)]
    city: Option<String>,

    /// Temperature unit (celsius / fahrenheit)
    #[arg(long)]
    unit: Option<TemperatureUnit>,

    /// Weather backend (openweathermap / weatherapi)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// 12-hour clock
    #[arg(long = "12h")]
    twelve_hour: bool,

    /// Keep refreshing every `refresh_minutes` until interrupted
    #[arg(long)]
    watch: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the time without any network access
    Clock {
        /// Standard UTC offset in seconds; omit for this machine's local time
        #[arg(long, allow_hyphen_values = true)]
        raw_offset: Option<i32>,

        /// Daylight-saving offset in seconds, used with --raw-offset
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dst_offset: i32,

        /// 12-hour clock
        #[arg(long = "12h")]
        twelve_hour: bool,
    },

    /// Print the names of the days after today
    Days {
        #[arg(short, long, default_value = "7")]
        count: usize,
    },

    /// Inspect the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Check the configuration for errors and warnings
    Validate,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn print_clock(
    config: &Config,
    raw_offset: Option<i32>,
    dst_offset: i32,
    twelve_hour: bool,
) -> Result<()> {
    let table = WeekdayTable::new(config.clock.weekday_names.iter())?;
    let now = Instant::now();
    let wall_clock = match raw_offset {
        Some(raw) => resolve_remote_wall_clock(now, TimezoneOffset::new(raw, dst_offset)),
        None => now.to_local_wall_clock(),
    };
    let use_12_hour = twelve_hour || config.clock.use_12_hour;
    println!("{}", format_timestamp(wall_clock, &table, use_12_hour));
    Ok(())
}

fn print_days(config: &Config, count: usize) -> Result<()> {
    let table = WeekdayTable::new(config.clock.weekday_names.iter())?;
    for name in rotate_weekdays(Instant::local_now(), &table, count) {
        println!("{name}");
    }
    Ok(())
}

fn run_config_action(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => Config::config_path()?,
            };
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(path)?;
            let text = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            print!("{text}");
        }
        ConfigAction::Validate => {
            let config = load_config(path)?;
            let validation = config.validate();
            for warning in &validation.warnings {
                println!("warning: {warning}");
            }
            for error in &validation.errors {
                println!("error: {error}");
            }
            if !validation.is_valid() {
                bail!("{} configuration error(s)", validation.errors.len());
            }
            println!("Configuration OK");
        }
    }
    Ok(())
}

async fn run_dashboard(cli: Cli) -> Result<()> {
    let app = match &cli.config {
        Some(path) => App::from_path(path)?,
        None => App::new()?,
    };

    let mut config = app.config().clone();
    if let Some(provider) = cli.provider {
        config.weather.provider = provider;
    }
    if let Some(unit) = cli.unit {
        config.weather.temperature_unit = unit;
    }
    if cli.twelve_hour {
        config.clock.use_12_hour = true;
    }

    let provider =
        build_provider(config.weather.provider, &config, app.keys()).map_err(AppError::from)?;
    let timezone = build_timezone_lookup(&config, app.keys())?;
    let geolocator = Arc::new(IpGeolocator::from_config(&config)?);
    let context = DashboardContext::from_config(&config)?;
    let mut dashboard = Dashboard::new(provider, timezone, geolocator, context);
    let mut renderer = TerminalRenderer::stdout();

    let refresh_every = Duration::from_secs(u64::from(config.weather.refresh_minutes.max(1)) * 60);
    loop {
        // Repeated searches keep the unit chosen by --unit
        let result = match cli.city.as_deref() {
            Some(city) => dashboard.search_city(city, false, &mut renderer).await,
            None => dashboard.show_current_location(&mut renderer).await,
        };
        if !cli.watch {
            return match result {
                Ok(_) => Ok(()),
                Err(DashboardError::Provider(e)) => Err(AppError::from(e).into()),
                Err(e) => Err(e.into()),
            };
        }
        if let Err(e) = result {
            tracing::warn!("Refresh failed: {}", e);
        }

        tokio::select! {
            _ = tokio::time::sleep(refresh_every) => println!(),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, exiting");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    skyglance_core::init(log_filter_from_verbosity(cli.verbose))?;

    match cli.command.take() {
        Some(Commands::Clock {
            raw_offset,
            dst_offset,
            twelve_hour,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            print_clock(&config, raw_offset, dst_offset, twelve_hour)
        }
        Some(Commands::Days { count }) => {
            let config = load_config(cli.config.as_deref())?;
            print_days(&config, count)
        }
        Some(Commands::Config { action }) => run_config_action(action, cli.config.as_deref()),
        None => run_dashboard(cli).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "skyglance",
            "--city",
            "Lyon",
            "--unit",
            "f",
            "--provider",
            "weatherapi",
            "--12h",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.city.as_deref(), Some("Lyon"));
        assert_eq!(cli.unit, Some(TemperatureUnit::Fahrenheit));
        assert_eq!(cli.provider, Some(ProviderKind::WeatherApi));
        assert!(cli.twelve_hour);
        assert_eq!(log_filter_from_verbosity(cli.verbose), "trace");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_clock_negative_offset() {
        let cli = Cli::try_parse_from(["skyglance", "clock", "--raw-offset", "-18000"]).unwrap();
        match cli.command {
            Some(Commands::Clock {
                raw_offset,
                dst_offset,
                ..
            }) => {
                assert_eq!(raw_offset, Some(-18_000));
                assert_eq!(dst_offset, 0);
            }
            _ => unreachable!("expected clock subcommand"),
        }
    }

    #[test]
    fn test_days_rejects_negative_count() {
        assert!(Cli::try_parse_from(["skyglance", "days", "--count", "-1"]).is_err());
        assert!(Cli::try_parse_from(["skyglance", "days", "--count", "3"]).is_ok());
    }

    #[test]
    fn test_unknown_unit_rejected() {
        assert!(Cli::try_parse_from(["skyglance", "--unit", "kelvin"]).is_err());
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter_from_verbosity(0), "info");
        assert_eq!(log_filter_from_verbosity(1), "debug");
        assert_eq!(log_filter_from_verbosity(5), "trace");
    }
}
