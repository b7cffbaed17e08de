//! Date alignment: clock strings, forecast day labels and remote wall-clock time.
//!
//! Everything here is pure. An [`Instant`] is read through UTC calendar
//! fields only, so a caller that wants local or remote time shifts the
//! instant first (see [`Instant::local_now`] and [`resolve_remote_wall_clock`]).

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skyglance_core::DAYS_IN_WEEK;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// 1970-01-01 was a Thursday (0 = Sunday).
const EPOCH_WEEKDAY: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Weekday table must have exactly 7 names, got {0}")]
    InvalidWeekdayTable(usize),
}

/// Absolute point in time, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(i64);

impl Instant {
    pub const fn from_epoch_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn epoch_millis(self) -> i64 {
        self.0
    }

    /// Current UTC instant.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Current instant shifted by this machine's UTC offset, so its UTC fields
    /// read as the local wall clock.
    pub fn local_now() -> Self {
        Self::now().to_local_wall_clock()
    }

    /// Shift a UTC instant by the offset this machine's zone had at that moment.
    pub fn to_local_wall_clock(self) -> Self {
        let offset = DateTime::from_timestamp_millis(self.0)
            .map(|utc| utc.with_timezone(&Local).offset().local_minus_utc())
            .unwrap_or(0);
        self.shifted_by_seconds(i64::from(offset))
    }

    pub fn shifted_by_seconds(self, seconds: i64) -> Self {
        Self(self.0.saturating_add(seconds.saturating_mul(1000)))
    }

    /// Day of week in UTC, 0 = Sunday.
    pub fn weekday_index(self) -> usize {
        let days = self.0.div_euclid(MILLIS_PER_DAY);
        // rem_euclid keeps this in 0..7
        (days + EPOCH_WEEKDAY).rem_euclid(DAYS_IN_WEEK as i64) as usize
    }

    /// Hour of day in UTC (0-23).
    pub fn hour(self) -> u32 {
        (self.0.rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_HOUR) as u32
    }

    /// Minute of hour in UTC (0-59).
    pub fn minute(self) -> u32 {
        (self.0.rem_euclid(MILLIS_PER_HOUR) / MILLIS_PER_MINUTE) as u32
    }

    /// Calendar date in UTC, `None` outside chrono's range.
    pub fn utc_date(self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.0).map(|dt| dt.date_naive())
    }
}

/// Seven display names, index 0 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdayTable {
    names: Vec<String>,
}

impl WeekdayTable {
    /// Build a table, rejecting anything that isn't exactly seven names.
    pub fn new<I, S>(names: I) -> Result<Self, ClockError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != DAYS_IN_WEEK {
            return Err(ClockError::InvalidWeekdayTable(names.len()));
        }
        Ok(Self { names })
    }

    pub fn english() -> Self {
        Self {
            names: [
                "Sunday",
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }

    /// Name at `index`, taken modulo 7.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index % DAYS_IN_WEEK]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for WeekdayTable {
    fn default() -> Self {
        Self::english()
    }
}

/// A location's UTC offset plus its daylight-saving adjustment, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimezoneOffset {
    pub raw_offset_seconds: i32,
    pub dst_offset_seconds: i32,
}

impl TimezoneOffset {
    pub const fn new(raw_offset_seconds: i32, dst_offset_seconds: i32) -> Self {
        Self {
            raw_offset_seconds,
            dst_offset_seconds,
        }
    }

    /// DST counts as active whenever the provider reports a non-zero DST offset.
    ///
    /// A zone observing DST with a zero adjustment is indistinguishable from
    /// one that doesn't observe it; upstream APIs give us nothing better.
    pub const fn is_dst_active(&self) -> bool {
        self.dst_offset_seconds != 0
    }

    /// Offset actually applied to UTC to get the remote wall clock.
    pub fn effective_offset_seconds(&self) -> i64 {
        if self.is_dst_active() {
            i64::from(self.raw_offset_seconds) + i64::from(self.dst_offset_seconds)
        } else {
            i64::from(self.raw_offset_seconds)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

/// Display form of an instant: `"Tuesday 9:05"` or `"Tuesday 9:05 PM"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedTimestamp {
    pub weekday: String,
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Option<Meridiem>,
}

impl fmt::Display for FormattedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{:02}", self.weekday, self.hour, self.minute)?;
        if let Some(meridiem) = self.meridiem {
            write!(f, " {}", meridiem)?;
        }
        Ok(())
    }
}

/// Format an instant using its UTC fields.
pub fn format_timestamp(
    instant: Instant,
    table: &WeekdayTable,
    use_12_hour: bool,
) -> FormattedTimestamp {
    let hour = instant.hour();
    let (hour, meridiem) = if use_12_hour {
        let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
        let display = match hour % 12 {
            0 => 12,
            h => h,
        };
        (display, Some(meridiem))
    } else {
        (hour, None)
    };

    FormattedTimestamp {
        weekday: table.name(instant.weekday_index()).to_string(),
        hour,
        minute: instant.minute(),
        meridiem,
    }
}

/// The `count` day names following the instant's own day.
///
/// The reference day itself is never included: from a Wednesday, the first
/// entry is Thursday.
pub fn rotate_weekdays(instant: Instant, table: &WeekdayTable, count: usize) -> Vec<String> {
    let today = instant.weekday_index();
    (1..=count)
        .map(|offset| table.name((today + offset) % DAYS_IN_WEEK).to_string())
        .collect()
}

/// Shift a UTC reference instant to the wall clock at a remote location.
///
/// Format the result with [`format_timestamp`]; it reads UTC fields, which
/// now hold the remote time.
pub fn resolve_remote_wall_clock(reference: Instant, offset: TimezoneOffset) -> Instant {
    reference.shifted_by_seconds(offset.effective_offset_seconds())
}
