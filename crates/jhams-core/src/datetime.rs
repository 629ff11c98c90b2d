use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{
  Datelike,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::CalendarError;

const TIMEZONE_ENV_VAR: &str =
  "JHAMS_TIMEZONE";
pub const DEFAULT_TIMEZONE: &str =
  "America/Sao_Paulo";

/// A civil date compared by calendar
/// day only. Month is exposed
/// zero-based through `month0`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord
)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  pub fn from_ymd0(
    year: i32,
    month0: u32,
    day: u32
  ) -> Result<Self, CalendarError> {
    if month0 > 11 {
      return Err(CalendarError::invalid(
        format!(
          "{year:04}-{:02}-{day:02}",
          month_number(month0)
        )
      ));
    }
    NaiveDate::from_ymd_opt(
      year,
      month0 + 1,
      day
    )
    .map(Self)
    .ok_or_else(|| {
      CalendarError::invalid(format!(
        "{year:04}-{:02}-{day:02}",
        month_number(month0)
      ))
    })
  }

  /// Parses a strict `YYYY-MM-DD`
  /// string.
  pub fn parse_iso(
    raw: &str
  ) -> Result<Self, CalendarError> {
    let trimmed = raw.trim();
    let caps = iso_date_regex()
      .and_then(|re| re.captures(trimmed))
      .ok_or_else(|| {
        CalendarError::invalid(trimmed)
      })?;

    let field = |idx: usize| {
      caps
        .get(idx)
        .and_then(|m| {
          m.as_str().parse::<u32>().ok()
        })
        .ok_or_else(|| {
          CalendarError::invalid(trimmed)
        })
    };
    let year = field(1)? as i32;
    let month = field(2)?;
    let day = field(3)?;
    if month == 0 {
      return Err(CalendarError::invalid(
        trimmed
      ));
    }

    Self::from_ymd0(year, month - 1, day)
      .map_err(|_| {
        CalendarError::invalid(trimmed)
      })
  }

  /// Parses `YYYY-MM` into the first
  /// day of that month.
  pub fn parse_year_month(
    raw: &str
  ) -> Result<Self, CalendarError> {
    let trimmed = raw.trim();
    if !year_month_regex()
      .is_some_and(|re| re.is_match(trimmed))
    {
      return Err(CalendarError::invalid(
        trimmed
      ));
    }
    Self::parse_iso(&format!(
      "{trimmed}-01"
    ))
  }

  #[must_use]
  pub fn year(&self) -> i32 {
    self.0.year()
  }

  #[must_use]
  pub fn month0(&self) -> u32 {
    self.0.month0()
  }

  #[must_use]
  pub fn day(&self) -> u32 {
    self.0.day()
  }

  /// 0 = Sunday .. 6 = Saturday.
  #[must_use]
  pub fn weekday_index(&self) -> u32 {
    self
      .0
      .weekday()
      .num_days_from_sunday()
  }

  #[must_use]
  pub fn same_month(
    &self,
    other: &CalendarDate
  ) -> bool {
    self.year() == other.year()
      && self.month0() == other.month0()
  }

  #[must_use]
  pub fn to_iso(&self) -> String {
    self
      .0
      .format("%Y-%m-%d")
      .to_string()
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.to_iso())
  }
}

impl FromStr for CalendarDate {
  type Err = CalendarError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::parse_iso(s)
  }
}

#[must_use]
pub fn is_leap_year(year: i32) -> bool {
  year % 4 == 0
    && (year % 100 != 0
      || year % 400 == 0)
}

/// One-based month number for error
/// messages; widened so any `u32` input
/// formats without overflow.
fn month_number(month0: u32) -> u64 {
  u64::from(month0) + 1
}

pub fn days_in_month(
  year: i32,
  month0: u32
) -> Result<u32, CalendarError> {
  let days = match month0 {
    | 0 | 2 | 4 | 6 | 7 | 9 | 11 => 31,
    | 3 | 5 | 8 | 10 => 30,
    | 1 if is_leap_year(year) => 29,
    | 1 => 28,
    | _ => {
      return Err(CalendarError::invalid(
        format!(
          "{year:04}-{:02}",
          month_number(month0)
        )
      ));
    }
  };
  Ok(days)
}

/// Weekday index (0 = Sunday) of the
/// 1st of the month.
pub fn first_weekday(
  year: i32,
  month0: u32
) -> Result<u32, CalendarError> {
  CalendarDate::from_ymd0(
    year, month0, 1
  )
  .map(|first| first.weekday_index())
}

/// Fixed-width 24-hour `HH:MM`.
#[must_use]
pub fn is_clock_time(raw: &str) -> bool {
  clock_regex()
    .is_some_and(|re| re.is_match(raw))
}

pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) = parse_timezone(
      raw,
      "calendar.timezone"
    )
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "DEFAULT_TIMEZONE"
  )
  .unwrap_or_else(|| {
    tracing::error!(
      "failed to parse fallback \
       timezone; using UTC"
    );
    chrono_tz::UTC
  })
}

#[must_use]
pub fn today_in(
  timezone: Tz
) -> CalendarDate {
  CalendarDate(
    Utc::now()
      .with_timezone(&timezone)
      .date_naive()
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved timezone"
      );
      Some(tz)
    }
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

fn iso_date_regex()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^(\d{4})-(\d{2})-(\d{2})$"
    )
    .ok()
  })
  .as_ref()
}

fn year_month_regex()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"^\d{4}-\d{2}$").ok()
  })
  .as_ref()
}

fn clock_regex()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^([01]\d|2[0-3]):[0-5]\d$"
    )
    .ok()
  })
  .as_ref()
}

pub mod iso_date_serde {
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::CalendarDate;

  pub fn serialize<S>(
    date: &CalendarDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&date.to_iso())
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<CalendarDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    CalendarDate::parse_iso(&raw)
      .map_err(serde::de::Error::custom)
  }
}
