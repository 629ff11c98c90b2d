use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Serialize;
use tracing::debug;

use crate::datetime::{
  CalendarDate,
  days_in_month,
  first_weekday,
  iso_date_serde
};
use crate::error::CalendarError;
use crate::event::Event;

pub const DAYS_PER_WEEK: usize = 7;

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct DayCell {
  #[serde(with = "iso_date_serde")]
  pub date:        CalendarDate,
  pub is_today:    bool,
  pub is_selected: bool,
  pub has_event:   bool
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
#[serde(
  tag = "type",
  rename_all = "snake_case"
)]
pub enum GridCell {
  Empty,
  Day(DayCell)
}

impl GridCell {
  #[must_use]
  pub fn as_day(
    &self
  ) -> Option<&DayCell> {
    match self {
      | GridCell::Day(cell) => Some(cell),
      | GridCell::Empty => None
    }
  }
}

/// Row-major month layout, seven
/// columns wide. Leading blanks only;
/// the last row is left ragged.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct MonthGrid {
  year:   i32,
  month0: u32,
  cells:  Vec<GridCell>
}

impl MonthGrid {
  #[must_use]
  pub fn year(&self) -> i32 {
    self.year
  }

  #[must_use]
  pub fn month0(&self) -> u32 {
    self.month0
  }

  #[must_use]
  pub fn cells(&self) -> &[GridCell] {
    &self.cells
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Number of leading `Empty` cells.
  #[must_use]
  pub fn offset(&self) -> usize {
    self
      .cells
      .iter()
      .take_while(|cell| {
        matches!(cell, GridCell::Empty)
      })
      .count()
  }

  pub fn day_cells(
    &self
  ) -> impl Iterator<Item = &DayCell> {
    self
      .cells
      .iter()
      .filter_map(GridCell::as_day)
  }

  #[must_use]
  pub fn cell_for(
    &self,
    date: &CalendarDate
  ) -> Option<&DayCell> {
    self
      .day_cells()
      .find(|cell| cell.date == *date)
  }

  pub fn weeks(
    &self
  ) -> impl Iterator<Item = &[GridCell]>
  {
    self.cells.chunks(DAYS_PER_WEEK)
  }

  /// Copy of the cells with trailing
  /// `Empty` padding up to a multiple of
  /// seven, for rectangular rendering.
  #[must_use]
  pub fn padded(&self) -> Vec<GridCell> {
    let mut cells = self.cells.clone();
    let rem = cells.len() % DAYS_PER_WEEK;
    if rem != 0 {
      cells.extend(
        std::iter::repeat_n(
          GridCell::Empty,
          DAYS_PER_WEEK - rem
        )
      );
    }
    cells
  }
}

#[tracing::instrument(
  skip_all,
  fields(
    reference = %reference,
    today = %today,
    selected = %selected,
    events = events.len()
  )
)]
pub fn build_month_grid(
  reference: CalendarDate,
  today: CalendarDate,
  selected: CalendarDate,
  events: &[Event]
) -> Result<MonthGrid, CalendarError> {
  let year = reference.year();
  let month0 = reference.month0();
  let offset =
    first_weekday(year, month0)?;
  let days = days_in_month(year, month0)?;

  let event_days = events
    .iter()
    .map(|event| event.date)
    .filter(|date| {
      date.same_month(&reference)
    })
    .collect::<BTreeSet<_>>();

  let mut cells = Vec::with_capacity(
    (offset + days) as usize
  );
  cells.extend(
    (0..offset).map(|_| GridCell::Empty)
  );
  for day in 1..=days {
    let date = CalendarDate::from_ymd0(
      year, month0, day
    )?;
    cells.push(GridCell::Day(DayCell {
      date,
      is_today: date == today,
      is_selected: date == selected,
      has_event: event_days
        .contains(&date)
    }));
  }

  debug!(
    offset,
    days,
    event_days = event_days.len(),
    "month grid built"
  );

  Ok(MonthGrid {
    year,
    month0,
    cells
  })
}

/// Events on `date`, ascending by start
/// time. Equal times keep input order.
#[must_use]
pub fn events_on_date(
  date: &CalendarDate,
  events: &[Event]
) -> Vec<Event> {
  let mut matched = events
    .iter()
    .filter(|event| event.occurs_on(date))
    .cloned()
    .collect::<Vec<_>>();
  matched
    .sort_by(|a, b| a.time.cmp(&b.time));
  matched
}

/// Shifts by whole months. The result
/// is always pinned to day 1.
pub fn navigate_month(
  reference: CalendarDate,
  delta: i32
) -> Result<CalendarDate, CalendarError> {
  let total = i64::from(reference.year())
    * 12
    + i64::from(reference.month0())
    + i64::from(delta);
  let year = i32::try_from(
    total.div_euclid(12)
  )
  .map_err(|_| {
    CalendarError::invalid(format!(
      "{reference} {delta:+} months"
    ))
  })?;
  let month0 = total.rem_euclid(12) as u32;

  CalendarDate::from_ymd0(year, month0, 1)
    .map_err(|_| {
      CalendarError::invalid(format!(
        "{reference} {delta:+} months"
      ))
    })
}

/// Events dated on or after `from`,
/// ordered by date then start time.
#[must_use]
pub fn upcoming_events(
  events: &[Event],
  from: &CalendarDate,
  limit: usize
) -> Vec<Event> {
  let mut upcoming = events
    .iter()
    .filter(|event| event.date >= *from)
    .cloned()
    .collect::<Vec<_>>();
  upcoming.sort_by(|a, b| {
    a.date
      .cmp(&b.date)
      .then_with(|| a.time.cmp(&b.time))
  });
  upcoming.truncate(limit);
  upcoming
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Locale {
  PtBr,
  En
}

impl FromStr for Locale {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "pt-br" | "pt_br" | "pt" => {
        Ok(Locale::PtBr)
      }
      | "en" | "en-us" | "en_us" => {
        Ok(Locale::En)
      }
      | other => {
        Err(anyhow!(
          "unsupported locale: {other}"
        ))
      }
    }
  }
}

const MONTHS_PT_BR: [&str; 12] = [
  "Janeiro",
  "Fevereiro",
  "Março",
  "Abril",
  "Maio",
  "Junho",
  "Julho",
  "Agosto",
  "Setembro",
  "Outubro",
  "Novembro",
  "Dezembro"
];

const MONTHS_EN: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

#[must_use]
pub fn month_name(
  month0: u32,
  locale: Locale
) -> &'static str {
  let table = match locale {
    | Locale::PtBr => &MONTHS_PT_BR,
    | Locale::En => &MONTHS_EN
  };
  table
    .get(month0 as usize)
    .copied()
    .unwrap_or("?")
}

/// Sunday-first column headers.
#[must_use]
pub fn weekday_labels(
  locale: Locale
) -> [&'static str; 7] {
  match locale {
    | Locale::PtBr => {
      [
        "Dom", "Seg", "Ter", "Qua",
        "Qui", "Sex", "Sáb"
      ]
    }
    | Locale::En => {
      [
        "Sun", "Mon", "Tue", "Wed",
        "Thu", "Fri", "Sat"
      ]
    }
  }
}
