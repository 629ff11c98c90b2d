pub mod app;
pub mod calendar;
pub mod checklist;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod notification;
pub mod render;
pub mod store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar::{
  DayCell,
  GridCell,
  MonthGrid,
  build_month_grid,
  events_on_date,
  navigate_month
};
pub use datetime::CalendarDate;
pub use error::CalendarError;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting jhams CLI"
  );
  debug!(
    rc_overrides = ?pre.rc_overrides,
    "preprocessed rc overrides"
  );

  let mut cfg = config::Config::load(
    cli.academyrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let seed_path = cli
    .data
    .clone()
    .or_else(|| cfg.seed_path());
  let store = match seed_path {
    | Some(path) => {
      store::AcademyStore::load(&path)?
    }
    | None => {
      store::AcademyStore::seeded()?
    }
  };

  let today = match cli.today.as_deref() {
    | Some(raw) => {
      CalendarDate::parse_iso(raw)
        .context("invalid --today")?
    }
    | None => match cfg.pinned_today()? {
      | Some(today) => today,
      | None => {
        let timezone =
          datetime::resolve_timezone(
            cfg
              .get("calendar.timezone")
              .as_deref()
          );
        datetime::today_in(timezone)
      }
    }
  };

  let mut app =
    app::AppState::new(store, today)?;
  let renderer =
    render::Renderer::new(&cfg)?;
  let command = match cli.command {
    | Some(command) => command,
    | None => {
      cli::Command::from_default(&cfg)?
    }
  };

  commands::dispatch(
    &mut app,
    &cfg,
    &renderer,
    command
  )?;

  info!("done");
  Ok(())
}
