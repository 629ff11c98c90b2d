use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::app::AppState;
use crate::cli::{AlertsArgs, Command, DayArgs, MonthArgs};
use crate::config::Config;
use crate::datetime::CalendarDate;
use crate::notification::NotificationFilter;
use crate::render::Renderer;

const DEFAULT_UPCOMING_LIMIT: usize = 3;

#[instrument(skip(app, cfg, renderer, command))]
pub fn dispatch(
    app: &mut AppState,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Month(args) => cmd_month(app, renderer, args),
        Command::Day(args) => cmd_day(app, renderer, args),
        Command::Upcoming { limit } => cmd_upcoming(app, cfg, renderer, limit),
        Command::Checklist { toggle } => cmd_checklist(app, renderer, &toggle),
        Command::Alerts(args) => cmd_alerts(app, renderer, args),
        Command::Config => renderer.print_config(cfg),
    }
}

#[instrument(skip(app, renderer))]
fn cmd_month(app: &mut AppState, renderer: &Renderer, args: MonthArgs) -> anyhow::Result<()> {
    info!("command month");

    if let Some(raw) = args.month.as_deref() {
        let month = CalendarDate::parse_year_month(raw).context("invalid --month")?;
        app.show_month(month)?;
    }
    if args.shift != 0 {
        app.shift_month(args.shift)?;
    }
    if let Some(raw) = args.select.as_deref() {
        let selected = CalendarDate::parse_iso(raw).context("invalid --select")?;
        app.select_date(selected);
    }

    let grid = app.month_grid()?;
    if args.json {
        return renderer.print_json(&grid);
    }

    renderer.print_month(&grid, args.pad)?;
    let selected = app.selected_date();
    if grid.cell_for(&selected).is_some() {
        let events = app.selected_events();
        if !events.is_empty() {
            println!();
            renderer.print_events(&selected, &events)?;
        }
    }
    Ok(())
}

#[instrument(skip(app, renderer))]
fn cmd_day(app: &mut AppState, renderer: &Renderer, args: DayArgs) -> anyhow::Result<()> {
    info!("command day");

    let date = CalendarDate::parse_iso(&args.date).context("invalid day")?;
    app.select_date(date);
    let events = app.selected_events();
    debug!(%date, count = events.len(), "events for day");

    if args.json {
        return renderer.print_json(&events);
    }
    renderer.print_events(&date, &events)
}

#[instrument(skip(app, cfg, renderer))]
fn cmd_upcoming(
    app: &AppState,
    cfg: &Config,
    renderer: &Renderer,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    info!("command upcoming");

    let limit = match limit {
        Some(limit) => limit,
        None => cfg
            .get_usize("upcoming.limit")?
            .unwrap_or(DEFAULT_UPCOMING_LIMIT),
    };
    renderer.print_upcoming(&app.upcoming(limit))
}

#[instrument(skip(app, renderer))]
fn cmd_checklist(app: &mut AppState, renderer: &Renderer, toggle: &[u64]) -> anyhow::Result<()> {
    info!("command checklist");

    for id in toggle {
        if !app.toggle_checklist(*id) {
            return Err(anyhow!("no checklist item with id {id}"));
        }
    }
    renderer.print_checklist(&app.store.checklist)
}

#[instrument(skip(app, renderer))]
fn cmd_alerts(app: &mut AppState, renderer: &Renderer, args: AlertsArgs) -> anyhow::Result<()> {
    info!("command alerts");

    let filter = args
        .filter
        .parse::<NotificationFilter>()
        .context("invalid --filter")?;

    for id in &args.read {
        if !app.mark_notification_read(*id) {
            warn!(id, "no notification to mark read");
        }
    }
    if args.read_all {
        app.mark_all_read();
    }
    for id in &args.delete {
        if !app.delete_notification(*id) {
            warn!(id, "no notification to delete");
        }
    }

    for key in &args.enable {
        app.set_notification_setting(key, true)?;
    }
    for key in &args.disable {
        app.set_notification_setting(key, false)?;
    }

    if args.settings {
        return renderer.print_settings(app.store.notifications.settings());
    }
    renderer.print_notifications(&app.store.notifications, filter)
}
