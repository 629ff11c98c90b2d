use std::fs;

use jhams_core::app::AppState;
use jhams_core::calendar::upcoming_events;
use jhams_core::datetime::days_in_month;
use jhams_core::event::{Event, EventKind};
use jhams_core::store::AcademyStore;
use jhams_core::{CalendarDate, CalendarError, GridCell, build_month_grid, events_on_date, navigate_month};
use tempfile::tempdir;

fn date(raw: &str) -> CalendarDate {
    CalendarDate::parse_iso(raw).expect("valid date")
}

fn event(id: u64, day: &str, time: &str) -> Event {
    Event {
        id,
        date: date(day),
        title: format!("event {id}"),
        time: time.to_string(),
        duration_label: "2h".to_string(),
        kind: EventKind::InPerson,
        location: "Lab 3 - Campus Tech".to_string(),
        instructor_name: "Marcus Johnson".to_string(),
    }
}

#[test]
fn june_2024_scenario() {
    let events = vec![event(1, "2024-06-26", "14:00")];
    let grid = build_month_grid(date("2024-06-01"), date("2024-06-15"), date("2024-06-15"), &events)
        .expect("grid");

    assert_eq!(grid.offset(), 6);
    assert!(grid.cells()[..6].iter().all(|cell| matches!(cell, GridCell::Empty)));
    assert_eq!(grid.day_cells().count(), 30);

    for cell in grid.day_cells() {
        let day = cell.date.day();
        assert_eq!(cell.is_today, day == 15, "today flag on day {day}");
        assert_eq!(cell.is_selected, day == 15, "selected flag on day {day}");
        assert_eq!(cell.has_event, day == 26, "event flag on day {day}");
    }
}

#[test]
fn events_on_shared_date_come_back_in_time_order() {
    let events = vec![
        event(1, "2024-06-28", "15:00"),
        event(2, "2024-06-27", "19:00"),
        event(3, "2024-06-28", "10:00"),
    ];
    let found = events_on_date(&date("2024-06-28"), &events);
    assert_eq!(found.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1]);
    assert!(events_on_date(&date("2024-06-01"), &events).is_empty());
}

#[test]
fn leap_year_february() {
    assert_eq!(days_in_month(2024, 1), Ok(29));
    assert_eq!(days_in_month(2023, 1), Ok(28));
    assert_eq!(days_in_month(2000, 1), Ok(29));
    assert_eq!(days_in_month(1900, 1), Ok(28));

    let grid = build_month_grid(date("2024-02-10"), date("2024-02-29"), date("2024-02-29"), &[])
        .expect("grid");
    assert_eq!(grid.day_cells().count(), 29);
    assert_eq!(grid.offset(), 4);
}

#[test]
fn navigation_round_trip_and_rollover() {
    let start = date("2024-01-31");
    let next = navigate_month(start, 1).expect("next");
    assert_eq!(next, date("2024-02-01"));
    let back = navigate_month(next, -1).expect("back");
    assert_eq!((back.year(), back.month0()), (start.year(), start.month0()));

    assert_eq!(navigate_month(date("2024-12-01"), 13), Ok(date("2026-01-01")));
    assert_eq!(navigate_month(date("2024-01-01"), -25), Ok(date("2021-12-01")));
}

#[test]
fn invalid_dates_are_reported_not_coerced() {
    assert_eq!(
        CalendarDate::parse_iso("2023-02-29"),
        Err(CalendarError::InvalidDate("2023-02-29".to_string()))
    );
    assert!(matches!(
        navigate_month(date("2024-06-01"), i32::MIN),
        Err(CalendarError::InvalidDate(_))
    ));
}

#[test]
fn custom_seed_file_drives_the_calendar_page() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("academy.toml");
    fs::write(
        &path,
        r#"
[[events]]
id = 10
title = "Workshop - Rust"
date = "2025-03-04"
time = "15:00"
duration = "3h"
kind = "in-person"
location = "Auditório Principal"
instructor = "David Kim"

[[events]]
id = 11
title = "Webinar - Async"
date = "2025-03-04"
time = "09:30"
duration = "1h"
kind = "online"

[[checklist]]
id = 1
description = "Ler capítulo 4"
due = "2025-03-05"
priority = "high"
"#,
    )
    .expect("write seed");

    let store = AcademyStore::load(&path).expect("load seed");
    let mut app = AppState::new(store, date("2025-03-01")).expect("state");
    app.select_date(date("2025-03-04"));

    let titles = app.selected_events().into_iter().map(|e| e.title).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Webinar - Async".to_string(), "Workshop - Rust".to_string()]);

    let grid = app.month_grid().expect("grid");
    assert_eq!(grid.offset(), 6);
    assert_eq!(grid.day_cells().filter(|c| c.has_event).count(), 1);

    assert!(app.toggle_checklist(1));
    assert!(!app.store.checklist.pending().any(|item| item.id == 1));

    let upcoming = upcoming_events(&app.store.events, &date("2025-03-05"), 3);
    assert!(upcoming.is_empty());
}

#[test]
fn broken_seed_file_is_rejected() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("academy.toml");
    fs::write(
        &path,
        r#"
[[events]]
id = 1
title = "x"
date = "2025-02-29"
time = "10:00"
duration = "1h"
kind = "online"
"#,
    )
    .expect("write seed");

    let err = AcademyStore::load(&path).expect_err("invalid date");
    assert!(format!("{err:#}").contains("2025-02-29"));
}
