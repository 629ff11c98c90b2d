//! Application state for the calendar and alerts pages.
//!
//! The caller owns an [`AppState`] and passes it to whatever renders it;
//! every transform here is explicit and synchronous.

use tracing::{debug, info};

use crate::calendar::{MonthGrid, build_month_grid, events_on_date, navigate_month, upcoming_events};
use crate::datetime::CalendarDate;
use crate::error::CalendarError;
use crate::event::Event;
use crate::store::AcademyStore;

#[derive(Debug, Clone)]
pub struct AppState {
    today: CalendarDate,
    reference_month: CalendarDate,
    selected_date: CalendarDate,
    pub store: AcademyStore,
}

impl AppState {
    /// Starts on the month containing `today`, with `today` selected.
    pub fn new(store: AcademyStore, today: CalendarDate) -> Result<Self, CalendarError> {
        let reference_month = navigate_month(today, 0)?;
        info!(%today, "application state initialised");
        Ok(Self {
            today,
            reference_month,
            selected_date: today,
            store,
        })
    }

    pub fn today(&self) -> CalendarDate {
        self.today
    }

    pub fn reference_month(&self) -> CalendarDate {
        self.reference_month
    }

    pub fn selected_date(&self) -> CalendarDate {
        self.selected_date
    }

    /// Jumps to the month containing `date`.
    pub fn show_month(&mut self, date: CalendarDate) -> Result<(), CalendarError> {
        self.reference_month = navigate_month(date, 0)?;
        debug!(month = %self.reference_month, "showing month");
        Ok(())
    }

    pub fn shift_month(&mut self, delta: i32) -> Result<(), CalendarError> {
        self.reference_month = navigate_month(self.reference_month, delta)?;
        debug!(delta, month = %self.reference_month, "shifted month");
        Ok(())
    }

    pub fn select_date(&mut self, date: CalendarDate) {
        debug!(%date, "selected date");
        self.selected_date = date;
    }

    pub fn month_grid(&self) -> Result<MonthGrid, CalendarError> {
        build_month_grid(
            self.reference_month,
            self.today,
            self.selected_date,
            &self.store.events,
        )
    }

    pub fn selected_events(&self) -> Vec<Event> {
        events_on_date(&self.selected_date, &self.store.events)
    }

    pub fn upcoming(&self, limit: usize) -> Vec<Event> {
        upcoming_events(&self.store.events, &self.today, limit)
    }

    pub fn toggle_checklist(&mut self, id: u64) -> bool {
        self.store.checklist.toggle_completed(id)
    }

    pub fn mark_notification_read(&mut self, id: u64) -> bool {
        self.store.notifications.mark_read(id)
    }

    pub fn mark_all_read(&mut self) {
        self.store.notifications.mark_all_read();
    }

    pub fn delete_notification(&mut self, id: u64) -> bool {
        self.store.notifications.delete(id)
    }

    pub fn set_notification_setting(&mut self, key: &str, enabled: bool) -> anyhow::Result<()> {
        self.store.notifications.settings_mut().set(key, enabled)
    }
}
