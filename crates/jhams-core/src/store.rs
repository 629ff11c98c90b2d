use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, info};

use crate::checklist::{Checklist, ChecklistItem};
use crate::datetime::is_clock_time;
use crate::event::Event;
use crate::notification::{Notification, NotificationSettings, Notifications};

const SEED_TOML: &str = include_str!("../seed/academy.toml");

#[derive(Debug, Default, Deserialize)]
struct SeedDocument {
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    checklist: Vec<ChecklistItem>,
    #[serde(default)]
    notifications: Vec<Notification>,
    /// Overrides on top of the default notification settings.
    #[serde(default)]
    settings: BTreeMap<String, bool>,
}

/// In-memory academy data. Loaded once, never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcademyStore {
    pub events: Vec<Event>,
    pub checklist: Checklist,
    pub notifications: Notifications,
}

impl AcademyStore {
    /// The built-in seed data.
    #[tracing::instrument]
    pub fn seeded() -> anyhow::Result<Self> {
        Self::from_toml(SEED_TOML).context("failed to parse embedded seed data")
    }

    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let store = Self::from_toml(&text)
            .with_context(|| format!("failed to load seed file {}", path.display()))?;
        info!(
            file = %path.display(),
            events = store.events.len(),
            checklist = store.checklist.items().len(),
            notifications = store.notifications.items().len(),
            "loaded academy data"
        );
        Ok(store)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let doc: SeedDocument = toml::from_str(text).context("invalid seed document")?;
        validate(&doc)?;
        debug!(
            events = doc.events.len(),
            checklist = doc.checklist.len(),
            notifications = doc.notifications.len(),
            "parsed seed document"
        );

        let settings = NotificationSettings::with_overrides(
            doc.settings.iter().map(|(key, enabled)| (key.as_str(), *enabled)),
        )
        .context("invalid [settings] table")?;

        Ok(Self {
            events: doc.events,
            checklist: Checklist::new(doc.checklist),
            notifications: Notifications::with_settings(doc.notifications, settings),
        })
    }
}

fn validate(doc: &SeedDocument) -> anyhow::Result<()> {
    for event in &doc.events {
        if !is_clock_time(&event.time) {
            return Err(anyhow!(
                "event {} has invalid time {:?}; expected HH:MM",
                event.id,
                event.time
            ));
        }
    }

    ensure_unique_ids("event", doc.events.iter().map(|e| e.id))?;
    ensure_unique_ids("checklist item", doc.checklist.iter().map(|c| c.id))?;
    ensure_unique_ids("notification", doc.notifications.iter().map(|n| n.id))?;
    Ok(())
}

fn ensure_unique_ids<I>(what: &str, ids: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = u64>,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(anyhow!("duplicate {what} id: {id}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_seed_parses() {
        let store = AcademyStore::seeded().expect("seed");
        assert_eq!(store.events.len(), 5);
        assert_eq!(store.checklist.items().len(), 5);
        assert_eq!(store.notifications.items().len(), 7);
        assert_eq!(store.notifications.unread_count(), 2);
        assert_eq!(store.notifications.settings().get("system"), Some(false));
    }

    #[test]
    fn settings_table_overrides_defaults() {
        let store = AcademyStore::from_toml("[settings]\npush = false\n").expect("store");
        let settings = store.notifications.settings();
        assert_eq!(settings.get("push"), Some(false));
        assert_eq!(settings.get("email"), Some(true));

        let err = AcademyStore::from_toml("[settings]\nsms = true\n").expect_err("unknown key");
        assert!(format!("{err:#}").contains("unknown notification setting: sms"));
    }

    #[test]
    fn rejects_bad_event_time() {
        let doc = r#"
            [[events]]
            id = 1
            title = "x"
            date = "2024-06-26"
            time = "2pm"
            duration = "1h"
            kind = "online"
        "#;
        let err = AcademyStore::from_toml(doc).expect_err("bad time");
        assert!(format!("{err:#}").contains("HH:MM"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let doc = r#"
            [[checklist]]
            id = 1
            description = "a"
            due = "2024-06-20"
            priority = "high"

            [[checklist]]
            id = 1
            description = "b"
            due = "2024-06-21"
            priority = "low"
        "#;
        let err = AcademyStore::from_toml(doc).expect_err("duplicate");
        assert!(format!("{err:#}").contains("duplicate checklist item id"));
    }

    #[test]
    fn empty_document_is_an_empty_store() {
        let store = AcademyStore::from_toml("").expect("empty");
        assert_eq!(store, AcademyStore::default());
    }
}
