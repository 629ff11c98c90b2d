use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checklist::Priority;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Certificate,
    Deadline,
    Class,
    Achievement,
    Course,
    System,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDisplay {
    pub kind: NotificationKind,
    pub key: &'static str,
    pub label: &'static str,
    pub glyph: &'static str,
    pub ansi: &'static str,
}

pub static KIND_TABLE: [KindDisplay; 7] = [
    KindDisplay {
        kind: NotificationKind::Certificate,
        key: "certificate",
        label: "Certificados",
        glyph: "★",
        ansi: "33",
    },
    KindDisplay {
        kind: NotificationKind::Deadline,
        key: "deadline",
        label: "Prazos",
        glyph: "!",
        ansi: "31",
    },
    KindDisplay {
        kind: NotificationKind::Class,
        key: "class",
        label: "Aulas",
        glyph: "◷",
        ansi: "34",
    },
    KindDisplay {
        kind: NotificationKind::Achievement,
        key: "achievement",
        label: "Conquistas",
        glyph: "♛",
        ansi: "35",
    },
    KindDisplay {
        kind: NotificationKind::Course,
        key: "course",
        label: "Cursos",
        glyph: "▤",
        ansi: "32",
    },
    KindDisplay {
        kind: NotificationKind::System,
        key: "system",
        label: "Sistema",
        glyph: "i",
        ansi: "90",
    },
    KindDisplay {
        kind: NotificationKind::Community,
        key: "community",
        label: "Comunidade",
        glyph: "☺",
        ansi: "36",
    },
];

impl NotificationKind {
    pub fn display(self) -> &'static KindDisplay {
        KIND_TABLE
            .iter()
            .find(|row| row.kind == self)
            .unwrap_or(&KIND_TABLE[5])
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        KIND_TABLE
            .iter()
            .find(|row| row.key == key)
            .map(|row| row.kind)
            .ok_or_else(|| anyhow!("unknown notification kind: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Relative label as shown to the student, e.g. "2 horas atrás".
    #[serde(rename = "timestamp", default)]
    pub timestamp_label: String,
    #[serde(default)]
    pub read: bool,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    All,
    Unread,
    Kind(NotificationKind),
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !notification.read,
            NotificationFilter::Kind(kind) => notification.kind == *kind,
        }
    }
}

impl FromStr for NotificationFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(NotificationFilter::All),
            "unread" => Ok(NotificationFilter::Unread),
            other => other.parse::<NotificationKind>().map(NotificationFilter::Kind),
        }
    }
}

const EMAIL: &str = "email";
const PUSH: &str = "push";

/// Delivery preferences, keyed by notification kind (`certificate`,
/// `deadline`, ...) plus the `email` and `push` channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NotificationSettings {
    switches: BTreeMap<&'static str, bool>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        let mut switches = KIND_TABLE
            .iter()
            .map(|row| (row.key, row.kind != NotificationKind::System))
            .collect::<BTreeMap<_, _>>();
        switches.insert(EMAIL, true);
        switches.insert(PUSH, true);
        Self { switches }
    }
}

impl NotificationSettings {
    /// Defaults with `overrides` applied; unknown keys are rejected.
    pub fn with_overrides<'a, I>(overrides: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut settings = Self::default();
        for (key, enabled) in overrides {
            settings.set(key, enabled)?;
        }
        Ok(settings)
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.switches.get(key.trim()).copied()
    }

    #[tracing::instrument(skip(self))]
    pub fn set(&mut self, key: &str, enabled: bool) -> anyhow::Result<()> {
        let key = key.trim().to_ascii_lowercase();
        let slot = self
            .switches
            .iter_mut()
            .find(|(name, _)| **name == key)
            .map(|(_, value)| value)
            .ok_or_else(|| anyhow!("unknown notification setting: {key}"))?;
        *slot = enabled;
        debug!(key = %key, enabled, "notification setting changed");
        Ok(())
    }

    pub fn allows(&self, kind: NotificationKind) -> bool {
        self.get(kind.display().key).unwrap_or(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.switches.iter().map(|(key, enabled)| (*key, *enabled))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    items: Vec<Notification>,
    settings: NotificationSettings,
}

impl Notifications {
    pub fn new(items: Vec<Notification>) -> Self {
        Self::with_settings(items, NotificationSettings::default())
    }

    pub fn with_settings(items: Vec<Notification>, settings: NotificationSettings) -> Self {
        Self { items, settings }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut NotificationSettings {
        &mut self.settings
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn filtered(&self, filter: NotificationFilter) -> Vec<&Notification> {
        self.items.iter().filter(|n| filter.matches(n)).collect()
    }

    pub fn count_for(&self, filter: NotificationFilter) -> usize {
        self.items.iter().filter(|n| filter.matches(n)).count()
    }

    pub fn unread_count(&self) -> usize {
        self.count_for(NotificationFilter::Unread)
    }

    #[tracing::instrument(skip(self))]
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                debug!(id, "notification marked read");
                true
            }
            None => false,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn mark_all_read(&mut self) {
        let unread = self.unread_count();
        for notification in &mut self.items {
            notification.read = true;
        }
        info!(marked = unread, "marked all notifications read");
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        let removed = self.items.len() != before;
        debug!(id, removed, "delete notification");
        removed
    }
}
