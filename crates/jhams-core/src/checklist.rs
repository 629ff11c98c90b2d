use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::datetime::{CalendarDate, iso_date_serde};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Média",
            Priority::Low => "Baixa",
        }
    }

    /// ANSI color code used when painting the priority.
    pub fn ansi(self) -> &'static str {
        match self {
            Priority::High => "31",
            Priority::Medium => "33",
            Priority::Low => "32",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: u64,

    pub description: String,

    #[serde(rename = "due", with = "iso_date_serde")]
    pub due_date: CalendarDate,

    pub priority: Priority,

    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

impl Checklist {
    pub fn new(items: Vec<ChecklistItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Flips `completed` on the item with `id`. Returns false when no item matched.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completed(&mut self, id: u64) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            warn!(id, "checklist item not found");
            return false;
        };
        item.completed = !item.completed;
        debug!(id, completed = item.completed, "toggled checklist item");
        true
    }

    pub fn pending(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|item| !item.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    pub fn due_on<'a>(&'a self, date: &'a CalendarDate) -> impl Iterator<Item = &'a ChecklistItem> {
        self.items.iter().filter(move |item| item.due_date == *date)
    }
}
