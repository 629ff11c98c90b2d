use serde::{Deserialize, Serialize};

use crate::datetime::{CalendarDate, iso_date_serde};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Online,
    #[serde(alias = "presencial")]
    InPerson,
}

/// Display properties for an event kind badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStyle {
    pub label: &'static str,
    pub glyph: &'static str,
    pub ansi: &'static str,
}

const ONLINE_STYLE: KindStyle = KindStyle {
    label: "Online",
    glyph: "@",
    ansi: "32",
};

const IN_PERSON_STYLE: KindStyle = KindStyle {
    label: "Presencial",
    glyph: "#",
    ansi: "34",
};

impl EventKind {
    pub fn style(self) -> &'static KindStyle {
        match self {
            EventKind::Online => &ONLINE_STYLE,
            EventKind::InPerson => &IN_PERSON_STYLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: u64,

    #[serde(with = "iso_date_serde")]
    pub date: CalendarDate,

    pub title: String,

    /// Start time, `HH:MM` 24-hour.
    pub time: String,

    #[serde(rename = "duration")]
    pub duration_label: String,

    pub kind: EventKind,

    #[serde(default)]
    pub location: String,

    #[serde(rename = "instructor", default)]
    pub instructor_name: String,
}

impl Event {
    pub fn occurs_on(&self, date: &CalendarDate) -> bool {
        self.date == *date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_portuguese_kind_alias() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": 1,
                "date": "2024-06-26",
                "title": "Aula Presencial - Game Development",
                "time": "14:00",
                "duration": "2h",
                "kind": "presencial",
                "location": "Lab 3 - Campus Tech",
                "instructor": "Marcus Johnson"
            }"#,
        )
        .expect("parse event");

        assert_eq!(event.kind, EventKind::InPerson);
        assert_eq!(event.kind.style().label, "Presencial");
        assert_eq!(event.date.to_iso(), "2024-06-26");
    }

    #[test]
    fn rejects_malformed_event_date() {
        let parsed = serde_json::from_str::<Event>(
            r#"{"id":1,"date":"2024-06-31","title":"x","time":"10:00","duration":"1h","kind":"online"}"#,
        );
        assert!(parsed.is_err());
    }
}
