//! Errors raised by the calendar core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Malformed or out-of-range date input. Carries the offending input.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

impl CalendarError {
    pub(crate) fn invalid(input: impl std::fmt::Display) -> Self {
        Self::InvalidDate(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_date_message_names_input() {
        let err = CalendarError::invalid("2024-02-30");
        assert_eq!(err.to_string(), "invalid date: 2024-02-30");
    }
}
