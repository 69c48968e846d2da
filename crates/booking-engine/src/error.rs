//! Error types for booking-engine operations.

use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Duplicate appointment id: {0}")]
    DuplicateId(String),

    #[error("Invalid occurrence id: {0}")]
    InvalidOccurrenceId(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Datetime out of range: {0}")]
    OutOfRange(String),

    #[error("Recurring appointment produces too many occurrences: {count} (limit {limit})")]
    TooManyOccurrences { count: usize, limit: usize },

    #[error("Booking rejected: {}", summarize(.0))]
    Rejected(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
