use crate::model::EntityKind;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    NoTimetable { class_id: i64 },
}

impl fmt::Display for StateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTimetable { .. } => f.write_str("Class is not associated with any timetable."),
        }
    }
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{kind} with ID {id} not found.")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    InvalidState(StateViolation),

    #[error("{0}")]
    NoRecords(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AttendanceError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
