use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::types::Response;
use crate::error::{AttendanceError, StateViolation};

pub fn ok(body: impl Serialize) -> Response {
    match serde_json::to_value(body) {
        Ok(body) => Response { status: 200, body },
        Err(e) => err(500, "encode_failed", e.to_string(), None),
    }
}

pub fn err(
    status: u16,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> Response {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    Response {
        status,
        body: json!({ "error": error }),
    }
}

pub struct HandlerErr {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self) -> Response {
        err(self.status, self.code, self.message, self.details)
    }
}

impl From<AttendanceError> for HandlerErr {
    fn from(e: AttendanceError) -> Self {
        let message = e.to_string();
        match e {
            AttendanceError::InvalidRequest(_) => Self::bad_params(message),
            AttendanceError::NotFound { kind, id } => Self {
                status: 400,
                code: "not_found",
                message,
                details: Some(json!({ "entity": kind.to_string(), "id": id })),
            },
            AttendanceError::InvalidState(StateViolation::NoTimetable { class_id }) => Self {
                status: 400,
                code: "invalid_state",
                message,
                details: Some(json!({ "reason": "no_timetable", "classId": class_id })),
            },
            AttendanceError::NoRecords(_) => Self {
                status: 404,
                code: "no_records",
                message,
                details: None,
            },
            AttendanceError::Storage(source) => {
                error!(error = %source, "storage failure");
                Self {
                    status: 500,
                    code: "db_query_failed",
                    message,
                    details: None,
                }
            }
        }
    }
}

pub fn finish<T: Serialize>(result: Result<T, HandlerErr>) -> Response {
    match result {
        Ok(body) => ok(body),
        Err(error) => error.response(),
    }
}
