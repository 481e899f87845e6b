use chrono::NaiveDate;

use super::parse_body;
use crate::attendance::{self, AttendanceView, RecordAttendanceRequest, StudentAttendanceView};
use crate::http::error::{finish, HandlerErr};
use crate::http::types::{AppState, Method, Request, Response};
use crate::model::DateRange;

fn parse_class_id(raw: &str) -> Result<i64, HandlerErr> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(HandlerErr::bad_params(format!(
            "class_id must be a positive integer, got {raw:?}"
        ))),
    }
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("{field} must be YYYY-MM-DD, got {raw:?}")))
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, HandlerErr> {
    Ok(DateRange {
        start: parse_date(start, "start_date")?,
        end: parse_date(end, "end_date")?,
    })
}

fn record(state: &AppState, class_id: &str, req: &Request) -> Result<AttendanceView, HandlerErr> {
    let class_id = parse_class_id(class_id)?;
    let body: Option<RecordAttendanceRequest> = parse_body(req)?;
    Ok(attendance::record_attendance(&state.db, class_id, body)?)
}

fn class_day(state: &AppState, class_id: &str, date: &str) -> Result<Vec<AttendanceView>, HandlerErr> {
    let class_id = parse_class_id(class_id)?;
    let date = parse_date(date, "date")?;
    Ok(attendance::by_class_day(&state.db, class_id, date)?)
}

fn class_range(
    state: &AppState,
    class_id: &str,
    start: &str,
    end: &str,
) -> Result<Vec<AttendanceView>, HandlerErr> {
    let class_id = parse_class_id(class_id)?;
    let range = parse_range(start, end)?;
    Ok(attendance::by_class_range(&state.db, class_id, range)?)
}

fn student_all(state: &AppState, student_id: &str) -> Result<Vec<StudentAttendanceView>, HandlerErr> {
    Ok(attendance::by_student(&state.db, student_id)?)
}

fn student_range(
    state: &AppState,
    student_id: &str,
    start: &str,
    end: &str,
) -> Result<Vec<StudentAttendanceView>, HandlerErr> {
    let range = parse_range(start, end)?;
    Ok(attendance::by_student_range(&state.db, student_id, range)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Response> {
    let segments = req.segments();
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();
    match (req.method, segs.as_slice()) {
        (Method::Post, ["api", "attendance", "class", class_id]) => {
            Some(finish(record(state, class_id, req)))
        }
        (Method::Get, ["api", "attendance", "class", class_id, "date", date]) => {
            Some(finish(class_day(state, class_id, date)))
        }
        (Method::Get, ["student", student_id]) => Some(finish(student_all(state, student_id))),
        (Method::Get, ["api", "attendance", "report", "class", class_id, "range", start, end]) => {
            Some(finish(class_range(state, class_id, start, end)))
        }
        (Method::Get, ["api", "attendance", "report", "student", student_id, "range", start, end]) => {
            Some(finish(student_range(state, student_id, start, end)))
        }
        _ => None,
    }
}
