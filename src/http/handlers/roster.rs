use serde_json::json;

use super::require_body;
use crate::http::error::{finish, HandlerErr};
use crate::http::types::{AppState, Method, Request, Response};
use crate::roster::{self, CreateClass, CreateStudent, CreateSubject, CreateTeacher, CreateTimeTable};

fn subjects_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: CreateSubject = require_body(req)?;
    let id = roster::create_subject(&state.db, &input)?;
    Ok(json!({ "subjectId": id }))
}

fn timetables_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: CreateTimeTable = require_body(req)?;
    let id = roster::create_timetable(&state.db, &input)?;
    Ok(json!({ "timeTableId": id }))
}

fn classes_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: CreateClass = require_body(req)?;
    let id = roster::create_class(&state.db, &input)?;
    Ok(json!({ "classId": id }))
}

fn teachers_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: CreateTeacher = require_body(req)?;
    let id = roster::create_teacher(&state.db, &input)?;
    Ok(json!({ "teacherId": id }))
}

fn students_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: CreateStudent = require_body(req)?;
    let id = roster::create_student(&state.db, &input)?;
    Ok(json!({ "studentId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Response> {
    if req.method != Method::Post {
        return None;
    }
    let segments = req.segments();
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();
    match segs.as_slice() {
        ["api", "subjects"] => Some(finish(subjects_create(state, req))),
        ["api", "timetables"] => Some(finish(timetables_create(state, req))),
        ["api", "classes"] => Some(finish(classes_create(state, req))),
        ["api", "teachers"] => Some(finish(teachers_create(state, req))),
        ["api", "students"] => Some(finish(students_create(state, req))),
        _ => None,
    }
}
