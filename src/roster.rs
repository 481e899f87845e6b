//! Seeding of the entities attendance recording validates against.

use crate::error::{AttendanceError, Result};
use crate::model::EntityKind;
use crate::store;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubject {
    pub name: String,
    #[serde(default)]
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimeTable {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClass {
    pub name: String,
    #[serde(default)]
    pub time_table_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacher {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub subject_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
}

fn required_name(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AttendanceError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn resolve_person_id(id: Option<&str>) -> Result<String> {
    match id.map(str::trim) {
        Some("") => Err(AttendanceError::invalid("id must not be empty")),
        Some(id) => Ok(id.to_string()),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

pub fn create_subject(conn: &Connection, input: &CreateSubject) -> Result<i64> {
    let name = required_name(&input.name, "name")?;
    if input.duration_minutes < 0 {
        return Err(AttendanceError::invalid("durationMinutes must not be negative"));
    }
    let id = store::insert_subject(conn, &name, input.duration_minutes)?;
    info!(subject_id = id, subject = %name, "subject created");
    Ok(id)
}

pub fn create_timetable(conn: &Connection, input: &CreateTimeTable) -> Result<i64> {
    let name = required_name(&input.name, "name")?;
    let id = store::insert_timetable(conn, &name)?;
    info!(timetable_id = id, timetable = %name, "timetable created");
    Ok(id)
}

pub fn create_class(conn: &Connection, input: &CreateClass) -> Result<i64> {
    let name = required_name(&input.name, "name")?;
    if let Some(tt) = input.time_table_id {
        let timetable = store::find_timetable(conn, tt)?
            .ok_or_else(|| AttendanceError::not_found(EntityKind::TimeTable, tt))?;
        info!(timetable_id = timetable.id, timetable = %timetable.name, "linking class to timetable");
    }
    let id = store::insert_class(conn, &name, input.time_table_id)?;
    info!(class_id = id, class = %name, "class created");
    Ok(id)
}

pub fn create_teacher(conn: &Connection, input: &CreateTeacher) -> Result<String> {
    let full_name = required_name(&input.full_name, "fullName")?;
    let id = resolve_person_id(input.id.as_deref())?;
    if let Some(subject_id) = input.subject_id {
        let subject = store::find_subject(conn, subject_id)?
            .ok_or_else(|| AttendanceError::not_found(EntityKind::Subject, subject_id))?;
        info!(
            subject_id = subject.id,
            subject = %subject.name,
            duration_minutes = subject.duration_minutes,
            "assigning subject to teacher"
        );
    }
    if store::teacher_exists(conn, &id)? {
        return Err(AttendanceError::invalid(format!("Teacher with ID {id} already exists.")));
    }
    store::insert_teacher(conn, &id, &full_name, input.subject_id)?;
    info!(teacher_id = %id, "teacher created");
    Ok(id)
}

pub fn create_student(conn: &Connection, input: &CreateStudent) -> Result<String> {
    let full_name = required_name(&input.full_name, "fullName")?;
    let id = resolve_person_id(input.id.as_deref())?;
    if store::find_student(conn, &id)?.is_some() {
        return Err(AttendanceError::invalid(format!("Student with ID {id} already exists.")));
    }
    store::insert_student(conn, &id, &full_name)?;
    info!(student_id = %id, "student created");
    Ok(id)
}
