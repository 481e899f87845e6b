//! Attendance recording and reporting.
//!
//! Recording runs in two phases: every referenced entity is resolved first and
//! the first failure wins, then the aggregate is built and saved through a
//! single unit of work. Queries project stored aggregates into response shapes
//! ordered by date, then attendance id.

use crate::error::{AttendanceError, Result, StateViolation};
use crate::model::{AttendanceStatus, DateRange, EntityKind};
use crate::store::{self, NewAttendance, NewStudentAttendance, StudentRow, TeacherProfile};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttendanceRequest {
    #[serde(alias = "teacher_id")]
    pub teacher_id: String,
    #[serde(alias = "date", alias = "date_attendance")]
    pub date_attendance: NaiveDate,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub students: Vec<StudentStatusInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatusInput {
    #[serde(alias = "student_id")]
    pub student_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    pub id: i64,
    pub date_attendance: NaiveDate,
    pub feedback: String,
    pub teacher_name: String,
    pub subject_name: String,
    pub students_attendance: Vec<StudentEntryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntryView {
    pub id: String,
    pub username: String,
    pub status: AttendanceStatus,
}

/// One student's slice of an attendance: no other students' statuses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceView {
    pub id: i64,
    pub date_attendance: NaiveDate,
    pub teacher_name: String,
    pub subject_name: String,
    pub status: AttendanceStatus,
}

struct ValidatedRecording {
    class_id: i64,
    timetable_id: i64,
    teacher: TeacherProfile,
    students: Vec<(StudentRow, AttendanceStatus)>,
}

fn validate_recording(
    conn: &Connection,
    class_id: i64,
    request: &RecordAttendanceRequest,
) -> Result<ValidatedRecording> {
    let class = store::find_class(conn, class_id)?
        .ok_or_else(|| AttendanceError::not_found(EntityKind::Class, class_id))?;
    let Some(timetable_id) = class.timetable_id else {
        return Err(AttendanceError::InvalidState(StateViolation::NoTimetable {
            class_id: class.id,
        }));
    };
    let teacher = store::find_teacher_profile(conn, &request.teacher_id)?
        .ok_or_else(|| AttendanceError::not_found(EntityKind::Teacher, &request.teacher_id))?;

    let mut students = Vec::with_capacity(request.students.len());
    for entry in &request.students {
        let student = store::find_student(conn, &entry.student_id)?
            .ok_or_else(|| AttendanceError::not_found(EntityKind::Student, &entry.student_id))?;
        students.push((student, entry.status));
    }

    debug!(
        class_id,
        class_name = %class.name,
        timetable_id,
        teacher_subject = ?teacher.subject_id,
        students = students.len() as u64,
        "recording validated"
    );
    Ok(ValidatedRecording {
        class_id,
        timetable_id,
        teacher,
        students,
    })
}

pub fn record_attendance(
    conn: &Connection,
    class_id: i64,
    request: Option<RecordAttendanceRequest>,
) -> Result<AttendanceView> {
    let Some(request) = request else {
        return Err(AttendanceError::invalid("Attendance data is required."));
    };
    let validated = validate_recording(conn, class_id, &request)?;

    let new = NewAttendance {
        class_id: validated.class_id,
        timetable_id: validated.timetable_id,
        teacher_id: validated.teacher.id.clone(),
        date: request.date_attendance,
        feedback: request.feedback,
        students: validated
            .students
            .iter()
            .map(|(student, status)| NewStudentAttendance {
                student_id: student.id.clone(),
                status: *status,
            })
            .collect(),
    };

    let uow = store::UnitOfWork::begin(conn)?;
    let attendance_id = uow.add_attendance(&new)?;
    uow.commit()?;

    info!(
        attendance_id,
        class_id,
        date = %new.date,
        students = new.students.len() as u64,
        "attendance recorded"
    );

    Ok(AttendanceView {
        id: attendance_id,
        date_attendance: new.date,
        feedback: new.feedback,
        teacher_name: validated.teacher.full_name,
        subject_name: validated.teacher.subject_name.unwrap_or_default(),
        students_attendance: validated
            .students
            .into_iter()
            .map(|(student, status)| StudentEntryView {
                id: student.id,
                username: student.full_name,
                status,
            })
            .collect(),
    })
}

pub fn by_class_day(conn: &Connection, class_id: i64, date: NaiveDate) -> Result<Vec<AttendanceView>> {
    class_report(conn, class_id, DateRange::day(date))
}

pub fn by_class_range(conn: &Connection, class_id: i64, range: DateRange) -> Result<Vec<AttendanceView>> {
    class_report(conn, class_id, range)
}

pub fn by_student(conn: &Connection, student_id: &str) -> Result<Vec<StudentAttendanceView>> {
    student_report(conn, student_id, None)
}

pub fn by_student_range(
    conn: &Connection,
    student_id: &str,
    range: DateRange,
) -> Result<Vec<StudentAttendanceView>> {
    student_report(conn, student_id, Some(range))
}

fn reject_inverted(range: DateRange) -> Result<()> {
    if range.is_inverted() {
        return Err(AttendanceError::invalid(format!(
            "start_date {} is after end_date {}.",
            range.start, range.end
        )));
    }
    Ok(())
}

fn class_report(conn: &Connection, class_id: i64, range: DateRange) -> Result<Vec<AttendanceView>> {
    if store::find_class(conn, class_id)?.is_none() {
        return Err(AttendanceError::not_found(EntityKind::Class, class_id));
    }
    reject_inverted(range)?;

    let rows = store::class_attendances(conn, class_id, range)?;
    if rows.is_empty() {
        let message = if range.start == range.end {
            "No attendance records found for the specified day."
        } else {
            "No attendance records found for the specified range."
        };
        return Err(AttendanceError::NoRecords(message.to_string()));
    }
    debug!(class_id, found = rows.len() as u64, "class attendance loaded");

    rows.into_iter()
        .map(|row| {
            let entries = store::attendance_entries(conn, row.id)?;
            Ok(AttendanceView {
                id: row.id,
                date_attendance: row.date,
                feedback: row.feedback,
                teacher_name: row.teacher_name,
                subject_name: row.subject_name.unwrap_or_default(),
                students_attendance: entries
                    .into_iter()
                    .map(|e| StudentEntryView {
                        id: e.student_id,
                        username: e.student_name,
                        status: e.status,
                    })
                    .collect(),
            })
        })
        .collect()
}

fn student_report(
    conn: &Connection,
    student_id: &str,
    range: Option<DateRange>,
) -> Result<Vec<StudentAttendanceView>> {
    if store::find_student(conn, student_id)?.is_none() {
        return Err(AttendanceError::not_found(EntityKind::Student, student_id));
    }
    if let Some(range) = range {
        reject_inverted(range)?;
    }

    let rows = store::student_history(conn, student_id, range)?;
    if rows.is_empty() {
        return Err(AttendanceError::NoRecords(format!(
            "No attendance records found for student ID {student_id}."
        )));
    }
    debug!(student_id, found = rows.len() as u64, "student attendance loaded");

    Ok(rows
        .into_iter()
        .map(|row| StudentAttendanceView {
            id: row.attendance_id,
            date_attendance: row.date,
            teacher_name: row.teacher_name,
            subject_name: row.subject_name.unwrap_or_default(),
            status: row.status,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    struct Fixture {
        conn: Connection,
        class_id: i64,
        bare_class_id: i64,
    }

    // Class with timetable, class without, teacher T100 teaching Math,
    // teacher T200 without a subject, students S1..S3.
    fn fixture() -> Fixture {
        let conn = Connection::open_in_memory().expect("open memory db");
        db::init_schema(&conn).expect("schema");
        let math = store::insert_subject(&conn, "Math", 45).expect("subject");
        let tt = store::insert_timetable(&conn, "T1").expect("timetable");
        let class_id = store::insert_class(&conn, "Class 5", Some(tt)).expect("class");
        let bare_class_id = store::insert_class(&conn, "No timetable", None).expect("class");
        store::insert_teacher(&conn, "T100", "Grace Hopper", Some(math)).expect("teacher");
        store::insert_teacher(&conn, "T200", "Alan Turing", None).expect("teacher");
        store::insert_student(&conn, "S1", "Sam One").expect("student");
        store::insert_student(&conn, "S2", "Sue Two").expect("student");
        store::insert_student(&conn, "S3", "Sid Three").expect("student");
        Fixture {
            conn,
            class_id,
            bare_class_id,
        }
    }

    fn request(teacher: &str, day: &str, students: &[(&str, AttendanceStatus)]) -> RecordAttendanceRequest {
        RecordAttendanceRequest {
            teacher_id: teacher.to_string(),
            date_attendance: date(day),
            feedback: "ok".to_string(),
            students: students
                .iter()
                .map(|(id, status)| StudentStatusInput {
                    student_id: id.to_string(),
                    status: *status,
                })
                .collect(),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .expect("count")
    }

    #[test]
    fn record_returns_students_in_submission_order() {
        let fx = fixture();
        let view = record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request(
                "T100",
                "2024-03-01",
                &[
                    ("S2", AttendanceStatus::Absent),
                    ("S1", AttendanceStatus::Present),
                    ("S3", AttendanceStatus::Late),
                ],
            )),
        )
        .expect("record");

        let ids: Vec<_> = view.students_attendance.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S2", "S1", "S3"]);
        assert_eq!(view.students_attendance[0].username, "Sue Two");
        assert_eq!(view.teacher_name, "Grace Hopper");
        assert_eq!(view.subject_name, "Math");
        assert_eq!(view.feedback, "ok");
        assert_eq!(view.date_attendance, date("2024-03-01"));

        let stored = by_class_day(&fx.conn, fx.class_id, date("2024-03-01")).expect("query");
        assert_eq!(stored, vec![view]);
    }

    #[test]
    fn missing_payload_is_invalid_request() {
        let fx = fixture();
        let err = record_attendance(&fx.conn, fx.class_id, None).unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidRequest(_)));
    }

    #[test]
    fn missing_class_wins_over_other_failures() {
        let fx = fixture();
        let err = record_attendance(
            &fx.conn,
            999,
            Some(request("ghost", "2024-03-01", &[("nobody", AttendanceStatus::Present)])),
        )
        .unwrap_err();
        match err {
            AttendanceError::NotFound { kind, id } => {
                assert_eq!(kind, EntityKind::Class);
                assert_eq!(id, "999");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(count(&fx.conn, "attendances"), 0);
    }

    #[test]
    fn class_without_timetable_is_invalid_state() {
        let fx = fixture();
        let err = record_attendance(
            &fx.conn,
            fx.bare_class_id,
            Some(request("T100", "2024-03-01", &[("S1", AttendanceStatus::Present)])),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AttendanceError::InvalidState(StateViolation::NoTimetable { class_id }) if class_id == fx.bare_class_id
        ));
        assert!(err.to_string().contains("timetable"));
    }

    #[test]
    fn missing_teacher_is_not_found() {
        let fx = fixture();
        let err = record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request("ghost", "2024-03-01", &[("S1", AttendanceStatus::Present)])),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AttendanceError::NotFound { kind: EntityKind::Teacher, .. }
        ));
    }

    #[test]
    fn one_unknown_student_aborts_the_whole_batch() {
        let fx = fixture();
        let err = record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request(
                "T100",
                "2024-03-01",
                &[
                    ("S1", AttendanceStatus::Present),
                    ("ghost", AttendanceStatus::Absent),
                    ("S2", AttendanceStatus::Present),
                ],
            )),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Student with ID ghost not found.");
        assert_eq!(count(&fx.conn, "attendances"), 0);
        assert_eq!(count(&fx.conn, "student_attendances"), 0);
    }

    #[test]
    fn teacher_without_subject_projects_empty_subject_name() {
        let fx = fixture();
        let view = record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request("T200", "2024-03-01", &[("S1", AttendanceStatus::Present)])),
        )
        .expect("record");
        assert_eq!(view.subject_name, "");

        let history = by_student(&fx.conn, "S1").expect("history");
        assert_eq!(history[0].subject_name, "");
        assert_eq!(history[0].teacher_name, "Alan Turing");
    }

    #[test]
    fn repeated_recording_creates_distinct_attendances() {
        let fx = fixture();
        let req = request("T100", "2024-03-01", &[("S1", AttendanceStatus::Present)]);
        let first = record_attendance(&fx.conn, fx.class_id, Some(req.clone())).expect("first");
        let second = record_attendance(&fx.conn, fx.class_id, Some(req)).expect("second");
        assert_ne!(first.id, second.id);

        let day = by_class_day(&fx.conn, fx.class_id, date("2024-03-01")).expect("day");
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].id, first.id);
        assert_eq!(day[1].id, second.id);
    }

    #[test]
    fn day_query_matches_class_and_date_exactly() {
        let fx = fixture();
        let tt = store::insert_timetable(&fx.conn, "T2").expect("timetable");
        let other_class = store::insert_class(&fx.conn, "Class 6", Some(tt)).expect("class");
        record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request("T100", "2024-03-01", &[("S1", AttendanceStatus::Present)])),
        )
        .expect("record");

        assert_eq!(
            by_class_day(&fx.conn, fx.class_id, date("2024-03-01"))
                .expect("same day")
                .len(),
            1
        );
        assert!(matches!(
            by_class_day(&fx.conn, fx.class_id, date("2024-03-02")),
            Err(AttendanceError::NoRecords(_))
        ));
        assert!(matches!(
            by_class_day(&fx.conn, other_class, date("2024-03-01")),
            Err(AttendanceError::NoRecords(_))
        ));
        assert!(matches!(
            by_class_day(&fx.conn, 999, date("2024-03-01")),
            Err(AttendanceError::NotFound { kind: EntityKind::Class, .. })
        ));
    }

    #[test]
    fn student_range_is_inclusive_subset_of_history() {
        let fx = fixture();
        for (day, status) in [
            ("2024-02-28", AttendanceStatus::Present),
            ("2024-03-01", AttendanceStatus::Late),
            ("2024-03-10", AttendanceStatus::Absent),
            ("2024-03-11", AttendanceStatus::Present),
        ] {
            record_attendance(
                &fx.conn,
                fx.class_id,
                Some(request("T100", day, &[("S1", status), ("S2", AttendanceStatus::Present)])),
            )
            .expect("record");
        }

        let all = by_student(&fx.conn, "S1").expect("all");
        assert_eq!(all.len(), 4);
        let range = DateRange {
            start: date("2024-03-01"),
            end: date("2024-03-10"),
        };
        let ranged = by_student_range(&fx.conn, "S1", range).expect("ranged");
        let expected: Vec<_> = all
            .iter()
            .filter(|v| range.start <= v.date_attendance && v.date_attendance <= range.end)
            .cloned()
            .collect();
        assert_eq!(ranged, expected);
        assert_eq!(ranged[0].status, AttendanceStatus::Late);
        assert_eq!(ranged[1].status, AttendanceStatus::Absent);
    }

    #[test]
    fn class_range_expands_every_attendance() {
        let fx = fixture();
        record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request("T100", "2024-03-05", &[("S1", AttendanceStatus::Present)])),
        )
        .expect("record");
        record_attendance(
            &fx.conn,
            fx.class_id,
            Some(request(
                "T100",
                "2024-03-01",
                &[("S2", AttendanceStatus::Absent), ("S3", AttendanceStatus::Late)],
            )),
        )
        .expect("record");

        let report = by_class_range(
            &fx.conn,
            fx.class_id,
            DateRange {
                start: date("2024-03-01"),
                end: date("2024-03-31"),
            },
        )
        .expect("report");
        let dates: Vec<_> = report.iter().map(|v| v.date_attendance).collect();
        assert_eq!(dates, vec![date("2024-03-01"), date("2024-03-05")]);
        assert_eq!(report[0].students_attendance.len(), 2);
        assert_eq!(report[1].students_attendance.len(), 1);
    }

    #[test]
    fn inverted_range_is_rejected_after_existence_check() {
        let fx = fixture();
        let inverted = DateRange {
            start: date("2024-03-31"),
            end: date("2024-03-01"),
        };
        assert!(matches!(
            by_class_range(&fx.conn, fx.class_id, inverted),
            Err(AttendanceError::InvalidRequest(_))
        ));
        assert!(matches!(
            by_student_range(&fx.conn, "ghost", inverted),
            Err(AttendanceError::NotFound { kind: EntityKind::Student, .. })
        ));
    }

    #[test]
    fn student_without_records_is_no_records() {
        let fx = fixture();
        let err = by_student(&fx.conn, "S3").unwrap_err();
        assert_eq!(err.to_string(), "No attendance records found for student ID S3.");
    }
}
