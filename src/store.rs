//! Persistence gateway over the workspace SQLite database.
//!
//! Lookups return `Option` on a miss. Associated entities (a teacher's subject,
//! a class's timetable) come back as plain optional fields resolved by explicit
//! joins, never as live references.

use crate::model::{AttendanceStatus, DateRange};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

#[derive(Debug, Clone)]
pub struct ClassRow {
    pub id: i64,
    pub name: String,
    pub timetable_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TeacherProfile {
    pub id: String,
    pub full_name: String,
    pub subject_id: Option<i64>,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StudentRow {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct SubjectRow {
    pub id: i64,
    pub name: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct TimeTableRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub id: i64,
    pub date: NaiveDate,
    pub feedback: String,
    pub teacher_name: String,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntryRow {
    pub student_id: String,
    pub student_name: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct StudentHistoryRow {
    pub attendance_id: i64,
    pub date: NaiveDate,
    pub teacher_name: String,
    pub subject_name: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct NewStudentAttendance {
    pub student_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub class_id: i64,
    pub timetable_id: i64,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub feedback: String,
    pub students: Vec<NewStudentAttendance>,
}

pub fn find_class(conn: &Connection, id: i64) -> rusqlite::Result<Option<ClassRow>> {
    conn.query_row(
        "SELECT id, name, timetable_id FROM classes WHERE id = ?",
        [id],
        |r| {
            Ok(ClassRow {
                id: r.get(0)?,
                name: r.get(1)?,
                timetable_id: r.get(2)?,
            })
        },
    )
    .optional()
}

pub fn find_teacher_profile(conn: &Connection, id: &str) -> rusqlite::Result<Option<TeacherProfile>> {
    conn.query_row(
        "SELECT t.id, t.full_name, t.subject_id, s.name
         FROM teachers t
         LEFT JOIN subjects s ON s.id = t.subject_id
         WHERE t.id = ?",
        [id],
        |r| {
            Ok(TeacherProfile {
                id: r.get(0)?,
                full_name: r.get(1)?,
                subject_id: r.get(2)?,
                subject_name: r.get(3)?,
            })
        },
    )
    .optional()
}

pub fn find_student(conn: &Connection, id: &str) -> rusqlite::Result<Option<StudentRow>> {
    conn.query_row(
        "SELECT id, full_name FROM students WHERE id = ?",
        [id],
        |r| {
            Ok(StudentRow {
                id: r.get(0)?,
                full_name: r.get(1)?,
            })
        },
    )
    .optional()
}

pub fn find_subject(conn: &Connection, id: i64) -> rusqlite::Result<Option<SubjectRow>> {
    conn.query_row(
        "SELECT id, name, duration_minutes FROM subjects WHERE id = ?",
        [id],
        |r| {
            Ok(SubjectRow {
                id: r.get(0)?,
                name: r.get(1)?,
                duration_minutes: r.get(2)?,
            })
        },
    )
    .optional()
}

pub fn find_timetable(conn: &Connection, id: i64) -> rusqlite::Result<Option<TimeTableRow>> {
    conn.query_row(
        "SELECT id, name FROM timetables WHERE id = ?",
        [id],
        |r| {
            Ok(TimeTableRow {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()
}

pub fn insert_subject(conn: &Connection, name: &str, duration_minutes: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO subjects(name, duration_minutes) VALUES(?, ?)",
        params![name, duration_minutes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_timetable(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT INTO timetables(name) VALUES(?)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_class(conn: &Connection, name: &str, timetable_id: Option<i64>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO classes(name, timetable_id) VALUES(?, ?)",
        params![name, timetable_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_teacher(
    conn: &Connection,
    id: &str,
    full_name: &str,
    subject_id: Option<i64>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO teachers(id, full_name, subject_id) VALUES(?, ?, ?)",
        params![id, full_name, subject_id],
    )?;
    Ok(())
}

pub fn insert_student(conn: &Connection, id: &str, full_name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(id, full_name) VALUES(?, ?)",
        params![id, full_name],
    )?;
    Ok(())
}

pub fn teacher_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row("SELECT 1 FROM teachers WHERE id = ?", [id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
}

/// Groups the inserts of one logical operation. Nothing is visible to other
/// readers until `commit`; dropping the unit uncommitted rolls everything back.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> UnitOfWork<'conn> {
    pub fn begin(conn: &'conn Connection) -> rusqlite::Result<Self> {
        Ok(Self {
            tx: conn.unchecked_transaction()?,
        })
    }

    pub fn add_attendance(&self, new: &NewAttendance) -> rusqlite::Result<i64> {
        self.tx.execute(
            "INSERT INTO attendances(class_id, timetable_id, teacher_id, attendance_date, feedback)
             VALUES(?, ?, ?, ?, ?)",
            params![
                new.class_id,
                new.timetable_id,
                new.teacher_id,
                new.date,
                new.feedback
            ],
        )?;
        let attendance_id = self.tx.last_insert_rowid();

        let mut stmt = self.tx.prepare(
            "INSERT INTO student_attendances(attendance_id, student_id, status, position)
             VALUES(?, ?, ?, ?)",
        )?;
        for (position, entry) in new.students.iter().enumerate() {
            stmt.execute(params![
                attendance_id,
                entry.student_id,
                entry.status,
                position as i64
            ])?;
        }
        Ok(attendance_id)
    }

    pub fn commit(self) -> rusqlite::Result<()> {
        self.tx.commit()
    }
}

/// Attendances for a class inside `range`, ascending by date then id.
pub fn class_attendances(
    conn: &Connection,
    class_id: i64,
    range: DateRange,
) -> rusqlite::Result<Vec<AttendanceRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.attendance_date, a.feedback, t.full_name, s.name
         FROM attendances a
         JOIN teachers t ON t.id = a.teacher_id
         LEFT JOIN subjects s ON s.id = t.subject_id
         WHERE a.class_id = ? AND a.attendance_date >= ? AND a.attendance_date <= ?
         ORDER BY a.attendance_date, a.id",
    )?;
    let rows = stmt
        .query_map(params![class_id, range.start, range.end], |r| {
            Ok(AttendanceRow {
                id: r.get(0)?,
                date: r.get(1)?,
                feedback: r.get(2)?,
                teacher_name: r.get(3)?,
                subject_name: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Student entries of one attendance in submission order.
pub fn attendance_entries(conn: &Connection, attendance_id: i64) -> rusqlite::Result<Vec<EntryRow>> {
    let mut stmt = conn.prepare(
        "SELECT sa.student_id, st.full_name, sa.status
         FROM student_attendances sa
         JOIN students st ON st.id = sa.student_id
         WHERE sa.attendance_id = ?
         ORDER BY sa.position",
    )?;
    let rows = stmt
        .query_map([attendance_id], |r| {
            Ok(EntryRow {
                student_id: r.get(0)?,
                student_name: r.get(1)?,
                status: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One row per attendance the student appears in. `None` means all time.
pub fn student_history(
    conn: &Connection,
    student_id: &str,
    range: Option<DateRange>,
) -> rusqlite::Result<Vec<StudentHistoryRow>> {
    let (start, end) = match range {
        Some(r) => (Some(r.start), Some(r.end)),
        None => (None, None),
    };
    let mut stmt = conn.prepare(
        "SELECT a.id, a.attendance_date, t.full_name, s.name, sa.status
         FROM student_attendances sa
         JOIN attendances a ON a.id = sa.attendance_id
         JOIN teachers t ON t.id = a.teacher_id
         LEFT JOIN subjects s ON s.id = t.subject_id
         WHERE sa.student_id = ?1
           AND (?2 IS NULL OR a.attendance_date >= ?2)
           AND (?3 IS NULL OR a.attendance_date <= ?3)
         ORDER BY a.attendance_date, a.id, sa.position",
    )?;
    let rows = stmt
        .query_map(params![student_id, start, end], |r| {
            Ok(StudentHistoryRow {
                attendance_id: r.get(0)?,
                date: r.get(1)?,
                teacher_name: r.get(2)?,
                subject_name: r.get(3)?,
                status: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
