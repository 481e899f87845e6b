use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "attendance.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    // Workspaces created before durations were tracked lack the column.
    ensure_subjects_duration(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS timetables(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            timetable_id INTEGER,
            FOREIGN KEY(timetable_id) REFERENCES timetables(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            subject_id INTEGER,
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendances(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_id INTEGER NOT NULL,
            timetable_id INTEGER NOT NULL,
            teacher_id TEXT NOT NULL,
            attendance_date TEXT NOT NULL,
            feedback TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id),
            FOREIGN KEY(timetable_id) REFERENCES timetables(id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendances_class_date ON attendances(class_id, attendance_date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_attendances(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            attendance_id INTEGER NOT NULL,
            student_id TEXT NOT NULL,
            status TEXT NOT NULL,
            position INTEGER NOT NULL,
            FOREIGN KEY(attendance_id) REFERENCES attendances(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(attendance_id, position)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_attendances_attendance ON student_attendances(attendance_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_attendances_student ON student_attendances(student_id)",
        [],
    )?;

    Ok(())
}

fn ensure_subjects_duration(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "subjects", "duration_minutes")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE subjects ADD COLUMN duration_minutes INTEGER NOT NULL DEFAULT 0",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
