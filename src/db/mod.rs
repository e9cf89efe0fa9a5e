//! SQLite persistence layer for hrm
//!
//! Owns the connection and all reads/writes of the `users` and `notes`
//! tables. Every statement is auto-committed on its own.

use log::{error, info, warn};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

use crate::models::{NewPerson, Note, Person, SortKey};

/// Failure opening, querying, or writing the store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

const PERSON_COLUMNS: &str = "id, username, age, position, email, phone";

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            error!(
                "event=db_open module=db status=error path={} error={}",
                path.display(),
                e
            );
            e
        })?;
        let db = Self { conn };
        db.init_schema()?;
        info!("event=db_open module=db status=ok path={}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        info!("event=db_open module=db status=ok mode=memory");
        Ok(db)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                username  TEXT NOT NULL,
                age       INTEGER NOT NULL,
                position  TEXT NOT NULL,
                email     TEXT NOT NULL,
                phone     TEXT NOT NULL
            )
            "#,
            [],
        )?;

        // user_id is declared as a reference but foreign_keys stays off, so
        // deleting a user leaves its notes behind.
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                user_id  INTEGER,
                content  TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
            "#,
            [],
        )?;

        Ok(())
    }

    /// Insert a new person and return the id assigned by the store
    pub fn add_person(&self, person: &NewPerson) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO users (username, age, position, email, phone) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                person.name,
                person.age,
                person.position,
                person.email,
                person.phone
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("event=person_add module=db status=ok id={}", id);
        Ok(id)
    }

    /// All people, ordered by the given key. Ties keep insertion order.
    pub fn list_people(&self, sort: SortKey) -> StorageResult<Vec<Person>> {
        let order = match sort {
            SortKey::Name => "username, id",
            SortKey::Age => "age, id",
            SortKey::Position => "id",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PERSON_COLUMNS} FROM users ORDER BY {order}"))?;
        let rows = stmt.query_map([], map_person)?;

        let mut people = Vec::new();
        for row in rows {
            people.push(row?);
        }

        if sort == SortKey::Position {
            // Stable: titles off the ladder land last, in insertion order.
            people.sort_by_key(|p| p.rank().unwrap_or(usize::MAX));
        }
        Ok(people)
    }

    /// Get a person by id
    pub fn get_person(&self, id: i64) -> StorageResult<Option<Person>> {
        let result = self.conn.query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            map_person,
        );

        match result {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a person. Notes attached to the id are left untouched.
    /// Returns the number of rows removed.
    pub fn delete_person(&self, id: i64) -> StorageResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if removed == 0 {
            warn!("event=person_delete module=db status=miss id={}", id);
        } else {
            info!("event=person_delete module=db status=ok id={}", id);
        }
        Ok(removed)
    }

    /// Attach a note to a person id. The id is not checked.
    pub fn add_note(&self, user_id: i64, content: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO notes (user_id, content) VALUES (?1, ?2)",
            params![user_id, content],
        )?;
        info!("event=note_add module=db status=ok user_id={}", user_id);
        Ok(())
    }

    /// Notes attached to a person id, oldest first
    pub fn list_notes(&self, user_id: i64) -> StorageResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, content FROM notes WHERE user_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Note {
                user_id: row.get(0)?,
                content: row.get(1)?,
            })
        })?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// People whose name contains `query` literally
    pub fn search_people(&self, query: &str) -> StorageResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            r"SELECT {PERSON_COLUMNS} FROM users WHERE username LIKE '%' || ?1 || '%' ESCAPE '\'"
        ))?;
        let rows = stmt.query_map(params![escape_like(query)], map_person)?;

        let mut people = Vec::new();
        for row in rows {
            people.push(row?);
        }
        Ok(people)
    }

    /// Number of stored people
    pub fn count_people(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Release the connection, reporting any failure to close it
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| {
            error!("event=db_close module=db status=error error={}", e);
            StorageError::from(e)
        })?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }
}

fn map_person(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        position: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
    })
}

/// Escape LIKE wildcards so the pattern matches `query` literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_person(name: &str, age: i64, position: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            age,
            position: position.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            phone: "010-0000-0000".to_string(),
        }
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.add_person(&new_person("Kim", 29, "사원")).unwrap();
        db.init_schema().unwrap();
        assert_eq!(db.count_people().unwrap(), 1);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_position_sort_puts_unknown_titles_last_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.add_person(&new_person("A", 30, "CEO")).unwrap();
        db.add_person(&new_person("B", 30, "사장")).unwrap();
        db.add_person(&new_person("C", 30, "")).unwrap();
        db.add_person(&new_person("D", 30, "인턴")).unwrap();

        let names: Vec<String> = db
            .list_people(SortKey::Position)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_get_missing_person_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_person(42).unwrap().is_none());
        assert_eq!(db.delete_person(42).unwrap(), 0);
    }

    #[test]
    fn test_notes_keep_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let id = db.add_person(&new_person("Kim", 29, "사원")).unwrap();
        db.add_note(id, "first").unwrap();
        db.add_note(id, "second").unwrap();
        db.add_note(id + 1, "other").unwrap();
        assert_eq!(
            db.list_notes(id).unwrap(),
            vec![Note::new(id, "first"), Note::new(id, "second")]
        );
    }
}
