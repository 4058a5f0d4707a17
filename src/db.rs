//! Database module for the campus bot
//!
//! Persists conversation sessions, registrations, bans, taught answers and
//! the inbound message log.

mod schema;

pub use schema::*;
use schema::Tables;

use crate::config::Platform;
use crate::state_machine::state::{Callback, SessionState, Status};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Callback encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    platform: Platform,
    tables: Arc<Tables>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P, platform: Platform) -> DbResult<Self> {
        Self::init(Connection::open(path)?, platform)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(platform: Platform) -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?, platform)
    }

    fn init(conn: Connection, platform: Platform) -> DbResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            platform,
            tables: Arc::new(Tables::new(platform.prefix())),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock();
        conn.execute_batch(&PLATFORM_SCHEMA.replace("{p}", self.platform.prefix()))?;
        conn.execute_batch(CONTENT_SCHEMA)?;
        Ok(())
    }

    /// A panic while holding the lock cannot leave a half-applied statement
    /// behind, so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    // ==================== Session Operations ====================

    /// Read the session, creating an idle row on first contact
    pub fn load_session(&self, user: &UserId) -> DbResult<SessionState> {
        let conn = self.lock();
        let t = &self.tables.status;
        conn.execute(
            &format!("INSERT OR IGNORE INTO {t} (user_id, updated_at) VALUES (?1, ?2)"),
            params![user.as_str(), now()],
        )?;
        let (status, callback): (String, String) = conn.query_row(
            &format!("SELECT status, callback FROM {t} WHERE user_id = ?1"),
            params![user.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(decode_session(user, &status, &callback))
    }

    /// Single upsert of status and callback
    pub fn save_session(&self, user: &UserId, session: &SessionState) -> DbResult<()> {
        let callback = serde_json::to_string(&session.callback)?;
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, status, callback, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    status = excluded.status,
                    callback = excluded.callback,
                    updated_at = excluded.updated_at",
                self.tables.status
            ),
            params![user.as_str(), session.status.as_str(), callback, now()],
        )?;
        Ok(())
    }

    #[allow(dead_code)] // Single-field accessors; the router uses load_session/save_session
    pub fn get_status(&self, user: &UserId) -> DbResult<Status> {
        Ok(self.load_session(user)?.status)
    }

    /// Set status; a missing callback clears the stored one
    #[allow(dead_code)]
    pub fn set_status(&self, user: &UserId, status: Status, callback: Option<&Callback>) -> DbResult<()> {
        let session = SessionState {
            status,
            callback: callback.cloned().unwrap_or_default(),
        };
        self.save_session(user, &session)
    }

    #[allow(dead_code)]
    pub fn get_callback(&self, user: &UserId) -> DbResult<Callback> {
        Ok(self.load_session(user)?.callback)
    }

    /// Return every session to `{Any, empty}`.
    ///
    /// Run at startup and on shutdown so no user is stranded mid-flow across
    /// a restart.
    pub fn reset_all_sessions(&self) -> DbResult<usize> {
        let conn = self.lock();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET status = ?1, callback = '{{}}', updated_at = ?2
                 WHERE status != ?1 OR callback != '{{}}'",
                self.tables.status
            ),
            params![Status::Any.as_str(), now()],
        )?;
        Ok(updated)
    }

    // ==================== Registration Operations ====================

    pub fn registration(&self, user: &UserId) -> DbResult<Option<RegistrationInfo>> {
        let conn = self.lock();
        let info = conn
            .query_row(
                &format!("SELECT course, group_name FROM {} WHERE user_id = ?1", self.tables.registration),
                params![user.as_str()],
                |row| {
                    Ok(RegistrationInfo {
                        course: row.get(0)?,
                        group: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    pub fn save_registration(&self, user: &UserId, info: &RegistrationInfo) -> DbResult<()> {
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, course, group_name, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    course = excluded.course,
                    group_name = excluded.group_name,
                    updated_at = excluded.updated_at",
                self.tables.registration
            ),
            params![user.as_str(), info.course, info.group, now()],
        )?;
        Ok(())
    }

    // ==================== Profile & Log Operations ====================

    /// Remember a user the first time they write; later names are ignored
    pub fn record_user(&self, user: &UserId, first_name: Option<&str>, last_name: Option<&str>) -> DbResult<()> {
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id, first_name, last_name, first_seen) VALUES (?1, ?2, ?3, ?4)",
                self.tables.users
            ),
            params![user.as_str(), first_name, last_name, now()],
        )?;
        Ok(())
    }

    pub fn user_profile(&self, user: &UserId) -> DbResult<Option<UserProfile>> {
        let conn = self.lock();
        let profile = conn
            .query_row(
                &format!(
                    "SELECT first_name, last_name, first_seen FROM {} WHERE user_id = ?1",
                    self.tables.users
                ),
                params![user.as_str()],
                |row| {
                    Ok(UserProfile {
                        user: user.clone(),
                        first_name: row.get(0)?,
                        last_name: row.get(1)?,
                        first_seen: parse_datetime(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    pub fn record_message(&self, user: &UserId, text: &str) -> DbResult<()> {
        let conn = self.lock();
        conn.execute(
            &format!("INSERT INTO {} (user_id, text, received_at) VALUES (?1, ?2, ?3)", self.tables.messages),
            params![user.as_str(), text, now()],
        )?;
        Ok(())
    }

    /// Latest messages of one user, newest first
    #[allow(dead_code)] // For operators inspecting the log
    pub fn recent_messages(&self, user: &UserId, limit: usize) -> DbResult<Vec<LoggedMessage>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT text, received_at FROM {} WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
            self.tables.messages
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![user.as_str(), limit], |row| {
            Ok(LoggedMessage {
                user: user.clone(),
                text: row.get(0)?,
                received_at: parse_datetime(&row.get::<_, String>(1)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    // ==================== Content Operations ====================

    pub fn command_answer(&self, question: &str) -> DbResult<Option<String>> {
        let conn = self.lock();
        let answer = conn
            .query_row(
                "SELECT answer FROM commands WHERE question = ?1",
                params![question],
                |row| row.get(0),
            )
            .optional()?;
        Ok(answer)
    }

    pub fn photo_answer(&self, question: &str) -> DbResult<Option<String>> {
        let conn = self.lock();
        let url = conn
            .query_row(
                "SELECT url FROM photo_links WHERE question = ?1",
                params![question],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url)
    }

    /// Upsert every command and photo in one transaction
    pub fn seed_content(&self, seed: &ContentSeed) -> DbResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut written = 0;
        for (question, answer) in &seed.commands {
            written += tx.execute(
                "INSERT INTO commands (question, answer) VALUES (?1, ?2)
                 ON CONFLICT(question) DO UPDATE SET answer = excluded.answer",
                params![question.trim().to_lowercase(), answer],
            )?;
        }
        for (question, url) in &seed.photos {
            written += tx.execute(
                "INSERT INTO photo_links (question, url) VALUES (?1, ?2)
                 ON CONFLICT(question) DO UPDATE SET url = excluded.url",
                params![question.trim().to_lowercase(), url],
            )?;
        }
        tx.commit()?;
        Ok(written)
    }

    pub fn custom_answer(&self, question: &str) -> DbResult<Option<CustomAnswer>> {
        let conn = self.lock();
        let found = conn
            .query_row(
                "SELECT owner, question, answer FROM custom_answers WHERE question = ?1",
                params![question],
                |row| {
                    Ok(CustomAnswer {
                        owner: UserId::new(row.get::<_, String>(0)?),
                        question: row.get(1)?,
                        answer: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    pub fn photo_questions(&self) -> DbResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT question FROM photo_links ORDER BY question")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn custom_questions(&self) -> DbResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT question FROM custom_answers ORDER BY question")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Insert a taught answer. Returns `false` when the question was already
    /// taught; the first answer is kept.
    pub fn add_custom_answer(&self, owner: &UserId, question: &str, answer: &str) -> DbResult<bool> {
        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT INTO custom_answers (question, answer, owner, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(question) DO NOTHING",
            params![question, answer, owner.as_str(), now()],
        )?;
        Ok(inserted > 0)
    }

    pub fn delete_custom_answer(&self, question: &str) -> DbResult<bool> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM custom_answers WHERE question = ?1", params![question])?;
        Ok(deleted > 0)
    }

    // ==================== Ban Operations ====================

    pub fn ban_entry(&self, user: &UserId) -> DbResult<Option<BanEntry>> {
        let conn = self.lock();
        let entry = conn
            .query_row(
                &format!("SELECT reason, banned_at FROM {} WHERE user_id = ?1", self.tables.bans),
                params![user.as_str()],
                |row| {
                    Ok(BanEntry {
                        user: user.clone(),
                        reason: row.get(0)?,
                        banned_at: parse_datetime(&row.get::<_, String>(1)?),
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Ban a user, or replace the reason of an existing ban
    pub fn ban(&self, user: &UserId, reason: &str) -> DbResult<()> {
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, reason, banned_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET reason = excluded.reason",
                self.tables.bans
            ),
            params![user.as_str(), reason, now()],
        )?;
        Ok(())
    }

    /// Returns `false` when the user was not banned
    pub fn unban(&self, user: &UserId) -> DbResult<bool> {
        let conn = self.lock();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE user_id = ?1", self.tables.bans),
            params![user.as_str()],
        )?;
        Ok(deleted > 0)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

/// Rows written by older releases or edited by hand fall back to idle
fn decode_session(user: &UserId, status: &str, callback: &str) -> SessionState {
    let status = Status::parse(status).unwrap_or_else(|| {
        tracing::warn!(user = %user, status, "Unknown stored status, treating as idle");
        Status::Any
    });
    let callback = serde_json::from_str(callback).unwrap_or_else(|e| {
        tracing::warn!(user = %user, error = %e, "Unreadable stored callback, clearing");
        Callback::new()
    });
    SessionState { status, callback }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::state::callback_key;

    fn db() -> Database {
        Database::open_in_memory(Platform::Vk).unwrap()
    }

    #[test]
    fn test_first_lookup_creates_idle_row() {
        let db = db();
        let user = UserId::from("1");
        assert_eq!(db.get_status(&user).unwrap(), Status::Any);
        assert!(db.get_callback(&user).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_session() {
        let db = db();
        let user = UserId::from("1");
        let session = SessionState::with(Status::RegGroup, callback_key::COURSE_NAME, "2 курс");
        db.save_session(&user, &session).unwrap();
        assert_eq!(db.load_session(&user).unwrap(), session);

        db.set_status(&user, Status::Query, None).unwrap();
        let reloaded = db.load_session(&user).unwrap();
        assert_eq!(reloaded.status, Status::Query);
        assert!(reloaded.callback.is_empty());
    }

    #[test]
    fn test_garbage_status_reads_as_idle() {
        let db = db();
        let user = UserId::from("1");
        db.load_session(&user).unwrap();
        db.lock()
            .execute(
                "UPDATE vk_user_status SET status = 'bogus', callback = 'not json' WHERE user_id = '1'",
                [],
            )
            .unwrap();
        assert_eq!(db.load_session(&user).unwrap(), SessionState::idle());
    }

    #[test]
    fn test_reset_all_sessions() {
        let db = db();
        for (id, status) in [("1", Status::Query), ("2", Status::Func), ("3", Status::Any)] {
            db.set_status(&UserId::from(id), status, None).unwrap();
        }
        db.save_session(
            &UserId::from("4"),
            &SessionState::with(Status::CustomAnswer, callback_key::QUESTION, "q"),
        )
        .unwrap();

        assert_eq!(db.reset_all_sessions().unwrap(), 3);
        for id in ["1", "2", "3", "4"] {
            assert_eq!(db.load_session(&UserId::from(id)).unwrap(), SessionState::idle());
        }
        assert_eq!(db.reset_all_sessions().unwrap(), 0);
    }

    #[test]
    fn test_registration_upsert() {
        let db = db();
        let user = UserId::from("1");
        assert_eq!(db.registration(&user).unwrap(), None);
        db.save_registration(&user, &RegistrationInfo::complete("1 курс", "б03-0101")).unwrap();
        db.save_registration(&user, &RegistrationInfo::complete("2 курс", "б03-9102")).unwrap();
        assert_eq!(
            db.registration(&user).unwrap(),
            Some(RegistrationInfo::complete("2 курс", "б03-9102"))
        );
    }

    #[test]
    fn test_custom_answer_first_writer_wins() {
        let db = db();
        assert!(db.add_custom_answer(&UserId::from("1"), "как дела", "хорошо").unwrap());
        assert!(!db.add_custom_answer(&UserId::from("2"), "как дела", "плохо").unwrap());

        let stored = db.custom_answer("как дела").unwrap().unwrap();
        assert_eq!(stored.answer, "хорошо");
        assert_eq!(stored.owner, UserId::from("1"));
        assert_eq!(db.custom_questions().unwrap(), vec!["как дела".to_string()]);

        assert!(db.delete_custom_answer("как дела").unwrap());
        assert!(!db.delete_custom_answer("как дела").unwrap());
    }

    #[test]
    fn test_ban_and_unban() {
        let db = db();
        let user = UserId::from("12345");
        db.ban(&user, "spam").unwrap();
        db.ban(&user, "flood").unwrap();
        assert_eq!(db.ban_entry(&user).unwrap().unwrap().reason, "flood");
        assert!(db.unban(&user).unwrap());
        assert!(!db.unban(&user).unwrap());
        assert_eq!(db.ban_entry(&user).unwrap(), None);
    }

    #[test]
    fn test_seed_content_folds_keys() {
        let db = db();
        let mut seed = ContentSeed::default();
        seed.commands.insert("  Привет ".into(), "Здравствуйте!".into());
        seed.photos.insert("Кот".into(), "https://example.org/cat.jpg".into());
        assert_eq!(db.seed_content(&seed).unwrap(), 2);
        assert_eq!(db.command_answer("привет").unwrap().as_deref(), Some("Здравствуйте!"));
        assert_eq!(
            db.photo_answer("кот").unwrap().as_deref(),
            Some("https://example.org/cat.jpg")
        );
        assert_eq!(db.photo_questions().unwrap(), vec!["кот".to_string()]);
    }

    #[test]
    fn test_profiles_and_message_log() {
        let db = db();
        let user = UserId::from("1");
        db.record_user(&user, Some("Иван"), Some("Петров")).unwrap();
        db.record_user(&user, Some("Другой"), None).unwrap();
        let profile = db.user_profile(&user).unwrap().unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Иван"));

        db.record_message(&user, "первое").unwrap();
        db.record_message(&user, "второе").unwrap();
        let log = db.recent_messages(&user, 1).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "второе");
    }

    #[test]
    fn test_platforms_do_not_share_sessions() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let vk = Database::open(file.path(), Platform::Vk).unwrap();
        let tg = Database::open(file.path(), Platform::Tg).unwrap();
        let user = UserId::from("1");

        vk.set_status(&user, Status::Query, None).unwrap();
        assert_eq!(tg.get_status(&user).unwrap(), Status::Any);

        vk.add_custom_answer(&user, "общий", "ответ").unwrap();
        assert!(tg.custom_answer("общий").unwrap().is_some());
    }
}
