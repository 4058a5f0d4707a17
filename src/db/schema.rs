//! Database schema and record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-platform tables. `{p}` is replaced by the platform prefix so a VK
/// and a Telegram deployment can share one database file.
pub const PLATFORM_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS {p}_user_status (
    user_id TEXT PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'any',
    callback TEXT NOT NULL DEFAULT '{}',
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {p}_reg_info (
    user_id TEXT PRIMARY KEY,
    course TEXT,
    group_name TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {p}_ban_list (
    user_id TEXT PRIMARY KEY,
    reason TEXT NOT NULL DEFAULT '',
    banned_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {p}_users (
    user_id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    first_seen TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {p}_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    text TEXT NOT NULL,
    received_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{p}_messages_user ON {p}_messages(user_id, id);
";

/// Content shared by every platform
pub const CONTENT_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS commands (
    question TEXT PRIMARY KEY,
    answer TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS photo_links (
    question TEXT PRIMARY KEY,
    url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS custom_answers (
    question TEXT PRIMARY KEY,
    answer TEXT NOT NULL,
    owner TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// Table names for one platform
#[derive(Debug, Clone)]
pub(super) struct Tables {
    pub status: String,
    pub registration: String,
    pub bans: String,
    pub users: String,
    pub messages: String,
}

impl Tables {
    pub fn new(prefix: &str) -> Self {
        Self {
            status: format!("{prefix}_user_status"),
            registration: format!("{prefix}_reg_info"),
            bans: format!("{prefix}_ban_list"),
            users: format!("{prefix}_users"),
            messages: format!("{prefix}_messages"),
        }
    }
}

/// Chat-platform user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Course and group picked during registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub course: Option<String>,
    pub group: Option<String>,
}

impl RegistrationInfo {
    pub fn complete(course: &str, group: &str) -> Self {
        Self {
            course: Some(course.to_string()),
            group: Some(group.to_string()),
        }
    }

    /// Both labels, or `None` while either is missing
    pub fn course_and_group(&self) -> Option<(&str, &str)> {
        let course = self.course.as_deref().filter(|c| !c.is_empty())?;
        let group = self.group.as_deref().filter(|g| !g.is_empty())?;
        Some((course, group))
    }

    pub fn is_complete(&self) -> bool {
        self.course_and_group().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanEntry {
    pub user: UserId,
    pub reason: String,
    pub banned_at: DateTime<Utc>,
}

/// A phrase taught by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomAnswer {
    pub owner: UserId,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedMessage {
    pub user: UserId,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Built-in answers loaded at startup. Keys are folded on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContentSeed {
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
    #[serde(default)]
    pub photos: BTreeMap<String, String>,
}

impl ContentSeed {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.photos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_completeness() {
        assert!(RegistrationInfo::complete("1 курс", "б03-0101").is_complete());
        assert!(!RegistrationInfo::default().is_complete());
        let blank_group = RegistrationInfo {
            course: Some("1 курс".into()),
            group: Some(String::new()),
        };
        assert_eq!(blank_group.course_and_group(), None);
    }

    #[test]
    fn test_content_seed_accepts_partial_json() {
        let seed: ContentSeed = serde_json::from_str(r#"{"commands": {"привет": "Привет!"}}"#).unwrap();
        assert_eq!(seed.commands.len(), 1);
        assert!(seed.photos.is_empty());
        assert!(!seed.is_empty());
    }
}
