//! Conversation state types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Status
// ============================================================================

/// Position of a user inside the conversation.
///
/// `Any` is the shared idle state; every other variant belongs to exactly
/// one flow. The persisted spelling (`as_str`) is stable across releases
/// because rows outlive deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No flow in progress
    #[default]
    Any,

    // Registration
    RegCourse,
    RegGroup,

    // Links
    Link,

    // Schedule
    Schedule,

    // Query
    Query,

    // Graph
    #[serde(rename = "graph_var_num")]
    VarNum,
    #[serde(rename = "graph_func")]
    Func,

    // Teach-bot
    #[serde(rename = "custom_text_to_answer")]
    CustomToAnswer,
    CustomAnswer,
}

impl Status {
    pub const ALL: [Status; 10] = [
        Status::Any,
        Status::RegCourse,
        Status::RegGroup,
        Status::Link,
        Status::Schedule,
        Status::Query,
        Status::VarNum,
        Status::Func,
        Status::CustomToAnswer,
        Status::CustomAnswer,
    ];

    /// Storage spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Any => "any",
            Status::RegCourse => "reg_course",
            Status::RegGroup => "reg_group",
            Status::Link => "link",
            Status::Schedule => "schedule",
            Status::Query => "query",
            Status::VarNum => "graph_var_num",
            Status::Func => "graph_func",
            Status::CustomToAnswer => "custom_text_to_answer",
            Status::CustomAnswer => "custom_answer",
        }
    }

    /// Parse the storage spelling. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn is_idle(self) -> bool {
        self == Status::Any
    }

    pub fn is_registration(self) -> bool {
        matches!(self, Status::RegCourse | Status::RegGroup)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Session
// ============================================================================

/// Opaque payload carried between the turns of a flow
pub type Callback = BTreeMap<String, String>;

/// Well-known callback keys
pub mod callback_key {
    /// Course picked in `RegCourse`, read in `RegGroup`
    pub const COURSE_NAME: &str = "course_name";
    /// Variable count picked in `VarNum`, read in `Func`
    pub const VAR_NUM: &str = "var_num";
    /// Question captured in `CustomToAnswer`, read in `CustomAnswer`
    pub const QUESTION: &str = "q";
}

/// Per-user persisted conversation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: Status,
    #[serde(default)]
    pub callback: Callback,
}

impl SessionState {
    /// `{Any, empty}`
    pub fn idle() -> Self {
        Self::default()
    }

    /// A state with an empty callback
    pub fn at(status: Status) -> Self {
        Self {
            status,
            callback: Callback::new(),
        }
    }

    /// A state carrying a single callback entry
    pub fn with(status: Status, key: &str, value: impl Into<String>) -> Self {
        let mut callback = Callback::new();
        callback.insert(key.to_string(), value.into());
        Self { status, callback }
    }

    pub fn callback_value(&self, key: &str) -> Option<&str> {
        self.callback.get(key).map(String::as_str)
    }

    pub fn is_idle(&self) -> bool {
        self.status.is_idle()
    }
}
