//! Trait abstractions for router storage
//!
//! The router only sees these traits, so tests can wrap or replace the
//! database (see `testing::BarrierStore`).

use crate::db::{
    BanEntry, CustomAnswer, Database, DbResult, RegistrationInfo, UserId, UserProfile,
};
use crate::state_machine::state::SessionState;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-user conversation state and registration
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the session, creating an idle row on first contact
    async fn load_session(&self, user: &UserId) -> DbResult<SessionState>;

    async fn save_session(&self, user: &UserId, session: &SessionState) -> DbResult<()>;

    async fn registration(&self, user: &UserId) -> DbResult<Option<RegistrationInfo>>;

    async fn save_registration(&self, user: &UserId, info: &RegistrationInfo) -> DbResult<()>;

    async fn reset_all(&self) -> DbResult<usize>;
}

/// Names of users, for the admin "who added" report
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn user_profile(&self, user: &UserId) -> DbResult<Option<UserProfile>>;
}

/// Built-in and taught answers
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn command_answer(&self, question: &str) -> DbResult<Option<String>>;

    async fn photo_answer(&self, question: &str) -> DbResult<Option<String>>;

    async fn photo_questions(&self) -> DbResult<Vec<String>>;

    async fn custom_answer(&self, question: &str) -> DbResult<Option<CustomAnswer>>;

    async fn custom_questions(&self) -> DbResult<Vec<String>>;

    /// First writer wins; `false` when the question already existed
    async fn add_custom_answer(&self, owner: &UserId, question: &str, answer: &str) -> DbResult<bool>;

    async fn delete_custom_answer(&self, question: &str) -> DbResult<bool>;
}

#[async_trait]
pub trait BanStore: Send + Sync {
    async fn ban_entry(&self, user: &UserId) -> DbResult<Option<BanEntry>>;

    async fn ban(&self, user: &UserId, reason: &str) -> DbResult<()>;

    /// `false` when the user was not banned
    async fn unban(&self, user: &UserId) -> DbResult<bool>;
}

/// Combined storage trait for convenience
pub trait Storage: SessionStore + ProfileStore + ContentStore + BanStore {}
impl<T: SessionStore + ProfileStore + ContentStore + BanStore> Storage for T {}

// ============================================================================
// Arc implementations for shared stores
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load_session(&self, user: &UserId) -> DbResult<SessionState> {
        (**self).load_session(user).await
    }

    async fn save_session(&self, user: &UserId, session: &SessionState) -> DbResult<()> {
        (**self).save_session(user, session).await
    }

    async fn registration(&self, user: &UserId) -> DbResult<Option<RegistrationInfo>> {
        (**self).registration(user).await
    }

    async fn save_registration(&self, user: &UserId, info: &RegistrationInfo) -> DbResult<()> {
        (**self).save_registration(user, info).await
    }

    async fn reset_all(&self) -> DbResult<usize> {
        (**self).reset_all().await
    }
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn user_profile(&self, user: &UserId) -> DbResult<Option<UserProfile>> {
        (**self).user_profile(user).await
    }
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn command_answer(&self, question: &str) -> DbResult<Option<String>> {
        (**self).command_answer(question).await
    }

    async fn photo_answer(&self, question: &str) -> DbResult<Option<String>> {
        (**self).photo_answer(question).await
    }

    async fn photo_questions(&self) -> DbResult<Vec<String>> {
        (**self).photo_questions().await
    }

    async fn custom_answer(&self, question: &str) -> DbResult<Option<CustomAnswer>> {
        (**self).custom_answer(question).await
    }

    async fn custom_questions(&self) -> DbResult<Vec<String>> {
        (**self).custom_questions().await
    }

    async fn add_custom_answer(&self, owner: &UserId, question: &str, answer: &str) -> DbResult<bool> {
        (**self).add_custom_answer(owner, question, answer).await
    }

    async fn delete_custom_answer(&self, question: &str) -> DbResult<bool> {
        (**self).delete_custom_answer(question).await
    }
}

#[async_trait]
impl<T: BanStore + ?Sized> BanStore for Arc<T> {
    async fn ban_entry(&self, user: &UserId) -> DbResult<Option<BanEntry>> {
        (**self).ban_entry(user).await
    }

    async fn ban(&self, user: &UserId, reason: &str) -> DbResult<()> {
        (**self).ban(user, reason).await
    }

    async fn unban(&self, user: &UserId) -> DbResult<bool> {
        (**self).unban(user).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================
//
// Single-statement queries on a local file; they run inline. `Database::`
// paths resolve to the inherent (sync) methods.

#[async_trait]
impl SessionStore for Database {
    async fn load_session(&self, user: &UserId) -> DbResult<SessionState> {
        Database::load_session(self, user)
    }

    async fn save_session(&self, user: &UserId, session: &SessionState) -> DbResult<()> {
        Database::save_session(self, user, session)
    }

    async fn registration(&self, user: &UserId) -> DbResult<Option<RegistrationInfo>> {
        Database::registration(self, user)
    }

    async fn save_registration(&self, user: &UserId, info: &RegistrationInfo) -> DbResult<()> {
        Database::save_registration(self, user, info)
    }

    async fn reset_all(&self) -> DbResult<usize> {
        self.reset_all_sessions()
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn user_profile(&self, user: &UserId) -> DbResult<Option<UserProfile>> {
        Database::user_profile(self, user)
    }
}

#[async_trait]
impl ContentStore for Database {
    async fn command_answer(&self, question: &str) -> DbResult<Option<String>> {
        Database::command_answer(self, question)
    }

    async fn photo_answer(&self, question: &str) -> DbResult<Option<String>> {
        Database::photo_answer(self, question)
    }

    async fn photo_questions(&self) -> DbResult<Vec<String>> {
        Database::photo_questions(self)
    }

    async fn custom_answer(&self, question: &str) -> DbResult<Option<CustomAnswer>> {
        Database::custom_answer(self, question)
    }

    async fn custom_questions(&self) -> DbResult<Vec<String>> {
        Database::custom_questions(self)
    }

    async fn add_custom_answer(&self, owner: &UserId, question: &str, answer: &str) -> DbResult<bool> {
        Database::add_custom_answer(self, owner, question, answer)
    }

    async fn delete_custom_answer(&self, question: &str) -> DbResult<bool> {
        Database::delete_custom_answer(self, question)
    }
}

#[async_trait]
impl BanStore for Database {
    async fn ban_entry(&self, user: &UserId) -> DbResult<Option<BanEntry>> {
        Database::ban_entry(self, user)
    }

    async fn ban(&self, user: &UserId, reason: &str) -> DbResult<()> {
        Database::ban(self, user, reason)
    }

    async fn unban(&self, user: &UserId) -> DbResult<bool> {
        Database::unban(self, user)
    }
}
