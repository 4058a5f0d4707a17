//! Effects produced by handlers
//!
//! Handlers never write to storage directly. They return effects, and the
//! router applies them before persisting the new session state.

use crate::db::{RegistrationInfo, UserId};

/// A storage mutation requested by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upsert the caller's registration
    SaveRegistration(RegistrationInfo),

    /// Insert a taught answer owned by the caller (first writer wins)
    AddCustomAnswer { question: String, answer: String },

    /// Remove a taught answer
    DeleteCustomAnswer { question: String },

    /// Add (or re-reason) a ban
    Ban { user: UserId, reason: String },

    /// Lift a ban
    Unban { user: UserId },
}

impl Effect {
    pub fn save_registration(course: &str, group: &str) -> Self {
        Effect::SaveRegistration(RegistrationInfo::complete(course, group))
    }
}
