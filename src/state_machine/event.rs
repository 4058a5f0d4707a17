//! The inbound message as seen by handlers

use super::state::SessionState;
use crate::db::{RegistrationInfo, UserId};
use crate::moderation::ReservedWords;
use crate::runtime::traits::ContentStore;
use crate::services::Services;

/// One inbound message, plus the state it arrived into
#[derive(Debug)]
pub struct Turn<'a> {
    pub user: &'a UserId,
    /// Trimmed, original case (used for free text like queries and answers)
    pub text: &'a str,
    /// Trimmed and lower-cased (used for all vocabulary matching)
    pub folded: String,
    pub session: &'a SessionState,
    pub registration: Option<&'a RegistrationInfo>,
    pub is_admin: bool,
}

impl<'a> Turn<'a> {
    pub fn new(
        user: &'a UserId,
        text: &'a str,
        session: &'a SessionState,
        registration: Option<&'a RegistrationInfo>,
        is_admin: bool,
    ) -> Self {
        let text = text.trim();
        Self {
            user,
            text,
            folded: text.to_lowercase(),
            session,
            registration,
            is_admin,
        }
    }

    /// Course and group, when registration is complete
    pub fn course_and_group(&self) -> Option<(&'a str, &'a str)> {
        self.registration.and_then(RegistrationInfo::course_and_group)
    }
}

/// Collaborators a flow may consult
pub struct FlowContext<'a> {
    pub services: &'a Services,
    pub content: &'a dyn ContentStore,
    pub reserved: &'a ReservedWords,
}
