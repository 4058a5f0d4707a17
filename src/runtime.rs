//! Conversation router
//!
//! One inbound message is one call to [`Router::get_answer`]: load the
//! session, offer the message to each handler in a fixed order until one
//! replies, apply the reply's effects, then persist the session once.

mod commands;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::db::{DbError, UserId};
use crate::moderation::ReservedWords;
use crate::services::Services;
use crate::state_machine::action::ResponseAction;
use crate::state_machine::effect::Effect;
use crate::state_machine::event::{FlowContext, Turn};
use crate::state_machine::transition::{Outcome, Step};
use crate::state_machine::{graph, links, query, registration, replies, schedule, teach};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("storage failure: {0}")]
    Store(#[from] DbError),
}

/// Handlers in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Registration,
    StaticAnswer,
    WhoAdded,
    Photo,
    Teach,
    Links,
    Schedule,
    Query,
    Menu,
    Graph,
    Ban,
    Unban,
    Delete,
    FuzzyAnswer,
}

/// First reply wins. Registration must stay first: it owns every message
/// of an unregistered user. Approximate matches only get what nothing else
/// claimed.
const CHAIN: [Handler; 14] = [
    Handler::Registration,
    Handler::StaticAnswer,
    Handler::WhoAdded,
    Handler::Photo,
    Handler::Teach,
    Handler::Links,
    Handler::Schedule,
    Handler::Query,
    Handler::Menu,
    Handler::Graph,
    Handler::Ban,
    Handler::Unban,
    Handler::Delete,
    Handler::FuzzyAnswer,
];

pub struct Router<S: Storage> {
    store: S,
    services: Services,
    reserved: ReservedWords,
    admins: HashSet<UserId>,
    other_materials: Option<String>,
}

impl<S: Storage> Router<S> {
    pub fn new(store: S, services: Services, admins: HashSet<UserId>, other_materials: Option<String>) -> Self {
        Self {
            store,
            services,
            reserved: ReservedWords::builtin(),
            admins,
            other_materials,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admins.contains(user)
    }

    /// Produce at most one reply to `text` from `user`.
    ///
    /// `Ok(None)` is the empty sentinel: nothing matched and the transport
    /// sends its own fallback. Storage failures abort the turn without a
    /// reply. Effects run before the session write, so a failed effect
    /// leaves the stored session where it was.
    pub async fn get_answer(&self, user: &UserId, text: &str) -> Result<Option<ResponseAction>, RouterError> {
        let before = self.store.load_session(user).await?;
        let is_admin = self.is_admin(user);

        if !is_admin {
            if let Some(entry) = self.store.ban_entry(user).await? {
                tracing::debug!(user = %user, reason = %entry.reason, "Message from banned user");
                return Ok(Some(ResponseAction::text(replies::ACCESS_RESTRICTED)));
            }
        }

        let registration = self.store.registration(user).await?;
        let mut session = before.clone();
        let mut outcome = None;

        for handler in CHAIN {
            let turn = Turn::new(user, text, &session, registration.as_ref(), is_admin);
            match self.dispatch(handler, &turn).await? {
                Step::Pass => {}
                Step::Rewind(next) => {
                    tracing::debug!(user = %user, ?handler, from = %session.status, "Flow abandoned");
                    session = next;
                }
                Step::Reply(reply) => {
                    tracing::debug!(user = %user, ?handler, from = %session.status, to = %reply.next.status, "Handled");
                    outcome = Some(reply);
                    break;
                }
            }
        }

        let action = match outcome {
            Some(Outcome { action, next, effects }) => {
                self.apply_effects(user, effects).await?;
                session = next;
                Some(action)
            }
            None => {
                tracing::debug!(user = %user, status = %session.status, "No handler matched");
                None
            }
        };

        if session != before {
            self.store.save_session(user, &session).await?;
        }

        Ok(action)
    }

    /// Return every user to `Any`
    pub async fn reset_all(&self) -> Result<usize, RouterError> {
        Ok(self.store.reset_all().await?)
    }

    async fn dispatch(&self, handler: Handler, turn: &Turn<'_>) -> Result<Step, DbError> {
        let ctx = FlowContext {
            services: &self.services,
            content: &self.store,
            reserved: &self.reserved,
        };

        match handler {
            Handler::Registration => Ok(registration::handle(turn, &ctx)),
            Handler::StaticAnswer => commands::static_answer(turn, &self.store).await,
            Handler::WhoAdded => commands::who_added(turn, &self.store).await,
            Handler::Photo => commands::photo_answer(turn, &self.store).await,
            Handler::Teach => teach::handle(turn, &ctx).await,
            Handler::Links => Ok(links::handle(turn, &ctx).await),
            Handler::Schedule => Ok(schedule::handle(turn, &ctx).await),
            Handler::Query => Ok(query::handle(turn, &ctx).await),
            Handler::Menu => Ok(commands::menu_navigation(turn, &ctx, self.other_materials.as_deref())),
            Handler::Graph => Ok(graph::handle(turn, &ctx).await),
            Handler::Ban => Ok(commands::ban(turn)),
            Handler::Unban => commands::unban(turn, &self.store).await,
            Handler::Delete => commands::delete_custom(turn, &self.store).await,
            Handler::FuzzyAnswer => commands::fuzzy_answer(turn, &self.store).await,
        }
    }

    async fn apply_effects(&self, user: &UserId, effects: Vec<Effect>) -> Result<(), DbError> {
        for effect in effects {
            match effect {
                Effect::SaveRegistration(info) => self.store.save_registration(user, &info).await?,
                Effect::AddCustomAnswer { question, answer } => {
                    if !self.store.add_custom_answer(user, &question, &answer).await? {
                        tracing::info!(user = %user, question = %question, "Question already taught, keeping first answer");
                    }
                }
                Effect::DeleteCustomAnswer { question } => {
                    self.store.delete_custom_answer(&question).await?;
                }
                Effect::Ban { user: target, reason } => self.store.ban(&target, &reason).await?,
                Effect::Unban { user: target } => {
                    self.store.unban(&target).await?;
                }
            }
        }
        Ok(())
    }
}
