//! Conversation state machine
//!
//! Each flow is a small set of states with a trigger phrase. Handlers are
//! pure with respect to storage: they read the turn and the collaborators,
//! and return a [`transition::Step`] carrying the reply, the next session
//! and any storage effects for the router to apply.

pub mod action;
pub mod effect;
pub mod event;
pub mod graph;
pub mod links;
pub mod query;
pub mod registration;
pub mod replies;
pub mod schedule;
pub mod state;
pub mod teach;
pub mod transition;
pub mod vocabulary;

#[cfg(test)]
mod proptests;
