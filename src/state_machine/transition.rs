//! Guarded state transitions shared by every flow
//!
//! A flow is a trigger phrase, an entry state and a set of interior states.
//! On every message the flow first asks `FlowSpec::guard`: enter on the
//! trigger from `Any`, handle the message if the user is already inside the
//! flow, otherwise pass so the router can try the next handler.

use super::action::ResponseAction;
use super::effect::Effect;
use super::event::Turn;
use super::state::{SessionState, Status};

/// Static description of a multi-step flow
#[derive(Debug, Clone, Copy)]
pub struct FlowSpec {
    pub name: &'static str,
    /// Folded phrase that starts the flow from `Any`
    pub trigger: &'static str,
    /// First interior state
    pub entry: Status,
    /// Every state owned by this flow
    pub interior: &'static [Status],
}

/// Which branch of a flow a message falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Enter,
    Interior(Status),
    Pass,
}

impl FlowSpec {
    pub fn guard(&self, turn: &Turn<'_>) -> Guard {
        let status = turn.session.status;
        if status.is_idle() && turn.folded == self.trigger {
            Guard::Enter
        } else if self.owns(status) {
            Guard::Interior(status)
        } else {
            Guard::Pass
        }
    }

    pub fn owns(&self, status: Status) -> bool {
        self.interior.contains(&status)
    }

    /// Move into the entry state with an empty callback
    pub fn enter(&self, action: ResponseAction) -> Step {
        tracing::debug!(flow = self.name, entry = %self.entry, "Entering flow");
        Step::reply(action, SessionState::at(self.entry))
    }
}

/// What a flow does with input that doesn't fit the current state
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// Stay in the current state and ask again
    Reprompt(ResponseAction),
    /// Reset to `Any` without replying; the router keeps looking
    SilentAbort,
    /// Reset to `Any` and reply
    Abort(ResponseAction),
}

impl Mismatch {
    pub fn apply(self, session: &SessionState) -> Step {
        match self {
            Mismatch::Reprompt(action) => Step::reply(action, session.clone()),
            Mismatch::SilentAbort => Step::Rewind(SessionState::idle()),
            Mismatch::Abort(action) => Step::finish(action),
        }
    }
}

/// A reply plus the state and effects that come with it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub action: ResponseAction,
    pub next: SessionState,
    pub effects: Vec<Effect>,
}

/// Result of offering a message to one handler
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Not mine
    Pass,
    /// No reply, but the session moved (silent abort)
    Rewind(SessionState),
    /// Answered; stop the chain
    Reply(Outcome),
}

impl Step {
    pub fn reply(action: ResponseAction, next: SessionState) -> Self {
        Step::Reply(Outcome {
            action,
            next,
            effects: vec![],
        })
    }

    /// Reply without touching the session
    pub fn answer(action: ResponseAction, session: &SessionState) -> Self {
        Step::reply(action, session.clone())
    }

    /// Reply and return to `Any`
    pub fn finish(action: ResponseAction) -> Self {
        Step::reply(action, SessionState::idle())
    }

    /// Attach an effect to a reply. No-op for other variants.
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        if let Step::Reply(outcome) = &mut self {
            outcome.effects.push(effect);
        }
        self
    }

    #[allow(dead_code)] // Used by handler tests
    pub fn is_pass(&self) -> bool {
        matches!(self, Step::Pass)
    }

    /// Session after this step, given the session before it
    #[allow(dead_code)] // Used by handler tests
    pub fn next_session<'a>(&'a self, before: &'a SessionState) -> &'a SessionState {
        match self {
            Step::Pass => before,
            Step::Rewind(next) => next,
            Step::Reply(outcome) => &outcome.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserId;

    const DEMO: FlowSpec = FlowSpec {
        name: "demo",
        trigger: "go",
        entry: Status::Query,
        interior: &[Status::Query],
    };

    fn guard_for(status: Status, text: &str) -> Guard {
        let user = UserId::from("u");
        let session = SessionState::at(status);
        let turn = Turn::new(&user, text, &session, None, false);
        DEMO.guard(&turn)
    }

    #[test]
    fn test_trigger_enters_only_from_any() {
        assert_eq!(guard_for(Status::Any, "  GO "), Guard::Enter);
        assert_eq!(guard_for(Status::Link, "go"), Guard::Pass);
    }

    #[test]
    fn test_interior_state_claims_any_text() {
        assert_eq!(guard_for(Status::Query, "go"), Guard::Interior(Status::Query));
        assert_eq!(guard_for(Status::Query, "x"), Guard::Interior(Status::Query));
        assert_eq!(guard_for(Status::Any, "x"), Guard::Pass);
    }

    #[test]
    fn test_mismatch_policies() {
        let session = SessionState::at(Status::Query);

        let reprompt = Mismatch::Reprompt(ResponseAction::text("again")).apply(&session);
        assert_eq!(reprompt.next_session(&session).status, Status::Query);

        let silent = Mismatch::SilentAbort.apply(&session);
        assert_eq!(silent, Step::Rewind(SessionState::idle()));

        let abort = Mismatch::Abort(ResponseAction::text("bye")).apply(&session);
        assert!(abort.next_session(&session).is_idle());
        assert!(matches!(abort, Step::Reply(_)));
    }

    #[test]
    fn test_effects_only_attach_to_replies() {
        let effect = Effect::DeleteCustomAnswer { question: "q".into() };
        assert_eq!(Step::Pass.with_effect(effect.clone()), Step::Pass);
        match Step::finish(ResponseAction::text("ok")).with_effect(effect.clone()) {
            Step::Reply(outcome) => assert_eq!(outcome.effects, vec![effect]),
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
