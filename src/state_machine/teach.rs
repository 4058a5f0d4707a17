//! Teach-bot: `Any -> CustomToAnswer -> CustomAnswer -> Any`
//!
//! Every rejection resets to `Any` with its own message. The answer is
//! stored through an effect so a failed write never leaves a half-taught
//! phrase behind.

use super::action::ResponseAction;
use super::effect::Effect;
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::{callback_key, SessionState, Status};
use super::transition::{FlowSpec, Guard, Step};
use super::vocabulary;
use crate::db::DbError;
use crate::moderation::{self, ModerationError, Verdict};

pub const FLOW: FlowSpec = FlowSpec {
    name: "teach",
    trigger: vocabulary::TEACH,
    entry: Status::CustomToAnswer,
    interior: &[Status::CustomToAnswer, Status::CustomAnswer],
};

pub async fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Result<Step, DbError> {
    match FLOW.guard(turn) {
        Guard::Pass => Ok(Step::Pass),
        Guard::Enter => Ok(FLOW.enter(ResponseAction::text(replies::CUSTOM_TO_ANSWER))),
        Guard::Interior(Status::CustomToAnswer) => capture_question(turn, ctx).await,
        Guard::Interior(_) => Ok(capture_answer(turn, ctx).await),
    }
}

async fn capture_question(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Result<Step, DbError> {
    let verdict =
        moderation::review_question(turn.text, ctx.services.filter.as_ref(), ctx.reserved, ctx.content).await;

    let reject = match verdict {
        Ok(Verdict::Accepted(question)) => {
            tracing::debug!(user = %turn.user, question = %question, "Question accepted");
            return Ok(Step::reply(
                ResponseAction::text(replies::CUSTOM_ANSWER),
                SessionState::with(Status::CustomAnswer, callback_key::QUESTION, question),
            ));
        }
        Ok(Verdict::Profanity) => replies::CUSTOM_FILTER_REJECT,
        Ok(Verdict::Reserved) => replies::CUSTOM_RESERVED_REJECT,
        Ok(Verdict::AlreadyTaught) => replies::CUSTOM_TAUGHT_REJECT,
        Err(ModerationError::Filter(e)) => {
            tracing::warn!(user = %turn.user, error = %e, "Filter failed on question");
            replies::FILTER_FAILED
        }
        Err(ModerationError::Store(e)) => return Err(e),
    };

    tracing::debug!(user = %turn.user, text = %turn.folded, reject, "Question rejected");
    Ok(Step::finish(ResponseAction::text(reject)))
}

async fn capture_answer(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    match moderation::passes_filter(ctx.services.filter.as_ref(), turn.text).await {
        Ok(true) => {}
        Ok(false) => return Step::finish(ResponseAction::text(replies::CUSTOM_FILTER_REJECT)),
        Err(e) => {
            tracing::warn!(user = %turn.user, error = %e, "Filter failed on answer");
            return Step::finish(ResponseAction::text(replies::FILTER_FAILED));
        }
    }

    let Some(question) = turn.session.callback_value(callback_key::QUESTION) else {
        tracing::warn!(user = %turn.user, "Answer step without a stored question");
        return FLOW.enter(ResponseAction::text(replies::CUSTOM_TO_ANSWER));
    };

    tracing::info!(user = %turn.user, question, "Custom answer taught");
    Step::finish(ResponseAction::text(replies::CUSTOM_FINISH)).with_effect(Effect::AddCustomAnswer {
        question: question.to_string(),
        answer: turn.text.to_string(),
    })
}
