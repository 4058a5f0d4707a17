//! Free-form query: `Any -> Query -> Any`

use super::action::ResponseAction;
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::Status;
use super::transition::{FlowSpec, Guard, Step};
use super::vocabulary;

pub const FLOW: FlowSpec = FlowSpec {
    name: "query",
    trigger: vocabulary::QUERY,
    entry: Status::Query,
    interior: &[Status::Query],
};

pub async fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    match FLOW.guard(turn) {
        Guard::Pass => Step::Pass,
        Guard::Enter => FLOW.enter(ResponseAction::text(replies::INPUT_QUERY)),
        Guard::Interior(_) => {
            // The query goes out in its original case.
            let answer = match ctx.services.query.ask(turn.text).await {
                Ok(answer) if !answer.trim().is_empty() => answer,
                Ok(_) => {
                    tracing::debug!(user = %turn.user, "Query produced no answer");
                    replies::QUERY_FAILED.to_string()
                }
                Err(e) => {
                    tracing::warn!(user = %turn.user, error = %e, "Query service failed");
                    replies::QUERY_FAILED.to_string()
                }
            };
            Step::finish(ResponseAction::text(answer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserId;
    use crate::runtime::testing::flow_fixture;
    use crate::state_machine::state::SessionState;

    async fn run(session: &SessionState, text: &str) -> Step {
        let fx = flow_fixture();
        let user = UserId::from("7");
        let turn = Turn::new(&user, text, session, None, false);
        handle(&turn, &fx.context()).await
    }

    fn text_and_status(step: Step) -> (String, Status) {
        match step {
            Step::Reply(o) => (o.action.text.unwrap_or_default(), o.next.status),
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let (text, status) = text_and_status(run(&SessionState::idle(), "запрос").await);
        assert_eq!(text, replies::INPUT_QUERY);
        assert_eq!(status, Status::Query);

        let (text, status) = text_and_status(run(&SessionState::at(Status::Query), "Derivative of x^2").await);
        assert_eq!(text, "answer: Derivative of x^2");
        assert_eq!(status, Status::Any);
    }

    #[tokio::test]
    async fn test_failure_and_empty_answer_reset() {
        for input in ["fail", "empty"] {
            let (text, status) = text_and_status(run(&SessionState::at(Status::Query), input).await);
            assert_eq!(text, replies::QUERY_FAILED);
            assert_eq!(status, Status::Any);
        }
    }
}
