//! Plotting: `Any -> VarNum -> Func -> Any`

use super::action::{KeyboardName, ResponseAction};
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::{callback_key, SessionState, Status};
use super::transition::{FlowSpec, Guard, Mismatch, Step};
use super::vocabulary;

pub const FLOW: FlowSpec = FlowSpec {
    name: "graph",
    trigger: vocabulary::GRAPH,
    entry: Status::VarNum,
    interior: &[Status::VarNum, Status::Func],
};

pub async fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    match FLOW.guard(turn) {
        Guard::Pass => Step::Pass,

        Guard::Enter => FLOW.enter(
            ResponseAction::text(replies::CHOOSE_VAR_NUM)
                .with_keyboard(ctx.services.keyboards.render(&KeyboardName::VarNum)),
        ),

        Guard::Interior(Status::VarNum) => match vocabulary::var_count(&turn.folded) {
            Some(count) => Step::reply(
                ResponseAction::text(replies::INPUT_FUNC),
                SessionState::with(Status::Func, callback_key::VAR_NUM, count.to_string()),
            ),
            None => Mismatch::Reprompt(
                ResponseAction::text(replies::WRONG_VAR_NUM)
                    .with_keyboard(ctx.services.keyboards.render(&KeyboardName::VarNum)),
            )
            .apply(turn.session),
        },

        Guard::Interior(_) => {
            let var_count = turn
                .session
                .callback_value(callback_key::VAR_NUM)
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(1);
            let expression = turn.text;

            match ctx.services.graph.plot(expression, var_count).await {
                Ok(image) => {
                    tracing::debug!(user = %turn.user, expression, var_count, "Graph rendered");
                    Step::finish(ResponseAction::text(replies::graph_finish(expression)).with_image(image))
                }
                Err(e) => {
                    tracing::warn!(user = %turn.user, expression, error = %e, "Graph service failed");
                    Step::finish(ResponseAction::text(replies::GRAPH_FAILED))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserId;
    use crate::runtime::testing::flow_fixture;

    async fn run(session: &SessionState, text: &str) -> Step {
        let fx = flow_fixture();
        let user = UserId::from("7");
        let turn = Turn::new(&user, text, session, None, false);
        handle(&turn, &fx.context()).await
    }

    #[tokio::test]
    async fn test_var_count_is_stored_for_the_next_step() {
        let at_var = SessionState::at(Status::VarNum);
        let step = run(&at_var, "2 Переменные").await;
        let next = step.next_session(&at_var);
        assert_eq!(next.status, Status::Func);
        assert_eq!(next.callback_value(callback_key::VAR_NUM), Some("2"));
    }

    #[tokio::test]
    async fn test_wrong_var_count_reprompts() {
        let at_var = SessionState::at(Status::VarNum);
        match run(&at_var, "3 переменные").await {
            Step::Reply(o) => {
                assert_eq!(o.action.text.as_deref(), Some(replies::WRONG_VAR_NUM));
                assert_eq!(o.next, at_var);
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plot_success_attaches_image() {
        let at_func = SessionState::with(Status::Func, callback_key::VAR_NUM, "1");
        match run(&at_func, "sin(x)").await {
            Step::Reply(o) => {
                assert_eq!(o.action.text.as_deref(), Some("График функции sin(x):"));
                assert!(o.action.photo_file.is_some());
                assert!(o.next.is_idle());
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plot_failure_resets() {
        let at_func = SessionState::with(Status::Func, callback_key::VAR_NUM, "2");
        match run(&at_func, "fail").await {
            Step::Reply(o) => {
                assert_eq!(o.action.text.as_deref(), Some(replies::GRAPH_FAILED));
                assert!(o.next.is_idle());
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
