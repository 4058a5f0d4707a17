//! Lecture links: `Any -> Link -> Any`

use super::action::{KeyboardName, ResponseAction};
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::Status;
use super::transition::{FlowSpec, Guard, Mismatch, Step};
use super::vocabulary;

pub const FLOW: FlowSpec = FlowSpec {
    name: "links",
    trigger: vocabulary::LECTURES,
    entry: Status::Link,
    interior: &[Status::Link],
};

pub async fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    let guard = FLOW.guard(turn);
    if guard == Guard::Pass {
        return Step::Pass;
    }

    // Registration runs first, so a course is always known here unless the
    // row was removed underneath us.
    let Some((course, _)) = turn.course_and_group() else {
        tracing::warn!(user = %turn.user, "Links requested without registration");
        return Mismatch::SilentAbort.apply(turn.session);
    };

    if guard == Guard::Enter {
        return FLOW.enter(
            ResponseAction::text(replies::CHOOSE_SUBJECT)
                .with_keyboard(ctx.services.keyboards.render(&KeyboardName::Lectures(course.to_string()))),
        );
    }

    let subjects = match ctx.services.links.subjects(course).await {
        Ok(subjects) => subjects,
        Err(e) => {
            tracing::warn!(user = %turn.user, course, error = %e, "Link source failed");
            return Step::finish(ResponseAction::text(replies::LINKS_FAILED));
        }
    };

    match subjects.into_iter().find(|s| s.subject == turn.folded) {
        Some(found) => {
            tracing::debug!(user = %turn.user, subject = %found.subject, "Returning link");
            Step::finish(ResponseAction::text(found.link))
        }
        None => {
            tracing::debug!(user = %turn.user, text = %turn.folded, "Unknown subject, leaving links");
            Mismatch::SilentAbort.apply(turn.session)
        }
    }
}
