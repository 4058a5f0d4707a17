//! Registration flow: `Any -> RegCourse -> RegGroup -> Any`
//!
//! Has absolute priority. A user without a complete registration is pulled
//! into this flow whatever they type, and input that doesn't fit re-prompts
//! rather than aborting, so the only way out is to finish.

use super::action::{KeyboardName, ResponseAction};
use super::effect::Effect;
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::{callback_key, SessionState, Status};
use super::transition::{FlowSpec, Guard, Mismatch, Step};
use super::vocabulary;
use crate::db::RegistrationInfo;

pub const FLOW: FlowSpec = FlowSpec {
    name: "registration",
    trigger: vocabulary::CHANGE_REG_INFO,
    entry: Status::RegCourse,
    interior: &[Status::RegCourse, Status::RegGroup],
};

pub fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    let keyboard = |name: KeyboardName| ctx.services.keyboards.render(&name);
    let registered = turn.registration.is_some_and(RegistrationInfo::is_complete);

    if !registered && !turn.session.status.is_registration() {
        tracing::debug!(user = %turn.user, "Registration missing, forcing flow");
        return FLOW.enter(
            ResponseAction::text(replies::CHOOSE_COURSE_GREETING)
                .with_keyboard(keyboard(KeyboardName::Courses)),
        );
    }

    match FLOW.guard(turn) {
        Guard::Pass => Step::Pass,

        Guard::Enter => FLOW.enter(
            ResponseAction::text(replies::CHOOSE_COURSE_CHANGING)
                .with_keyboard(keyboard(KeyboardName::Courses)),
        ),

        Guard::Interior(Status::RegCourse) => {
            let course = turn.folded.as_str();
            if !vocabulary::is_course(course) {
                return Mismatch::Reprompt(
                    ResponseAction::text(replies::CHOOSE_COURSE_TO_CONTINUE)
                        .with_keyboard(keyboard(KeyboardName::Courses)),
                )
                .apply(turn.session);
            }
            Step::reply(
                ResponseAction::text(replies::CHOOSE_GROUP)
                    .with_keyboard(keyboard(KeyboardName::Groups(course.to_string()))),
                SessionState::with(Status::RegGroup, callback_key::COURSE_NAME, course),
            )
        }

        Guard::Interior(_) => {
            let Some(course) = turn
                .session
                .callback_value(callback_key::COURSE_NAME)
                .filter(|c| vocabulary::is_course(c))
            else {
                // Callback lost (e.g. edited row); start over from the course.
                tracing::warn!(user = %turn.user, "Group step without a stored course");
                return Step::reply(
                    ResponseAction::text(replies::CHOOSE_COURSE_TO_CONTINUE)
                        .with_keyboard(keyboard(KeyboardName::Courses)),
                    SessionState::at(Status::RegCourse),
                );
            };

            let group = turn.folded.as_str();
            if !vocabulary::is_group_of(course, group) {
                return Mismatch::Reprompt(
                    ResponseAction::text(replies::CHOOSE_GROUP_TO_CONTINUE)
                        .with_keyboard(keyboard(KeyboardName::Groups(course.to_string()))),
                )
                .apply(turn.session);
            }

            tracing::info!(user = %turn.user, course, group, "Registration complete");
            Step::finish(ResponseAction::text(replies::REG_FINISH))
                .with_effect(Effect::save_registration(course, group))
        }
    }
}
