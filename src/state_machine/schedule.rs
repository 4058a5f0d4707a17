//! Weekly schedule: `Any -> Schedule -> Any`

use super::action::{KeyboardName, ResponseAction};
use super::event::{FlowContext, Turn};
use super::replies;
use super::state::Status;
use super::transition::{FlowSpec, Guard, Mismatch, Step};
use super::vocabulary;
use crate::services::ScheduleSlot;
use std::fmt::Write as _;

pub const FLOW: FlowSpec = FlowSpec {
    name: "schedule",
    trigger: vocabulary::SCHEDULE,
    entry: Status::Schedule,
    interior: &[Status::Schedule],
};

/// Fields of a filled cell: subject, kind, teacher, room, format
const CELL_FIELDS: usize = 5;

pub async fn handle(turn: &Turn<'_>, ctx: &FlowContext<'_>) -> Step {
    match FLOW.guard(turn) {
        Guard::Pass => Step::Pass,

        Guard::Enter => FLOW.enter(
            ResponseAction::text(replies::CHOOSE_DAY)
                .with_keyboard(ctx.services.keyboards.render(&KeyboardName::Days)),
        ),

        Guard::Interior(_) => {
            let day = turn.folded.as_str();
            if !vocabulary::is_day(day) {
                tracing::debug!(user = %turn.user, text = day, "Not a day, leaving schedule");
                return Mismatch::SilentAbort.apply(turn.session);
            }
            let Some((course, group)) = turn.course_and_group() else {
                tracing::warn!(user = %turn.user, "Schedule requested without registration");
                return Mismatch::SilentAbort.apply(turn.session);
            };

            match ctx.services.schedule.day(course, group, day).await {
                Ok(slots) => Step::finish(ResponseAction::text(format_day(day, &slots))),
                Err(e) => {
                    tracing::warn!(user = %turn.user, course, group, error = %e, "Schedule source failed");
                    Step::finish(ResponseAction::text(replies::SCHEDULE_FAILED))
                }
            }
        }
    }
}

/// Render one day of the timetable
pub fn format_day(day: &str, slots: &[ScheduleSlot]) -> String {
    let mut out = format!("Расписание на {}\n", vocabulary::day_accusative(day));

    for slot in slots {
        let _ = write!(out, "\n⌚{}⌚\n", slot.time);

        let Some(cell) = slot.cell.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
            out.push_str(replies::NO_CLASS);
            out.push('\n');
            continue;
        };

        let fields: Vec<&str> = cell.split(';').map(str::trim).collect();
        match fields.as_slice() {
            [subject, kind, teacher, room, form] => {
                let _ = write!(
                    out,
                    "{subject}\n{kind}\nПреподаватель: {teacher}\nАудитория: {room}\nФорма проведения: {form}\n"
                );
            }
            _ => {
                tracing::warn!(
                    day,
                    time = %slot.time,
                    fields = fields.len(),
                    expected = CELL_FIELDS,
                    "Malformed schedule cell"
                );
                out.push_str(replies::CELL_ERROR);
                out.push('\n');
            }
        }
    }

    out
}
