//! Stateless handlers: canned answers, menus and admin commands
//!
//! All of them answer only from `Any`. Admin commands additionally pass
//! for non-admins, so an ordinary user typing "ban 1" just falls through
//! to the empty sentinel.

use super::traits::{BanStore, ContentStore, ProfileStore};
use crate::db::{DbResult, UserId};
use crate::moderation;
use crate::state_machine::action::{KeyboardName, ResponseAction};
use crate::state_machine::effect::Effect;
use crate::state_machine::event::{FlowContext, Turn};
use crate::state_machine::replies;
use crate::state_machine::transition::Step;
use crate::state_machine::vocabulary;

/// Arguments after an admin prefix, or `None` when `folded` is not that
/// command. The bare command word yields empty arguments.
fn command_args<'t>(folded: &'t str, prefix: &str) -> Option<&'t str> {
    if folded == prefix.trim_end() {
        return Some("");
    }
    folded.strip_prefix(prefix).map(str::trim)
}

/// Original-case words following the first `skip` words
fn raw_words<'t>(turn: &Turn<'t>, skip: usize) -> impl Iterator<Item = &'t str> {
    turn.text.split_whitespace().skip(skip)
}

/// Platform ids are integers; Telegram chat ids may be negative
fn is_user_id(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn admin_args<'t>(turn: &'t Turn<'_>, prefix: &str) -> Option<&'t str> {
    if !turn.is_admin || !turn.session.is_idle() {
        return None;
    }
    command_args(&turn.folded, prefix)
}

/// Command table first, then taught answers
pub async fn static_answer(turn: &Turn<'_>, content: &dyn ContentStore) -> DbResult<Step> {
    if !turn.session.is_idle() {
        return Ok(Step::Pass);
    }
    if let Some(answer) = content.command_answer(&turn.folded).await? {
        tracing::debug!(user = %turn.user, "Command answer");
        return Ok(Step::answer(ResponseAction::text(answer), turn.session));
    }
    if let Some(custom) = content.custom_answer(&turn.folded).await? {
        tracing::debug!(user = %turn.user, owner = %custom.owner, "Custom answer");
        return Ok(Step::answer(ResponseAction::text(custom.answer), turn.session));
    }
    Ok(Step::Pass)
}

/// `who added <phrase>`: who taught a custom answer
pub async fn who_added<S>(turn: &Turn<'_>, store: &S) -> DbResult<Step>
where
    S: ContentStore + ProfileStore,
{
    let Some(phrase) = admin_args(turn, vocabulary::WHO_ADDED) else {
        return Ok(Step::Pass);
    };

    let Some(custom) = store.custom_answer(phrase).await? else {
        return Ok(Step::answer(ResponseAction::text(replies::ANSWER_NOT_SET), turn.session));
    };

    let profile = store.user_profile(&custom.owner).await?;
    let (first, last) = profile
        .as_ref()
        .map_or((None, None), |p| (p.first_name.as_deref(), p.last_name.as_deref()));
    let info = replies::teacher_info(
        first.unwrap_or(replies::UNKNOWN_NAME),
        last.unwrap_or(replies::UNKNOWN_NAME),
        custom.owner.as_str(),
        &custom.answer,
    );
    Ok(Step::answer(ResponseAction::text(info), turn.session))
}

pub async fn photo_answer(turn: &Turn<'_>, content: &dyn ContentStore) -> DbResult<Step> {
    if !turn.session.is_idle() {
        return Ok(Step::Pass);
    }
    Ok(match content.photo_answer(&turn.folded).await? {
        Some(url) => Step::answer(ResponseAction::photo_link(url), turn.session),
        None => Step::Pass,
    })
}

/// Last resort: a taught answer or photo whose phrase is one typo away
pub async fn fuzzy_answer(turn: &Turn<'_>, content: &dyn ContentStore) -> DbResult<Step> {
    if !turn.session.is_idle() {
        return Ok(Step::Pass);
    }

    let taught = content.custom_questions().await?;
    if let Some(question) = moderation::closest(&turn.folded, &taught) {
        if let Some(custom) = content.custom_answer(question).await? {
            tracing::debug!(user = %turn.user, question, "Approximate custom answer");
            return Ok(Step::answer(ResponseAction::text(custom.answer), turn.session));
        }
    }

    let photos = content.photo_questions().await?;
    if let Some(question) = moderation::closest(&turn.folded, &photos) {
        if let Some(url) = content.photo_answer(question).await? {
            tracing::debug!(user = %turn.user, question, "Approximate photo answer");
            return Ok(Step::answer(ResponseAction::photo_link(url), turn.session));
        }
    }

    Ok(Step::Pass)
}

/// Menu switching and the "other materials" link
pub fn menu_navigation(turn: &Turn<'_>, ctx: &FlowContext<'_>, other_materials: Option<&str>) -> Step {
    if !turn.session.is_idle() {
        return Step::Pass;
    }
    let keyboard = |name: KeyboardName| ctx.services.keyboards.render(&name);

    let action = match turn.folded.as_str() {
        vocabulary::OTHER_MATERIALS => match other_materials {
            Some(link) => ResponseAction::text(link),
            None => {
                tracing::warn!("Other materials requested but not configured");
                ResponseAction::text(replies::LINKS_FAILED)
            }
        },
        vocabulary::SECOND_MENU => {
            ResponseAction::text(replies::OTHER_FUNC).with_default_keyboard(keyboard(KeyboardName::OtherMenu))
        }
        vocabulary::RETURN_MAIN_MENU => {
            ResponseAction::text(replies::MAIN_MENU).with_default_keyboard(keyboard(KeyboardName::MainMenu))
        }
        _ => return Step::Pass,
    };
    Step::answer(action, turn.session)
}

/// `ban <id> [reason]`
pub fn ban(turn: &Turn<'_>) -> Step {
    if admin_args(turn, vocabulary::BAN).is_none() {
        return Step::Pass;
    }
    let mut words = raw_words(turn, 1);
    let Some(target) = words.next().filter(|w| is_user_id(w)) else {
        return Step::answer(ResponseAction::text(replies::BAN_USAGE), turn.session);
    };
    let reason = words.collect::<Vec<_>>().join(" ");

    tracing::info!(admin = %turn.user, target, reason = %reason, "Banning user");
    Step::answer(ResponseAction::text(replies::BANNED), turn.session).with_effect(Effect::Ban {
        user: UserId::from(target),
        reason,
    })
}

/// `unban <id>`
pub async fn unban(turn: &Turn<'_>, bans: &dyn BanStore) -> DbResult<Step> {
    if admin_args(turn, vocabulary::UNBAN).is_none() {
        return Ok(Step::Pass);
    }
    let Some(target) = raw_words(turn, 1).next().filter(|w| is_user_id(w)).map(UserId::from) else {
        return Ok(Step::answer(ResponseAction::text(replies::UNBAN_USAGE), turn.session));
    };

    if bans.ban_entry(&target).await?.is_none() {
        return Ok(Step::answer(ResponseAction::text(replies::WAS_NOT_BANNED), turn.session));
    }
    tracing::info!(admin = %turn.user, target = %target, "Unbanning user");
    Ok(Step::answer(ResponseAction::text(replies::UNBANNED), turn.session)
        .with_effect(Effect::Unban { user: target }))
}

/// `delete <phrase>`: remove a taught answer
pub async fn delete_custom(turn: &Turn<'_>, content: &dyn ContentStore) -> DbResult<Step> {
    let Some(phrase) = admin_args(turn, vocabulary::DELETE) else {
        return Ok(Step::Pass);
    };
    if phrase.is_empty() || content.custom_answer(phrase).await?.is_none() {
        return Ok(Step::answer(ResponseAction::text(replies::ANSWER_NOT_SET), turn.session));
    }
    tracing::info!(admin = %turn.user, phrase, "Deleting custom answer");
    Ok(
        Step::answer(ResponseAction::text(replies::custom_deleted(phrase)), turn.session).with_effect(
            Effect::DeleteCustomAnswer {
                question: phrase.to_string(),
            },
        ),
    )
}
