//! Content moderation for taught phrases
//!
//! A taught question must survive three checks before it is accepted: the
//! profanity filter, the reserved vocabulary, and the existing custom
//! answers. "Near" means a Levenshtein distance of at most one edit, which
//! catches typo-squatting of menu labels ("расписани") and of other users'
//! phrases.

use crate::db::DbError;
use crate::runtime::traits::ContentStore;
use crate::services::{ServiceError, TextFilter};
use crate::state_machine::vocabulary;
use thiserror::Error;

pub const MAX_EDIT_DISTANCE: usize = 1;

/// Shorter input is never matched approximately
pub const MIN_FUZZY_CHARS: usize = 3;

/// Two folded phrases are treated as the same phrase
pub fn near_duplicate(a: &str, b: &str) -> bool {
    strsim::levenshtein(a, b) <= MAX_EDIT_DISTANCE
}

/// The candidate nearest to `phrase`, if it is within one edit. Ties go to
/// the first candidate.
pub fn closest<'c>(phrase: &str, candidates: &'c [String]) -> Option<&'c str> {
    if phrase.chars().count() < MIN_FUZZY_CHARS {
        return None;
    }
    candidates
        .iter()
        .map(|c| (strsim::levenshtein(c, phrase), c))
        .filter(|(d, _)| *d <= MAX_EDIT_DISTANCE)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.as_str())
}

/// Built-in phrases a taught answer may not shadow
#[derive(Debug, Clone)]
pub struct ReservedWords {
    words: Vec<String>,
}

impl ReservedWords {
    pub fn builtin() -> Self {
        Self::new(vocabulary::builtin_phrases())
    }

    pub fn new(words: impl IntoIterator<Item = String>) -> Self {
        let mut words: Vec<String> = words.into_iter().map(|w| w.trim().to_lowercase()).collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    /// Folded `phrase` equals or nearly equals a reserved word, or would be
    /// parsed as an admin command.
    pub fn contains(&self, phrase: &str) -> bool {
        vocabulary::ADMIN_PREFIXES.iter().any(|p| phrase.starts_with(p))
            || self.words.iter().any(|w| near_duplicate(w, phrase))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Carries the folded question to store
    Accepted(String),
    Profanity,
    Reserved,
    AlreadyTaught,
}

#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("filter unavailable: {0}")]
    Filter(#[from] ServiceError),
    #[error(transparent)]
    Store(#[from] DbError),
}

/// The filter left `text` untouched
pub async fn passes_filter(filter: &dyn TextFilter, text: &str) -> Result<bool, ServiceError> {
    Ok(filter.filter(text).await? == text)
}

/// Decide whether `text` may become a new custom question
pub async fn review_question(
    text: &str,
    filter: &dyn TextFilter,
    reserved: &ReservedWords,
    content: &dyn ContentStore,
) -> Result<Verdict, ModerationError> {
    if !passes_filter(filter, text).await? {
        return Ok(Verdict::Profanity);
    }

    let question = text.trim().to_lowercase();
    if reserved.contains(&question) {
        return Ok(Verdict::Reserved);
    }
    if content.custom_answer(&question).await?.is_some() {
        return Ok(Verdict::AlreadyTaught);
    }
    if content
        .custom_questions()
        .await?
        .iter()
        .any(|existing| near_duplicate(existing, &question))
    {
        return Ok(Verdict::Reserved);
    }

    Ok(Verdict::Accepted(question))
}
