//! Profanity filter backed by a word list

use super::{ServiceError, TextFilter};
use async_trait::async_trait;
use regex::{Captures, Regex, RegexBuilder};
use std::path::Path;

/// Masks listed words (whole words, any case) with `*`
#[derive(Debug, Clone)]
pub struct WordListFilter {
    pattern: Option<Regex>,
}

impl WordListFilter {
    /// One word per line; blank lines and `#` comments are skipped
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_words(
            raw.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Result<Self, ServiceError> {
        let alternatives: Vec<String> = words.into_iter().map(regex::escape).collect();
        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| ServiceError::parse(format!("Bad filter word list: {e}")))?;
        Ok(Self { pattern: Some(pattern) })
    }

    pub fn mask(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(text, |caps: &Captures<'_>| "*".repeat(caps[0].chars().count()))
                .into_owned(),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl TextFilter for WordListFilter {
    async fn filter(&self, text: &str) -> Result<String, ServiceError> {
        Ok(self.mask(text))
    }
}
