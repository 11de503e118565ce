//! Vocabulary overlap scoring
//!
//! The score is asymmetric: overlap is measured against the *user*
//! document's vocabulary, so a short user text fully contained in a long
//! target scores 100 no matter how large the target is.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::normalize::tokenize;

/// A set of case-folded words. Iterates in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize and case-fold without any filtering.
    pub fn from_text(text: &str) -> Self {
        tokenize(text).into_iter().map(|t| t.to_lowercase()).collect()
    }

    pub fn intersection(&self, other: &TokenSet) -> TokenSet {
        self.0.intersection(&other.0).cloned().collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        self.0.insert(token.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TokenSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of comparing a user text against a target text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapResult {
    /// Shared vocabulary as a share of the user vocabulary, 0 to 100
    pub percentage: f64,
    pub shared_tokens: TokenSet,
    pub user_vocabulary: usize,
    pub target_vocabulary: usize,
}

impl OverlapResult {
    /// Percentage with one decimal place, e.g. `"42.5%"`
    pub fn label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

/// Score two (normalized) texts.
///
/// An empty user vocabulary scores 0 rather than dividing by zero.
pub fn score(user_text: &str, target_text: &str) -> OverlapResult {
    let user_tokens = TokenSet::from_text(user_text);
    let target_tokens = TokenSet::from_text(target_text);
    score_sets(&user_tokens, &target_tokens)
}

pub fn score_sets(user_tokens: &TokenSet, target_tokens: &TokenSet) -> OverlapResult {
    let shared_tokens = user_tokens.intersection(target_tokens);

    let percentage = if user_tokens.is_empty() {
        0.0
    } else {
        shared_tokens.len() as f64 / user_tokens.len() as f64 * 100.0
    };

    OverlapResult {
        percentage,
        shared_tokens,
        user_vocabulary: user_tokens.len(),
        target_vocabulary: target_tokens.len(),
    }
}
