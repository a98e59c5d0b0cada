//! Keyword matcher: picks at most two FAQ entries for a query.
//!
//! Matching is order-sensitive on purpose: the first two relevant entries in
//! store order win, which bounds prompt size regardless of how many entries
//! would match.

use crate::store::{FaqEntry, FaqStore};

/// Small-talk inputs answered with the greeting, never sent to the model.
pub const GREETINGS: [&str; 8] = ["halo", "hai", "hi", "hello", "hey", "test", "tes", "ping"];

/// Normalized queries shorter than this (in characters) count as small talk.
pub const MIN_QUERY_CHARS: usize = 3;

/// Cap on entries fed into one prompt.
pub const MAX_MATCHES: usize = 2;

/// What the matcher decided for a query.
#[derive(Debug, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// Greeting or too short: reply with the canned greeting.
    Greeting,
    /// No keyword hit: reply with the canned "not found" message.
    NoMatch,
    /// One or two entries, in store order.
    Matched(Vec<&'a FaqEntry>),
}

/// Lowercases and trims a query.
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Classifies `query` against `store`.
pub fn match_query<'a>(query: &str, store: &'a FaqStore) -> MatchOutcome<'a> {
    let normalized = normalize(query);

    if GREETINGS.contains(&normalized.as_str()) || normalized.chars().count() < MIN_QUERY_CHARS {
        return MatchOutcome::Greeting;
    }

    let matches: Vec<&FaqEntry> = store
        .entries()
        .iter()
        .filter(|entry| entry.is_relevant(&normalized))
        .take(MAX_MATCHES)
        .collect();

    if matches.is_empty() {
        MatchOutcome::NoMatch
    } else {
        MatchOutcome::Matched(matches)
    }
}
