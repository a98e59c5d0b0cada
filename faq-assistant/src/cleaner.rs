//! Post-processing of raw model output into a short user-facing answer.
//!
//! Best effort only: malformed output can still come through, but the result
//! is never empty and never longer than [`MAX_ANSWER_CHARS`] characters.

use crate::replies;

/// Hard cap on answer length, in characters.
pub const MAX_ANSWER_CHARS: usize = 200;

/// Markers where the model starts inventing a follow-up question.
pub const RESTART_MARKERS: [&str; 2] = ["Pertanyaan:", "Question:"];

/// Cleans raw generated text.
///
/// 1. Cut at the earliest restart marker.
/// 2. Keep the first paragraph.
/// 3. Over the cap: keep the first `". "` sentence plus a period, falling
///    back to a hard cut at the cap.
/// 4. Empty: the fixed "information not found" reply.
pub fn clean(raw: &str) -> String {
    let text = cut_at_restart(raw.trim());
    let text = first_paragraph(text);
    let text = enforce_length(text);

    if text.is_empty() {
        replies::NOT_FOUND.to_string()
    } else {
        text
    }
}

fn cut_at_restart(text: &str) -> &str {
    let cut = RESTART_MARKERS
        .iter()
        .filter_map(|marker| text.find(marker))
        .min();
    match cut {
        Some(idx) => text[..idx].trim(),
        None => text,
    }
}

fn first_paragraph(text: &str) -> &str {
    match text.split_once("\n\n") {
        Some((head, _)) => head.trim(),
        None => text,
    }
}

fn enforce_length(text: &str) -> String {
    if text.chars().count() <= MAX_ANSWER_CHARS {
        return text.to_string();
    }

    if let Some((sentence, _)) = text.split_once(". ") {
        let candidate = format!("{sentence}.");
        if candidate.chars().count() <= MAX_ANSWER_CHARS {
            return candidate;
        }
    }

    truncate_chars(text, MAX_ANSWER_CHARS).trim_end().to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
