//! Prompt builder: instruction line, matched FAQ pairs, then the user question.

use crate::store::FaqEntry;

/// Instruction that opens every prompt.
pub const SYSTEM_INSTRUCTION: &str =
    "Kamu adalah asisten FAQ perusahaan. Jawab pertanyaan berikut berdasarkan informasi FAQ.";

/// Label preceding a question in the prompt.
pub const QUESTION_LABEL: &str = "Pertanyaan:";

/// Label preceding an answer; the prompt ends with it, left empty.
pub const ANSWER_LABEL: &str = "Jawaban:";

/// Builds the generation prompt.
///
/// Layout:
///
/// ```text
/// <instruction>
///
/// Pertanyaan: <faq question>
/// Jawaban: <faq answer>
///
/// Pertanyaan: <user question>
/// Jawaban:
/// ```
///
/// `question` is used verbatim (trimmed, original casing). Entries keep
/// match order.
///
/// # Example
/// ```
/// # use faq_assistant::{prompt::build_prompt, store::FaqEntry};
/// let entry = FaqEntry::new("Jam kerja?", "08:00-17:00.", ["jam kerja"]);
/// let prompt = build_prompt("Berapa jam kerja?", &[&entry]);
/// assert!(prompt.ends_with("Pertanyaan: Berapa jam kerja?\nJawaban:"));
/// ```
pub fn build_prompt(question: &str, matches: &[&FaqEntry]) -> String {
    let mut out = String::new();
    out.push_str(SYSTEM_INSTRUCTION);
    out.push_str("\n\n");

    for entry in matches {
        out.push_str(&format!(
            "{QUESTION_LABEL} {}\n{ANSWER_LABEL} {}\n\n",
            entry.question, entry.answer
        ));
    }

    out.push_str(&format!(
        "\n{QUESTION_LABEL} {}\n{ANSWER_LABEL}",
        question.trim()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_exact_template() {
        let a = FaqEntry::new("Jam kerja?", "Senin-Jumat 08:00-17:00.", ["jam kerja"]);
        let b = FaqEntry::new("Lembur?", "Dibayar per jam.", ["lembur"]);

        let prompt = build_prompt("  Berapa Jam Kerja?  ", &[&a, &b]);

        let expected = "Kamu adalah asisten FAQ perusahaan. Jawab pertanyaan berikut berdasarkan informasi FAQ.\n\
\n\
Pertanyaan: Jam kerja?\n\
Jawaban: Senin-Jumat 08:00-17:00.\n\
\n\
Pertanyaan: Lembur?\n\
Jawaban: Dibayar per jam.\n\
\n\
\n\
Pertanyaan: Berapa Jam Kerja?\n\
Jawaban:";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn keeps_match_order() {
        let a = FaqEntry::new("A?", "a.", ["a"]);
        let b = FaqEntry::new("B?", "b.", ["b"]);

        let prompt = build_prompt("q", &[&b, &a]);
        let pos_b = prompt.find("Pertanyaan: B?").unwrap();
        let pos_a = prompt.find("Pertanyaan: A?").unwrap();
        assert!(pos_b < pos_a);
    }

    #[test]
    fn ends_with_empty_answer_cue() {
        let prompt = build_prompt("Apa itu BPJS?", &[]);
        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.ends_with("Jawaban:"));
        assert!(!prompt.ends_with("Jawaban: "));
    }
}
