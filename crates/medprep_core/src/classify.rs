//! crates/medprep_core/src/classify.rs
//!
//! Keyword heuristics over question/answer text: subject auto-detection
//! when the caller omits a subject, and difficulty classification for
//! every stored answer.

use crate::domain::Difficulty;

/// Subject detection table. First matching subject in declaration order
/// wins.
const SUBJECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Anatomy",
        &["anatomy", "bone", "muscle", "nerve", "artery", "vein", "joint", "ligament"],
    ),
    (
        "Physiology",
        &["physiology", "function", "hormone", "regulation", "homeostasis", "reflex"],
    ),
    (
        "Pathology",
        &["pathology", "disease", "tumor", "tumour", "cancer", "inflammation", "necrosis"],
    ),
    (
        "Pharmacology",
        &["drug", "pharmacology", "dose", "dosage", "side effect", "contraindication"],
    ),
    (
        "Medicine",
        &["treatment", "diagnosis", "clinical", "symptom", "syndrome", "management"],
    ),
    (
        "Surgery",
        &["surgery", "surgical", "operation", "incision", "suture", "postoperative"],
    ),
];

const DEFAULT_SUBJECT: &str = "General Medicine";

/// Terms whose presence in the question or answer marks a complex topic.
/// Each keyword counts once no matter how often it appears.
const COMPLEXITY_KEYWORDS: &[&str] = &["pathophysiology", "mechanism", "differential", "etiology"];

const BASIC_QUESTION_LEN: usize = 50;
const BASIC_ANSWER_LEN: usize = 500;
const ADVANCED_ANSWER_LEN: usize = 1000;

/// Guesses the subject of a question from its wording. Used only when the
/// caller did not name one.
pub fn detect_subject(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    for (subject, keywords) in SUBJECT_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return subject;
        }
    }
    DEFAULT_SUBJECT
}

/// Classifies an exchange, independent of anything the provider claimed.
pub fn classify_difficulty(question: &str, answer: &str) -> Difficulty {
    let question_lower = question.to_lowercase();
    let answer_lower = answer.to_lowercase();
    let hits = COMPLEXITY_KEYWORDS
        .iter()
        .filter(|k| question_lower.contains(*k) || answer_lower.contains(*k))
        .count();

    if question.len() < BASIC_QUESTION_LEN && answer.len() < BASIC_ANSWER_LEN && hits == 0 {
        Difficulty::Basic
    } else if hits >= 2 || answer.len() > ADVANCED_ANSWER_LEN {
        Difficulty::Advanced
    } else {
        Difficulty::Intermediate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_plain_exchange_is_basic() {
        let question = "What is the femur?"; // 18 chars
        let answer = "The femur is the thigh bone, the longest bone in the human body.";
        assert_eq!(classify_difficulty(question, answer), Difficulty::Basic);
    }

    #[test]
    fn two_keywords_and_long_answer_is_advanced() {
        let question = "Explain the pathophysiology and etiology of heart failure";
        let answer = "x".repeat(1200);
        assert_eq!(classify_difficulty(question, &answer), Difficulty::Advanced);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let question = "mechanism mechanism mechanism?";
        let answer = "short answer";
        // One distinct keyword, short texts: not basic (hit count > 0),
        // not advanced (only one keyword).
        assert_eq!(classify_difficulty(question, answer), Difficulty::Intermediate);
    }

    #[test]
    fn long_answer_alone_is_advanced() {
        let answer = "y".repeat(1001);
        assert_eq!(classify_difficulty("short?", &answer), Difficulty::Advanced);
    }

    #[test]
    fn detects_subject_by_declaration_order() {
        // "artery" (Anatomy) appears after "drug" (Pharmacology) in the
        // question, but Anatomy is declared first in the table.
        assert_eq!(detect_subject("Which drug dilates the renal artery?"), "Anatomy");
        assert_eq!(detect_subject("What is the dose of amoxicillin?"), "Pharmacology");
        assert_eq!(detect_subject("DESCRIBE THE SUTURE technique"), "Surgery");
    }

    #[test]
    fn falls_back_to_general_medicine() {
        assert_eq!(detect_subject("Tell me about vitamin folklore"), "General Medicine");
    }
}
