//! crates/medprep_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// How the user wants answers framed.
///
/// `Exam` asks the provider for high-yield, mnemonic-heavy answers;
/// `Conceptual` asks for mechanism depth. The mode is stored alongside each
/// query so cache lookups stay partitioned by framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyMode {
    Exam,
    Conceptual,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Exam => "exam",
            StudyMode::Conceptual => "conceptual",
        }
    }

    /// Parses a mode string, defaulting to `Exam` for anything unrecognized.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "conceptual" => StudyMode::Conceptual,
            _ => StudyMode::Exam,
        }
    }
}

/// Classified difficulty of an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "basic" => Difficulty::Basic,
            "advanced" => Difficulty::Advanced,
            _ => Difficulty::Intermediate,
        }
    }
}

/// A textbook reference attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source: String,
    pub chapter: Option<String>,
    pub page: Option<String>,
}

/// The structured answer shape every provider reply is normalized into.
#[derive(Debug, Clone)]
pub struct ProviderAnswer {
    pub answer: String,
    pub references: Vec<Reference>,
    pub citations: Vec<String>,
    pub key_points: Vec<String>,
    pub clinical_relevance: String,
}

/// What the Query Cache Gate hands back to the caller.
///
/// `cached` is true when the answer was served from a stored record without
/// a provider call. `error` is true only for the fallback answer produced
/// when the provider was unavailable; callers cannot otherwise tell the
/// apology apart from a real answer.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub references: Vec<Reference>,
    pub citations: Vec<String>,
    pub key_points: Vec<String>,
    pub clinical_relevance: String,
    pub subject: String,
    pub syllabus: String,
    pub difficulty: Difficulty,
    pub cached: bool,
    pub error: bool,
}

/// A persisted question/answer record, scoped to one user.
///
/// Never mutated after creation. Records with `fallback` set hold the
/// apology answer from a provider outage and are excluded from cache
/// lookups.
#[derive(Debug, Clone)]
pub struct StoredQuery {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub subject: String,
    pub syllabus: String,
    pub study_mode: StudyMode,
    pub references: Vec<Reference>,
    pub citations: Vec<String>,
    pub key_points: Vec<String>,
    pub clinical_relevance: String,
    pub difficulty: Difficulty,
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
}

/// The fields of a query record the gate asks the store to persist.
/// The store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewQuery {
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub subject: String,
    pub syllabus: String,
    pub study_mode: StudyMode,
    pub references: Vec<Reference>,
    pub citations: Vec<String>,
    pub key_points: Vec<String>,
    pub clinical_relevance: String,
    pub difficulty: Difficulty,
    pub fallback: bool,
}

/// One calendar day of a study plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub topics: Vec<String>,
}

/// A generated day-by-day topic allocation.
///
/// Immutable once returned; a new generation replaces the previous plan
/// wholesale. `total_topics` counts the selected-subject topics before the
/// weak/regular dedup, matching the source behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPlan {
    pub exam_date: NaiveDate,
    pub days_remaining: u32,
    pub daily_plan: Vec<DayEntry>,
    pub total_topics: usize,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
