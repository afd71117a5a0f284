//! crates/medprep_core/src/answer.rs
//!
//! The query gate in front of the AI provider: serve a recent equivalent
//! answer from the store when one exists, otherwise call the provider and
//! persist what came back. Provider failures degrade to a canned fallback
//! answer instead of failing the request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classify::{classify_difficulty, detect_subject};
use crate::domain::{AnswerResult, NewQuery, StoredQuery, StudyMode};
use crate::ports::{AnswerProvider, DatabaseService, PortResult};

/// How many leading characters of the question take part in the cache
/// probe. Equivalence is a case-insensitive substring match on this
/// prefix, nothing smarter.
const CACHE_PREFIX_CHARS: usize = 50;

const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't generate an answer for this question \
right now. Please try again in a few moments, or consult your standard textbook for this topic.";

const FALLBACK_CLINICAL_RELEVANCE: &str = "Clinical correlation could not be generated for \
this answer. Please verify against a standard reference before applying it clinically.";

/// Serves answers, preferring fresh stored ones over provider calls.
pub struct QueryGate {
    db: Arc<dyn DatabaseService>,
    provider: Arc<dyn AnswerProvider>,
    freshness_window: Duration,
}

impl QueryGate {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        provider: Arc<dyn AnswerProvider>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            db,
            provider,
            freshness_window,
        }
    }

    /// Answers a question for one user.
    ///
    /// When `subject` is omitted it is keyword-detected from the question.
    /// A stored record is reused while `now - created_at` is inside the
    /// freshness window; otherwise the provider is called and the result
    /// persisted. A provider failure never propagates: the caller gets the
    /// fallback answer with `error` set, and the record is stored flagged
    /// as a fallback so it can never be served as a cached answer later.
    /// Persistence failures do propagate.
    pub async fn answer(
        &self,
        user_id: Uuid,
        question: &str,
        subject: Option<&str>,
        syllabus: &str,
        mode: StudyMode,
        now: DateTime<Utc>,
    ) -> PortResult<AnswerResult> {
        let subject = match subject {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => detect_subject(question).to_string(),
        };

        let prefix = cache_prefix(question);
        let since = now - self.freshness_window;
        if let Some(hit) = self
            .db
            .find_recent_query(user_id, &subject, syllabus, &prefix, since)
            .await?
        {
            info!(%user_id, %subject, query_id = %hit.id, "serving cached answer");
            return Ok(result_from_stored(hit));
        }

        match self
            .provider
            .generate_answer(question, syllabus, &subject, mode)
            .await
        {
            Ok(provided) => {
                let difficulty = classify_difficulty(question, &provided.answer);
                let stored = self
                    .db
                    .insert_query(NewQuery {
                        user_id,
                        question: question.to_string(),
                        answer: provided.answer,
                        subject,
                        syllabus: syllabus.to_string(),
                        study_mode: mode,
                        references: provided.references,
                        citations: provided.citations,
                        key_points: provided.key_points,
                        clinical_relevance: provided.clinical_relevance,
                        difficulty,
                        fallback: false,
                    })
                    .await?;
                info!(%user_id, query_id = %stored.id, difficulty = difficulty.as_str(), "stored provider answer");
                Ok(result_from_fresh(stored))
            }
            Err(e) => {
                error!(%user_id, error = %e, "provider unavailable; returning fallback answer");
                let difficulty = classify_difficulty(question, FALLBACK_ANSWER);
                let stored = self
                    .db
                    .insert_query(NewQuery {
                        user_id,
                        question: question.to_string(),
                        answer: FALLBACK_ANSWER.to_string(),
                        subject: subject.clone(),
                        syllabus: syllabus.to_string(),
                        study_mode: mode,
                        references: Vec::new(),
                        citations: Vec::new(),
                        key_points: Vec::new(),
                        clinical_relevance: FALLBACK_CLINICAL_RELEVANCE.to_string(),
                        difficulty,
                        fallback: true,
                    })
                    .await;
                if let Err(e) = &stored {
                    // The fallback row is history bookkeeping; losing it is
                    // not worth failing an already-degraded request.
                    warn!(%user_id, error = %e, "could not record fallback answer");
                }

                Ok(AnswerResult {
                    answer: FALLBACK_ANSWER.to_string(),
                    references: Vec::new(),
                    citations: Vec::new(),
                    key_points: Vec::new(),
                    clinical_relevance: FALLBACK_CLINICAL_RELEVANCE.to_string(),
                    subject,
                    syllabus: syllabus.to_string(),
                    difficulty,
                    cached: false,
                    error: true,
                })
            }
        }
    }
}

/// The lowercased leading slice of the question used for the cache probe.
pub fn cache_prefix(question: &str) -> String {
    question
        .chars()
        .take(CACHE_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}

fn result_from_stored(record: StoredQuery) -> AnswerResult {
    AnswerResult {
        answer: record.answer,
        references: record.references,
        citations: record.citations,
        key_points: record.key_points,
        clinical_relevance: record.clinical_relevance,
        subject: record.subject,
        syllabus: record.syllabus,
        difficulty: record.difficulty,
        cached: true,
        error: false,
    }
}

fn result_from_fresh(record: StoredQuery) -> AnswerResult {
    AnswerResult {
        answer: record.answer,
        references: record.references,
        citations: record.citations,
        key_points: record.key_points,
        clinical_relevance: record.clinical_relevance,
        subject: record.subject,
        syllabus: record.syllabus,
        difficulty: record.difficulty,
        cached: false,
        error: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_prefix_truncates_by_characters_not_bytes() {
        let long = "å".repeat(80);
        let prefix = cache_prefix(&long);
        assert_eq!(prefix.chars().count(), 50);
    }

    #[test]
    fn cache_prefix_lowercases() {
        assert_eq!(cache_prefix("What Is SHOCK?"), "what is shock?");
    }
}
