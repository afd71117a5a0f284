//! crates/medprep_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing
//! the core to be independent of specific external implementations like
//! databases or AI providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    NewQuery, ProviderAnswer, StoredQuery, StudyMode, StudyPlan, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Filters for the paged query-history listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub subject: Option<String>,
    pub syllabus: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Study Plan Management ---

    /// Persists a freshly generated plan, replacing the user's previous
    /// plan (and its completion records) wholesale.
    async fn replace_plan(&self, user_id: Uuid, plan: &StudyPlan) -> PortResult<()>;

    /// The user's current plan with its per-topic completion flags.
    async fn get_plan(&self, user_id: Uuid) -> PortResult<(StudyPlan, HashMap<String, bool>)>;

    /// Flips the completion flag for one topic of the user's current plan,
    /// creating the record on first reference. Returns the new flag.
    async fn toggle_topic(&self, user_id: Uuid, topic: &str) -> PortResult<bool>;

    // --- Stored Query Management ---

    async fn insert_query(&self, query: NewQuery) -> PortResult<StoredQuery>;

    /// Looks up the most recent non-fallback record for this user whose
    /// subject and syllabus match and whose question text contains
    /// `question_prefix` (already lowercased by the caller),
    /// case-insensitively, created at or after `since`. Returns at most
    /// one record, newest first.
    async fn find_recent_query(
        &self,
        user_id: Uuid,
        subject: &str,
        syllabus: &str,
        question_prefix: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Option<StoredQuery>>;

    /// Paged listing of a user's queries, newest first. Returns the page
    /// and the total row count for the filter.
    async fn list_queries(
        &self,
        user_id: Uuid,
        filter: &HistoryFilter,
    ) -> PortResult<(Vec<StoredQuery>, i64)>;
}

//=========================================================================================
// AI Provider Port
//=========================================================================================

#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Produces a structured answer for a medical question, framed by the
    /// syllabus, subject and study mode. Implementations must normalize
    /// unstructured provider output into the structured shape themselves.
    async fn generate_answer(
        &self,
        question: &str,
        syllabus: &str,
        subject: &str,
        mode: StudyMode,
    ) -> PortResult<ProviderAnswer>;
}
