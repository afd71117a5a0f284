//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `DatabaseService` port from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use medprep_core::domain::{
    DayEntry, Difficulty, NewQuery, Reference, StoredQuery, StudyMode, StudyPlan, User,
    UserCredentials,
};
use medprep_core::ports::{DatabaseService, HistoryFilter, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Escapes LIKE metacharacters so the cache-probe prefix is matched
/// literally.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

/// JSON shape of one reference inside the `refs` JSONB column.
#[derive(Serialize, Deserialize)]
struct ReferenceJson {
    source: String,
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    page: Option<String>,
}

impl ReferenceJson {
    fn to_domain(self) -> Reference {
        Reference {
            source: self.source,
            chapter: self.chapter,
            page: self.page,
        }
    }

    fn from_domain(r: &Reference) -> Self {
        Self {
            source: r.source.clone(),
            chapter: r.chapter.clone(),
            page: r.page.clone(),
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct PlanRecord {
    id: Uuid,
    exam_date: NaiveDate,
    days_remaining: i32,
    total_topics: i32,
}

#[derive(FromRow)]
struct PlanDayRecord {
    day_date: NaiveDate,
    topics: Vec<String>,
}

impl PlanDayRecord {
    fn to_domain(self) -> DayEntry {
        DayEntry {
            date: self.day_date,
            topics: self.topics,
        }
    }
}

#[derive(FromRow)]
struct QueryRecord {
    id: Uuid,
    user_id: Uuid,
    question: String,
    answer: String,
    subject: String,
    syllabus: String,
    study_mode: String,
    refs: serde_json::Value,
    citations: Vec<String>,
    key_points: Vec<String>,
    clinical_relevance: String,
    difficulty: String,
    fallback: bool,
    created_at: DateTime<Utc>,
}

impl QueryRecord {
    fn to_domain(self) -> StoredQuery {
        let references = serde_json::from_value::<Vec<ReferenceJson>>(self.refs)
            .unwrap_or_default()
            .into_iter()
            .map(ReferenceJson::to_domain)
            .collect();
        StoredQuery {
            id: self.id,
            user_id: self.user_id,
            question: self.question,
            answer: self.answer,
            subject: self.subject,
            syllabus: self.syllabus,
            study_mode: StudyMode::parse(&self.study_mode),
            references,
            citations: self.citations,
            key_points: self.key_points,
            clinical_relevance: self.clinical_relevance,
            difficulty: Difficulty::parse(&self.difficulty),
            fallback: self.fallback,
            created_at: self.created_at,
        }
    }
}

const QUERY_COLUMNS: &str = "id, user_id, question, answer, subject, syllabus, study_mode, \
refs, citations, key_points, clinical_relevance, difficulty, fallback, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
             RETURNING user_id, email",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No user with email {}", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Uuid = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn replace_plan(&self, user_id: Uuid, plan: &StudyPlan) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Dropping the old plan cascades into its days and progress rows.
        sqlx::query("DELETE FROM study_plans WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let plan_id: Uuid = sqlx::query_scalar(
            "INSERT INTO study_plans (user_id, exam_date, days_remaining, total_topics) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user_id)
        .bind(plan.exam_date)
        .bind(plan.days_remaining as i32)
        .bind(plan.total_topics as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for (position, day) in plan.daily_plan.iter().enumerate() {
            sqlx::query(
                "INSERT INTO plan_days (plan_id, position, day_date, topics) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(plan_id)
            .bind(position as i32)
            .bind(day.date)
            .bind(&day.topics)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_plan(
        &self,
        user_id: Uuid,
    ) -> PortResult<(StudyPlan, HashMap<String, bool>)> {
        let record = sqlx::query_as::<_, PlanRecord>(
            "SELECT id, exam_date, days_remaining, total_topics \
             FROM study_plans WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .ok_or_else(|| PortError::NotFound(format!("No study plan for user {}", user_id)))?;

        let days = sqlx::query_as::<_, PlanDayRecord>(
            "SELECT day_date, topics FROM plan_days WHERE plan_id = $1 ORDER BY position ASC",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let progress: Vec<(String, bool)> = sqlx::query_as(
            "SELECT topic, completed FROM topic_progress WHERE plan_id = $1",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let plan = StudyPlan {
            exam_date: record.exam_date,
            days_remaining: record.days_remaining as u32,
            daily_plan: days.into_iter().map(PlanDayRecord::to_domain).collect(),
            total_topics: record.total_topics as usize,
        };
        Ok((plan, progress.into_iter().collect()))
    }

    async fn toggle_topic(&self, user_id: Uuid, topic: &str) -> PortResult<bool> {
        let plan_id: Uuid =
            sqlx::query_scalar("SELECT id FROM study_plans WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("No study plan for user {}", user_id))
                    }
                    _ => PortError::Unexpected(e.to_string()),
                })?;

        // First reference creates the record as completed; later calls flip it.
        let completed: bool = sqlx::query_scalar(
            "INSERT INTO topic_progress (plan_id, topic, completed) VALUES ($1, $2, TRUE) \
             ON CONFLICT (plan_id, topic) \
             DO UPDATE SET completed = NOT topic_progress.completed \
             RETURNING completed",
        )
        .bind(plan_id)
        .bind(topic)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(completed)
    }

    async fn insert_query(&self, query: NewQuery) -> PortResult<StoredQuery> {
        let refs_json = serde_json::to_value(
            query
                .references
                .iter()
                .map(ReferenceJson::from_domain)
                .collect::<Vec<_>>(),
        )
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, QueryRecord>(&format!(
            "INSERT INTO queries (user_id, question, answer, subject, syllabus, study_mode, \
             refs, citations, key_points, clinical_relevance, difficulty, fallback) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {QUERY_COLUMNS}"
        ))
        .bind(query.user_id)
        .bind(&query.question)
        .bind(&query.answer)
        .bind(&query.subject)
        .bind(&query.syllabus)
        .bind(query.study_mode.as_str())
        .bind(refs_json)
        .bind(&query.citations)
        .bind(&query.key_points)
        .bind(&query.clinical_relevance)
        .bind(query.difficulty.as_str())
        .bind(query.fallback)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn find_recent_query(
        &self,
        user_id: Uuid,
        subject: &str,
        syllabus: &str,
        question_prefix: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Option<StoredQuery>> {
        let pattern = format!("%{}%", escape_like(question_prefix));
        let record = sqlx::query_as::<_, QueryRecord>(&format!(
            "SELECT {QUERY_COLUMNS} FROM queries \
             WHERE user_id = $1 AND subject = $2 AND syllabus = $3 \
               AND NOT fallback \
               AND created_at >= $4 \
               AND question ILIKE $5 \
             ORDER BY created_at DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(subject)
        .bind(syllabus)
        .bind(since)
        .bind(pattern)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(QueryRecord::to_domain))
    }

    async fn list_queries(
        &self,
        user_id: Uuid,
        filter: &HistoryFilter,
    ) -> PortResult<(Vec<StoredQuery>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queries \
             WHERE user_id = $1 \
               AND ($2::text IS NULL OR subject = $2) \
               AND ($3::text IS NULL OR syllabus = $3)",
        )
        .bind(user_id)
        .bind(&filter.subject)
        .bind(&filter.syllabus)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let records = sqlx::query_as::<_, QueryRecord>(&format!(
            "SELECT {QUERY_COLUMNS} FROM queries \
             WHERE user_id = $1 \
               AND ($2::text IS NULL OR subject = $2) \
               AND ($3::text IS NULL OR syllabus = $3) \
             ORDER BY created_at DESC \
             LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(&filter.subject)
        .bind(&filter.syllabus)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let queries = records.into_iter().map(QueryRecord::to_domain).collect();
        Ok((queries, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100% sure_thing"), "100\\% sure\\_thing");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain prefix"), "plain prefix");
    }

    #[test]
    fn reference_json_round_trips_partial_fields() {
        let json = serde_json::json!([{"source": "Gray's Anatomy"}]);
        let parsed: Vec<ReferenceJson> = serde_json::from_value(json).unwrap();
        let domain = parsed.into_iter().map(ReferenceJson::to_domain).collect::<Vec<_>>();
        assert_eq!(domain[0].source, "Gray's Anatomy");
        assert!(domain[0].chapter.is_none());
        assert!(domain[0].page.is_none());
    }
}
