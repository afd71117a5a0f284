//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use medprep_core::domain::{AnswerResult, DayEntry, Reference, StoredQuery, StudyMode, StudyPlan};
use medprep_core::planner::{generate_plan, PlanError};
use medprep_core::ports::{DatabaseService, HistoryFilter, PortError};
use medprep_core::ProgressTracker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        ask_handler,
        history_handler,
        create_plan_handler,
        current_plan_handler,
        toggle_topic_handler,
        list_subjects_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(
            AskRequest,
            AnswerResponse,
            ReferenceDto,
            HistoryResponse,
            QuerySummary,
            CreatePlanRequest,
            PlanResponse,
            DayEntryDto,
            ToggleRequest,
            ToggleResponse,
            SubjectDto,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "medprep API", description = "API endpoints for the medical study assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// A question submitted to the assistant.
#[derive(Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
    /// Subject the question belongs to; auto-detected when omitted.
    pub subject: Option<String>,
    /// Curriculum context; falls back to the configured default.
    pub syllabus: Option<String>,
    /// "exam" or "conceptual"; defaults to "exam".
    pub study_mode: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ReferenceDto {
    source: String,
    chapter: Option<String>,
    page: Option<String>,
}

impl ReferenceDto {
    fn from_domain(r: Reference) -> Self {
        Self {
            source: r.source,
            chapter: r.chapter,
            page: r.page,
        }
    }
}

/// The answer payload, whether served fresh, from the store, or as the
/// degraded fallback (`error` set).
#[derive(Serialize, ToSchema)]
pub struct AnswerResponse {
    answer: String,
    references: Vec<ReferenceDto>,
    citations: Vec<String>,
    key_points: Vec<String>,
    clinical_relevance: String,
    subject: String,
    syllabus: String,
    difficulty: String,
    cached: bool,
    error: bool,
}

impl AnswerResponse {
    fn from_domain(result: AnswerResult) -> Self {
        Self {
            answer: result.answer,
            references: result
                .references
                .into_iter()
                .map(ReferenceDto::from_domain)
                .collect(),
            citations: result.citations,
            key_points: result.key_points,
            clinical_relevance: result.clinical_relevance,
            subject: result.subject,
            syllabus: result.syllabus,
            difficulty: result.difficulty.as_str().to_string(),
            cached: result.cached,
            error: result.error,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryParams {
    pub subject: Option<String>,
    pub syllabus: Option<String>,
    /// 1-based page number; defaults to 1.
    pub page: Option<i64>,
    /// Page size; defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct QuerySummary {
    id: Uuid,
    question: String,
    answer: String,
    subject: String,
    syllabus: String,
    study_mode: String,
    difficulty: String,
    fallback: bool,
    created_at: chrono::DateTime<Utc>,
}

impl QuerySummary {
    fn from_domain(q: StoredQuery) -> Self {
        Self {
            id: q.id,
            question: q.question,
            answer: q.answer,
            subject: q.subject,
            syllabus: q.syllabus,
            study_mode: q.study_mode.as_str().to_string(),
            difficulty: q.difficulty.as_str().to_string(),
            fallback: q.fallback,
            created_at: q.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    queries: Vec<QuerySummary>,
    total: i64,
    page: i64,
    limit: i64,
}

/// Inputs for generating a plan. Weak subjects are scheduled first.
#[derive(Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    /// Exam date as YYYY-MM-DD.
    pub exam_date: String,
    pub selected_subjects: Vec<String>,
    #[serde(default)]
    pub weak_subjects: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DayEntryDto {
    date: NaiveDate,
    topics: Vec<String>,
}

impl DayEntryDto {
    fn from_domain(d: DayEntry) -> Self {
        Self {
            date: d.date,
            topics: d.topics,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    exam_date: NaiveDate,
    days_remaining: u32,
    total_topics: usize,
    daily_plan: Vec<DayEntryDto>,
    completed_topics: Vec<String>,
    completion_percentage: u8,
}

impl PlanResponse {
    fn build(plan: StudyPlan, tracker: &ProgressTracker) -> Self {
        let completion_percentage = tracker.completion_percentage(&plan);
        let mut completed_topics: Vec<String> = tracker
            .snapshot()
            .iter()
            .filter(|(_, done)| **done)
            .map(|(topic, _)| topic.clone())
            .collect();
        completed_topics.sort();
        Self {
            exam_date: plan.exam_date,
            days_remaining: plan.days_remaining,
            total_topics: plan.total_topics,
            daily_plan: plan
                .daily_plan
                .into_iter()
                .map(DayEntryDto::from_domain)
                .collect(),
            completed_topics,
            completion_percentage,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub topic: String,
}

#[derive(Serialize, ToSchema)]
pub struct ToggleResponse {
    topic: String,
    completed: bool,
    completion_percentage: u8,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectDto {
    name: String,
    topics: Vec<String>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn port_error(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(msg) => {
            error!("{context}: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {context}"),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Ask a medical question.
///
/// Serves a recent stored answer when an equivalent question was asked
/// within the freshness window; otherwise the AI provider is consulted.
/// Provider outages degrade to a fallback answer with `error` set rather
/// than failing the request.
#[utoipa::path(
    post,
    path = "/api/queries",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer produced", body = AnswerResponse),
        (status = 400, description = "Empty question"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question must not be empty".to_string()));
    }

    let syllabus = req
        .syllabus
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&app_state.config.default_syllabus);
    let mode = req
        .study_mode
        .as_deref()
        .map(StudyMode::parse)
        .unwrap_or(StudyMode::Exam);

    let result = app_state
        .gate
        .answer(
            user_id,
            req.question.trim(),
            req.subject.as_deref(),
            syllabus,
            mode,
            Utc::now(),
        )
        .await
        .map_err(|e| port_error("answer question", e))?;

    Ok(Json(AnswerResponse::from_domain(result)))
}

/// List the user's past queries, newest first.
#[utoipa::path(
    get,
    path = "/api/queries",
    params(HistoryParams),
    responses(
        (status = 200, description = "Query history page", body = HistoryResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let filter = HistoryFilter {
        subject: params.subject.filter(|s| !s.trim().is_empty()),
        syllabus: params.syllabus.filter(|s| !s.trim().is_empty()),
        limit,
        offset: (page - 1) * limit,
    };

    let (queries, total) = app_state
        .db
        .list_queries(user_id, &filter)
        .await
        .map_err(|e| port_error("list query history", e))?;

    Ok(Json(HistoryResponse {
        queries: queries.into_iter().map(QuerySummary::from_domain).collect(),
        total,
        page,
        limit,
    }))
}

/// Generate a study plan, replacing the user's previous one.
#[utoipa::path(
    post,
    path = "/api/plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 400, description = "Invalid date, past exam date, or unknown subjects"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let plan = generate_plan(
        &app_state.catalog,
        &req.exam_date,
        &req.selected_subjects,
        &req.weak_subjects,
        today,
    )
    .map_err(|e: PlanError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    app_state
        .db
        .replace_plan(user_id, &plan)
        .await
        .map_err(|e| port_error("save study plan", e))?;

    let response = PlanResponse::build(plan, &ProgressTracker::new());
    Ok((StatusCode::CREATED, Json(response)))
}

/// The user's current plan with completion state.
#[utoipa::path(
    get,
    path = "/api/plans/current",
    responses(
        (status = 200, description = "Current plan", body = PlanResponse),
        (status = 404, description = "No plan generated yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn current_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (plan, completed) = app_state
        .db
        .get_plan(user_id)
        .await
        .map_err(|e| port_error("load study plan", e))?;

    let tracker = ProgressTracker::from_map(completed);
    Ok(Json(PlanResponse::build(plan, &tracker)))
}

/// Toggle completion of one topic on the current plan.
#[utoipa::path(
    post,
    path = "/api/plans/progress",
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "New completion state", body = ToggleResponse),
        (status = 404, description = "No plan generated yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let completed = app_state
        .db
        .toggle_topic(user_id, &req.topic)
        .await
        .map_err(|e| port_error("toggle topic", e))?;

    let (plan, flags) = app_state
        .db
        .get_plan(user_id)
        .await
        .map_err(|e| port_error("load study plan", e))?;
    let tracker = ProgressTracker::from_map(flags);

    Ok(Json(ToggleResponse {
        topic: req.topic,
        completed,
        completion_percentage: tracker.completion_percentage(&plan),
    }))
}

/// List the subject catalog for the subject picker.
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses(
        (status = 200, description = "Subject catalog", body = [SubjectDto])
    )
)]
pub async fn list_subjects_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let subjects: Vec<SubjectDto> = app_state
        .catalog
        .subject_names()
        .into_iter()
        .map(|name| SubjectDto {
            name: name.to_string(),
            topics: app_state
                .catalog
                .topics_of(name)
                .map(|t| t.to_vec())
                .unwrap_or_default(),
        })
        .collect();
    Json(subjects)
}
