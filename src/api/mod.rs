//! JSON over HTTP.
//!
//! Each route validates its input, makes exactly one service call and maps
//! the result onto the wire shapes in [`types`]. Domain errors become a
//! status code plus a stable error code.

pub mod types;

use crate::error::AppError;
use crate::repository::{PullRequestRepository, TeamRepository, UserRepository};
use crate::services::{PullRequestService, RandomSource, TeamService, UserService};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use types::{
    required, required_param, AddTeamRequest, CreatePullRequestRequest, MergePullRequestRequest,
    PullRequestEnvelope, ReassignRequest, ReassignResponse, ReviewQuery, ReviewsResponse,
    SetIsActiveRequest, TeamEnvelope, TeamQuery, UserEnvelope,
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub teams: TeamService,
    pub users: UserService,
    pub pull_requests: PullRequestService,
}

impl AppState {
    /// Wire all three services to one store implementing every repository.
    pub fn new<S>(store: Arc<S>, random: Arc<dyn RandomSource>) -> Self
    where
        S: UserRepository + TeamRepository + PullRequestRepository + 'static,
    {
        Self {
            teams: TeamService::new(store.clone(), store.clone()),
            users: UserService::new(store.clone()),
            pull_requests: PullRequestService::new(store.clone(), store, random),
        }
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::UserNotFound { .. }
            | AppError::TeamNotFound { .. }
            | AppError::PullRequestNotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::PullRequestExists { .. } => (StatusCode::CONFLICT, "PR_EXISTS"),
            AppError::TeamExists { .. } => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
            AppError::UserHasOpenPullRequests { .. } => (StatusCode::BAD_REQUEST, "PR_EXISTS"),
            AppError::PullRequestMerged { .. } => (StatusCode::CONFLICT, "PR_MERGED"),
            AppError::ReviewerNotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            AppError::NoReplacementCandidate { .. } => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Database { .. } | AppError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            log::error!("[server] {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code,
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the full API router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

/// POST /team/add: create a team with its members.
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamEnvelope>), ApiErr> {
    let Json(body) = payload?;
    let (team_name, members) = body.into_parts()?;

    let team = state.teams.create_team(&team_name, members).await?;
    Ok((StatusCode::CREATED, Json(TeamEnvelope { team: team.into() })))
}

/// GET /team/get?team_name=X
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamEnvelope>, ApiErr> {
    let Query(params) = query?;
    let team_name = required_param(params.team_name.as_deref(), "team_name")?;

    let team = state.teams.get_team(&team_name).await?;
    Ok(Json(TeamEnvelope { team: team.into() }))
}

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiErr> {
    let Json(body) = payload?;
    let user_id = required(&body.user_id, "user_id")?;

    let user = state.users.set_is_active(&user_id, body.is_active).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

/// GET /users/getReview?user_id=X: pull requests the user reviews.
async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Result<Json<ReviewsResponse>, ApiErr> {
    let Query(params) = query?;
    let user_id = required_param(params.user_id.as_deref(), "user_id")?;

    let prs = state.pull_requests.get_by_reviewer(&user_id).await?;
    Ok(Json(ReviewsResponse {
        user_id,
        pull_requests: prs.into_iter().map(Into::into).collect(),
    }))
}

/// POST /pullRequest/create
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ApiErr> {
    let Json(body) = payload?;
    let id = required(&body.pull_request_id, "pull_request_id")?;
    let name = required(&body.pull_request_name, "pull_request_name")?;
    let author_id = required(&body.author_id, "author_id")?;

    let pr = state
        .pull_requests
        .create_pull_request(&id, &name, &author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PullRequestEnvelope { pr: pr.into() })))
}

/// POST /pullRequest/merge
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestEnvelope>, ApiErr> {
    let Json(body) = payload?;
    let id = required(&body.pull_request_id, "pull_request_id")?;

    let pr = state.pull_requests.merge(&id).await?;
    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(body) = payload?;
    let id = required(&body.pull_request_id, "pull_request_id")?;
    let old_user_id = required(&body.old_user_id, "old_user_id")?;

    let reassignment = state.pull_requests.reassign_reviewer(&id, &old_user_id).await?;
    Ok(Json(reassignment.into()))
}
