//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Principal, Role};
use crate::config::{Environment, RoutePolicy};
use crate::http::error::ApiError;
use crate::http::extract::{AdminOnly, AdminOrSupervisor, AuthUser, RequireRole, ScoreSubmitters};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Echo the caller's principal.
pub async fn me(AuthUser(principal): AuthUser) -> Json<Principal> {
    Json(principal)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreSubmission {
    pub team_id: String,
    pub criterion: String,
    pub score: f64,
}

impl ScoreSubmission {
    pub const MAX_SCORE: f64 = 100.0;

    fn validate(&self) -> Result<(), ApiError> {
        if self.team_id.trim().is_empty() {
            return Err(ApiError::BadRequest("team_id is required".into()));
        }
        if self.criterion.trim().is_empty() {
            return Err(ApiError::BadRequest("criterion is required".into()));
        }
        if !self.score.is_finite() || !(0.0..=Self::MAX_SCORE).contains(&self.score) {
            return Err(ApiError::BadRequest(format!(
                "score must be between 0 and {}",
                Self::MAX_SCORE
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreReceipt {
    pub submission_id: Uuid,
    pub team_id: String,
    pub criterion: String,
    pub score: f64,
    pub judge: String,
    pub judge_role: Role,
}

pub async fn submit_score(
    guard: RequireRole<ScoreSubmitters>,
    payload: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ScoreReceipt>), ApiError> {
    let judge = guard.into_inner();
    let Json(submission) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    submission.validate()?;

    let receipt = ScoreReceipt {
        submission_id: Uuid::new_v4(),
        team_id: submission.team_id,
        criterion: submission.criterion,
        score: submission.score,
        judge: judge.subject,
        judge_role: judge.role,
    };

    tracing::info!(
        submission_id = %receipt.submission_id,
        team_id = %receipt.team_id,
        criterion = %receipt.criterion,
        score = receipt.score,
        judge = %receipt.judge,
        "Score submitted"
    );

    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

#[derive(Serialize)]
pub struct SupervisorOverview {
    pub viewer: String,
    pub role: Role,
    pub rate_limited_routes: Vec<RoutePolicy>,
}

pub async fn supervisor_overview(
    State(state): State<AppState>,
    guard: RequireRole<AdminOrSupervisor>,
) -> Json<SupervisorOverview> {
    let principal = guard.into_inner();
    Json(SupervisorOverview {
        viewer: principal.name,
        role: principal.role,
        rate_limited_routes: state.policies.load_full().to_vec(),
    })
}

#[derive(Serialize)]
pub struct AdminStatus {
    pub version: &'static str,
    pub environment: Environment,
    pub uptime_secs: u64,
    pub auth_configured: bool,
    pub rate_limit_enforced: bool,
    pub tracked_rate_windows: usize,
}

pub async fn admin_status(
    State(state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Json<AdminStatus> {
    Json(AdminStatus {
        version: env!("CARGO_PKG_VERSION"),
        environment: state.environment,
        uptime_secs: state.started_at.elapsed().as_secs(),
        auth_configured: state.authenticator.is_configured(),
        rate_limit_enforced: state.governor.is_enforcing(),
        tracked_rate_windows: state.governor.tracked_keys(),
    })
}
