//! HTTP surface.
//!
//! Everything except `/health` lives under `/internal` and sits behind the
//! shared-secret guard. These endpoints serve upstream automation (payment
//! webhooks, operator tooling), not end users.

use super::auth::{require_internal_secret, InternalAuth};
use super::response::ApiResponse;
use crate::app::AppContext;
use crate::error::{CoachwayError, Result};
use crate::revenue::RevenueBreakdown;
use crate::scheduling::completion::{CompletionReport, SessionIntelligence};
use crate::scheduling::orchestrator::DispatchResult;
use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

/// Build the full router for an application context.
pub fn router(context: AppContext) -> Router {
    let auth = InternalAuth::from_config(&context.config.internal_auth);

    let internal = Router::new()
        .route("/dispatch", post(dispatch))
        .route("/revenue/calculate", post(calculate_revenue))
        .route("/enrollments/:id/onboard", post(onboard_enrollment))
        .route("/sessions/:id/complete", post(complete_session))
        .layer(middleware::from_fn_with_state(auth, require_internal_secret));

    Router::new()
        .route("/health", get(health))
        .nest("/internal", internal)
        .with_state(context)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Dispatch one scheduling event. The envelope carries the event name plus
/// its payload fields at the top level. Handler failures are reported in
/// the result body, not as HTTP errors.
async fn dispatch(
    State(context): State<AppContext>,
    Json(envelope): Json<Value>,
) -> Result<Json<DispatchResult>> {
    let event = envelope
        .get("event")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CoachwayError::bad_request("event required"))?;

    let result = context.orchestrator.dispatch(&event, envelope).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRevenueRequest {
    enrollment_id: String,
}

async fn calculate_revenue(
    State(context): State<AppContext>,
    Json(request): Json<CalculateRevenueRequest>,
) -> Result<ApiResponse<RevenueBreakdown>> {
    let breakdown = context.calculator.calculate(&request.enrollment_id).await?;
    Ok(ApiResponse::success(breakdown))
}

async fn onboard_enrollment(
    State(context): State<AppContext>,
    Path(enrollment_id): Path<String>,
) -> Result<impl axum::response::IntoResponse> {
    let outcome = context.onboarding.run(&enrollment_id).await?;
    Ok(ApiResponse::success(outcome))
}

async fn complete_session(
    State(context): State<AppContext>,
    Path(session_id): Path<String>,
    Json(report): Json<CompletionReport>,
) -> Result<ApiResponse<SessionIntelligence>> {
    let intelligence = context.completion.complete(&session_id, report).await?;
    Ok(ApiResponse::success(intelligence))
}
