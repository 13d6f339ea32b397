//! XP Handlers

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::dto::{AwardXpRequest, AwardXpResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

/// Award XP to the caller for an activity
#[utoipa::path(
    post,
    path = "/api/v1/xp",
    tag = "Progression",
    security(("bearer" = [])),
    request_body = AwardXpRequest,
    responses(
        (status = 200, description = "XP granted", body = AwardXpResponse),
        (status = 400, description = "Invalid amount or reason", body = crate::error::ErrorResponse)
    )
)]
pub async fn award_xp(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<AwardXpRequest>,
) -> ApiResult<Json<AwardXpResponse>> {
    state
        .arena
        .ensure_account(user.account_id, &user.username, Utc::now())
        .await?;
    let outcome = state.arena.xp.award(user.account_id, req.into_domain()).await?;
    Ok(Json(AwardXpResponse::from(outcome)))
}
