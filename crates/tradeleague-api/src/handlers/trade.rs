//! Trade Handlers

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::dto::{PlaceTradeRequest, TradeResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

/// Execute a buy or sell at the latest quote
#[utoipa::path(
    post,
    path = "/api/v1/trades",
    tag = "Trading",
    security(("bearer" = [])),
    request_body = PlaceTradeRequest,
    responses(
        (status = 200, description = "Trade executed", body = TradeResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Lot belongs to another account", body = crate::error::ErrorResponse),
        (status = 409, description = "Account modified concurrently", body = crate::error::ErrorResponse),
        (status = 422, description = "Insufficient funds or locked lot", body = crate::error::ErrorResponse),
        (status = 502, description = "Quote unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn place_trade(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<PlaceTradeRequest>,
) -> ApiResult<Json<TradeResponse>> {
    let request = req.into_domain()?;
    let side = request.side.as_str();
    let now = Utc::now();

    state
        .arena
        .ensure_account(user.account_id, &user.username, now)
        .await?;

    let result = state.arena.trades.execute(user.account_id, request, now).await;
    let outcome = if result.is_ok() { "executed" } else { "rejected" };
    metrics::counter!("tradeleague_trades_total", "side" => side, "outcome" => outcome).increment(1);

    Ok(Json(TradeResponse::from(result?)))
}
