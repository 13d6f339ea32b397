//! Account Handlers
//!
//! Profile, portfolio, ledger and notification feeds for the caller. The
//! account is created on first sight of a verified identity.

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tradeleague_arena::store::{AccountStore, NotificationStore};

use crate::dto::{
    LimitParams, NotificationInfo, PaginationParams, PortfolioResponse, ProfileResponse, TransactionInfo,
    TransactionsResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, ValidatedQuery};
use crate::state::AppState;

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ProfileResponse>> {
    let account = state
        .arena
        .ensure_account(user.account_id, &user.username, Utc::now())
        .await?;
    Ok(Json(ProfileResponse::from(&account)))
}

/// Get the caller's portfolio valuation
#[utoipa::path(
    get,
    path = "/api/v1/me/portfolio",
    tag = "Account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Valuation in the home currency", body = PortfolioResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<PortfolioResponse>> {
    let account = state
        .arena
        .ensure_account(user.account_id, &user.username, Utc::now())
        .await?;
    let valuation = state.arena.valuator.value(&account).await?;
    Ok(Json(PortfolioResponse::new(
        state.arena.config.home_currency.to_string(),
        valuation,
    )))
}

/// List the caller's ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/me/transactions",
    tag = "Account",
    security(("bearer" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Ledger page", body = TransactionsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedQuery(page): ValidatedQuery<PaginationParams>,
) -> ApiResult<Json<TransactionsResponse>> {
    state
        .arena
        .ensure_account(user.account_id, &user.username, Utc::now())
        .await?;

    // one extra row tells us whether another page exists
    let mut entries = state
        .arena
        .store
        .transactions(user.account_id, page.limit + 1, page.offset())
        .await?;
    let has_more = entries.len() > page.limit as usize;
    entries.truncate(page.limit as usize);

    Ok(Json(TransactionsResponse {
        data: entries.into_iter().map(TransactionInfo::from).collect(),
        page: page.page,
        limit: page.limit,
        has_more,
    }))
}

/// List the caller's recent notifications
#[utoipa::path(
    get,
    path = "/api/v1/me/notifications",
    tag = "Account",
    security(("bearer" = [])),
    params(LimitParams),
    responses(
        (status = 200, description = "Notifications, newest first", body = [NotificationInfo]),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedQuery(params): ValidatedQuery<LimitParams>,
) -> ApiResult<Json<Vec<NotificationInfo>>> {
    let notifications = state
        .arena
        .store
        .notifications(user.account_id, params.limit)
        .await?;
    Ok(Json(notifications.into_iter().map(NotificationInfo::from).collect()))
}
