//! Fantasy League Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tradeleague_arena::store::LeagueStore;
use tradeleague_arena::LeagueId;
use uuid::Uuid;

use crate::dto::{CreateLeagueRequest, JoinLeagueRequest, JoinLeagueResponse, LeagueInfo, StandingInfo, StandingsResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

/// Create a league owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/leagues",
    tag = "Leagues",
    security(("bearer" = [])),
    request_body = CreateLeagueRequest,
    responses(
        (status = 200, description = "League created", body = LeagueInfo),
        (status = 400, description = "Invalid league settings", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_league(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<CreateLeagueRequest>,
) -> ApiResult<Json<LeagueInfo>> {
    let now = Utc::now();
    state
        .arena
        .ensure_account(user.account_id, &user.username, now)
        .await?;
    let league = state
        .arena
        .leagues
        .create(user.account_id, req.into_domain(now), now)
        .await?;
    Ok(Json(LeagueInfo::at(league, now)))
}

/// Join a league by invite code
#[utoipa::path(
    post,
    path = "/api/v1/leagues/join",
    tag = "Leagues",
    security(("bearer" = [])),
    request_body = JoinLeagueRequest,
    responses(
        (status = 200, description = "Joined", body = JoinLeagueResponse),
        (status = 404, description = "Unknown invite code", body = crate::error::ErrorResponse),
        (status = 409, description = "Already a member", body = crate::error::ErrorResponse),
        (status = 422, description = "League full or ended", body = crate::error::ErrorResponse)
    )
)]
pub async fn join_league(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<JoinLeagueRequest>,
) -> ApiResult<Json<JoinLeagueResponse>> {
    let now = Utc::now();
    state
        .arena
        .ensure_account(user.account_id, &user.username, now)
        .await?;
    let membership = state
        .arena
        .leagues
        .join(user.account_id, &req.invite_code, now)
        .await?;
    Ok(Json(JoinLeagueResponse {
        league_id: membership.league_id.into_uuid(),
        membership: StandingInfo::from(membership),
    }))
}

/// Leagues the caller belongs to
#[utoipa::path(
    get,
    path = "/api/v1/leagues",
    tag = "Leagues",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's leagues", body = [LeagueInfo])
    )
)]
pub async fn list_my_leagues(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<LeagueInfo>>> {
    let now = Utc::now();
    let leagues = state.arena.store.leagues_for_account(user.account_id).await?;
    Ok(Json(leagues.into_iter().map(|l| LeagueInfo::at(l, now)).collect()))
}

/// Standings of a league the caller belongs to
#[utoipa::path(
    get,
    path = "/api/v1/leagues/{id}/standings",
    tag = "Leagues",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "League id")),
    responses(
        (status = 200, description = "Members ordered by rank", body = StandingsResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorResponse),
        (status = 404, description = "League not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_standings(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StandingsResponse>> {
    let (league, members) = state.arena.leagues.standings(LeagueId::from_uuid(id)).await?;
    if !members.iter().any(|m| m.account_id == user.account_id) {
        return Err(ApiError::Forbidden("not a member of this league".into()));
    }

    Ok(Json(StandingsResponse {
        league: LeagueInfo::at(league, Utc::now()),
        members: members.into_iter().map(StandingInfo::from).collect(),
    }))
}
