//! Season & Tier Handlers
//!
//! Public, read-only endpoints.

use axum::{extract::State, Json};
use std::sync::Arc;
use tradeleague_arena::LeagueTier;

use crate::dto::{ArchivesQuery, CurrentSeasonInfo, SeasonArchiveInfo, TierInfo};
use crate::error::ApiResult;
use crate::extractors::ValidatedQuery;
use crate::state::AppState;

/// Archived seasons, newest first
#[utoipa::path(
    get,
    path = "/api/v1/seasons/archives",
    tag = "Seasons",
    params(ArchivesQuery),
    responses(
        (status = 200, description = "Season archives", body = [SeasonArchiveInfo])
    )
)]
pub async fn list_archives(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ArchivesQuery>,
) -> ApiResult<Json<Vec<SeasonArchiveInfo>>> {
    let archives = state.arena.seasons.archives(query.limit).await?;
    Ok(Json(archives.into_iter().map(SeasonArchiveInfo::from).collect()))
}

/// The running season
#[utoipa::path(
    get,
    path = "/api/v1/seasons/current",
    tag = "Seasons",
    responses(
        (status = 200, description = "Current season", body = CurrentSeasonInfo)
    )
)]
pub async fn current_season(State(state): State<Arc<AppState>>) -> ApiResult<Json<CurrentSeasonInfo>> {
    let season = state.arena.seasons.current().await?;
    Ok(Json(CurrentSeasonInfo::from(season)))
}

/// Tier table
#[utoipa::path(
    get,
    path = "/api/v1/tiers",
    tag = "Seasons",
    responses(
        (status = 200, description = "Tiers in ascending order", body = [TierInfo])
    )
)]
pub async fn list_tiers() -> Json<Vec<TierInfo>> {
    Json(LeagueTier::ALL.into_iter().map(TierInfo::from).collect())
}
