//! Scheduled Job Handlers
//!
//! Invoked by an external scheduler holding the cron secret. Both jobs are
//! keyed so a retried invocation cannot apply twice; the key defaults to
//! the ISO week of the request.

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tradeleague_arena::{ArenaError, ArenaResult, PeriodKey};

use crate::dto::{RatingUpdateResponse, SeasonResetResponse};
use crate::error::ApiResult;
use crate::extractors::{CronAuth, IdempotencyKey};
use crate::state::AppState;

fn outcome_label<T>(result: &ArenaResult<T>) -> &'static str {
    match result {
        Ok(_) => "completed",
        Err(ArenaError::AlreadyProcessed { .. } | ArenaError::AlreadyRotated { .. }) => "duplicate",
        Err(_) => "failed",
    }
}

/// Apply this week's rating changes
#[utoipa::path(
    post,
    path = "/api/v1/jobs/rating-update",
    tag = "Jobs",
    security(("cron" = [])),
    params(("Idempotency-Key" = Option<String>, Header, description = "ISO week to process, e.g. 2026-W42")),
    responses(
        (status = 200, description = "Ratings updated", body = RatingUpdateResponse),
        (status = 401, description = "Invalid cron secret", body = crate::error::ErrorResponse),
        (status = 409, description = "Week already processed", body = crate::error::ErrorResponse)
    )
)]
pub async fn rating_update(
    State(state): State<Arc<AppState>>,
    _cron: CronAuth,
    IdempotencyKey(key): IdempotencyKey,
) -> ApiResult<Json<RatingUpdateResponse>> {
    let period = match key {
        Some(key) => PeriodKey::parse(&key)?,
        None => PeriodKey::containing(Utc::now()),
    };
    tracing::info!(period = %period.as_str(), "Rating update requested");

    let result = state.arena.ratings.run(&period).await;
    metrics::counter!("tradeleague_rating_runs_total", "outcome" => outcome_label(&result)).increment(1);

    Ok(Json(RatingUpdateResponse::from(result?)))
}

/// Archive the season and open the next one
#[utoipa::path(
    post,
    path = "/api/v1/jobs/season-reset",
    tag = "Jobs",
    security(("cron" = [])),
    params(("Idempotency-Key" = Option<String>, Header, description = "Rotation key; defaults to the ISO week")),
    responses(
        (status = 200, description = "Season rotated", body = SeasonResetResponse),
        (status = 401, description = "Invalid cron secret", body = crate::error::ErrorResponse),
        (status = 409, description = "Already rotated or rotation in progress", body = crate::error::ErrorResponse)
    )
)]
pub async fn season_reset(
    State(state): State<Arc<AppState>>,
    _cron: CronAuth,
    IdempotencyKey(key): IdempotencyKey,
) -> ApiResult<Json<SeasonResetResponse>> {
    let now = Utc::now();
    let rotation_key = key.unwrap_or_else(|| PeriodKey::containing(now).as_str().to_string());
    tracing::info!(key = %rotation_key, "Season reset requested");

    let result = state.arena.seasons.rotate(&rotation_key, now).await;
    metrics::counter!("tradeleague_season_rotations_total", "outcome" => outcome_label(&result)).increment(1);

    Ok(Json(SeasonResetResponse::from(result?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&Ok::<_, ArenaError>(())), "completed");
        let dup: ArenaResult<()> = Err(ArenaError::AlreadyRotated { key: "k".into() });
        assert_eq!(outcome_label(&dup), "duplicate");
        let failed: ArenaResult<()> = Err(ArenaError::Storage("down".into()));
        assert_eq!(outcome_label(&failed), "failed");
    }
}
