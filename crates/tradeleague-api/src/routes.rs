//! API Routes
//!
//! Route definitions for all API endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Caller's account (requires auth)
        .nest("/me", me_routes())
        // Trading & progression
        .route("/trades", post(handlers::trade::place_trade))
        .route("/xp", post(handlers::xp::award_xp))
        // Fantasy leagues
        .nest("/leagues", league_routes())
        // Seasons & tiers (public)
        .route("/seasons/archives", get(handlers::season::list_archives))
        .route("/seasons/current", get(handlers::season::current_season))
        .route("/tiers", get(handlers::season::list_tiers))
        // Scheduled jobs (cron secret)
        .nest("/jobs", job_routes())
}

fn me_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::account::get_profile))
        .route("/portfolio", get(handlers::account::get_portfolio))
        .route("/transactions", get(handlers::account::list_transactions))
        .route("/notifications", get(handlers::account::list_notifications))
}

fn league_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::league::list_my_leagues).post(handlers::league::create_league),
        )
        .route("/join", post(handlers::league::join_league))
        .route("/:id/standings", get(handlers::league::get_standings))
}

fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rating-update", post(handlers::jobs::rating_update))
        .route("/season-reset", post(handlers::jobs::season_reset))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
