//! OpenAPI Documentation
//!
//! OpenAPI 3 specification for the TradeLeague API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::dto;
use crate::error::ErrorResponse;
use crate::handlers;

/// TradeLeague API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TradeLeague API",
        description = "Paper-trading leagues: trades, XP, fantasy leagues, weekly ratings and seasons.",
        version = "1.0.0",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    paths(
        // Health
        handlers::health::health_check,
        handlers::health::readiness_check,
        // Account
        handlers::account::get_profile,
        handlers::account::get_portfolio,
        handlers::account::list_transactions,
        handlers::account::list_notifications,
        // Trading & progression
        handlers::trade::place_trade,
        handlers::xp::award_xp,
        // Leagues
        handlers::league::create_league,
        handlers::league::join_league,
        handlers::league::list_my_leagues,
        handlers::league::get_standings,
        // Seasons
        handlers::season::list_archives,
        handlers::season::current_season,
        handlers::season::list_tiers,
        // Jobs
        handlers::jobs::rating_update,
        handlers::jobs::season_reset,
    ),
    components(
        schemas(
            // Common
            ErrorResponse,
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::ComponentStatus,
            // Account
            dto::ProfileResponse,
            dto::PortfolioResponse,
            dto::PositionInfo,
            dto::TransactionInfo,
            dto::TransactionsResponse,
            dto::NotificationInfo,
            // Trading & progression
            dto::PlaceTradeRequest,
            dto::TradeSideDto,
            dto::TradeResponse,
            dto::AwardXpRequest,
            dto::AwardXpResponse,
            // Leagues
            dto::CreateLeagueRequest,
            dto::JoinLeagueRequest,
            dto::JoinLeagueResponse,
            dto::LeagueInfo,
            dto::StandingInfo,
            dto::StandingsResponse,
            // Seasons
            dto::SeasonArchiveInfo,
            dto::LeaderboardEntryInfo,
            dto::CurrentSeasonInfo,
            dto::TierInfo,
            // Jobs
            dto::RatingUpdateResponse,
            dto::SeasonResetResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health and status"),
        (name = "Account", description = "Profile, portfolio, ledger and notifications"),
        (name = "Trading", description = "Buy and sell lots at the latest quote"),
        (name = "Progression", description = "XP awards"),
        (name = "Leagues", description = "Fantasy leagues and standings"),
        (name = "Seasons", description = "Season archives and tier table"),
        (name = "Jobs", description = "Scheduled rating and season jobs")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cron",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "TradeLeague API");
        assert!(doc.paths.paths.contains_key("/api/v1/jobs/season-reset"));
        assert!(doc.paths.paths.contains_key("/api/v1/leagues/{id}/standings"));
    }

    #[test]
    fn test_security_schemes_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.security_schemes.contains_key("cron"));
    }
}
