//! Fantasy league DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_arena::{FantasyLeague, LeagueMembership, LeagueStatus, NewLeague};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Create a league
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLeagueRequest {
    #[validate(length(min = 1, max = 60))]
    pub name: String,
    /// League bankroll every member starts from
    #[schema(value_type = String)]
    pub starting_capital: Decimal,
    /// Defaults to now
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
    #[validate(range(min = 2, max = 50))]
    pub max_members: u32,
}

impl CreateLeagueRequest {
    pub fn into_domain(self, now: DateTime<Utc>) -> NewLeague {
        NewLeague {
            name: self.name,
            starting_capital: self.starting_capital,
            starts_at: self.starts_at.unwrap_or(now),
            ends_at: self.ends_at,
            max_members: self.max_members,
        }
    }
}

/// Join by invite code
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinLeagueRequest {
    #[validate(length(min = 1, max = 16))]
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeagueInfo {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub owner_id: Uuid,
    #[schema(value_type = String)]
    pub starting_capital: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_members: u32,
    /// `upcoming`, `active` or `ended`
    pub status: String,
}

impl LeagueInfo {
    pub fn at(league: FantasyLeague, now: DateTime<Utc>) -> Self {
        let status = match league.status_at(now) {
            LeagueStatus::Upcoming => "upcoming",
            LeagueStatus::Active => "active",
            LeagueStatus::Ended => "ended",
        };
        Self {
            id: league.id.into_uuid(),
            name: league.name,
            invite_code: league.invite_code,
            owner_id: league.owner_id.into_uuid(),
            starting_capital: league.starting_capital,
            starts_at: league.starts_at,
            ends_at: league.ends_at,
            max_members: league.max_members,
            status: status.to_string(),
        }
    }
}

/// One row of the standings table
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StandingInfo {
    pub account_id: Uuid,
    pub username: String,
    /// `None` until the first recalculation
    pub rank: Option<u32>,
    #[schema(value_type = String)]
    pub starting_value: Decimal,
    #[schema(value_type = String)]
    pub current_value: Decimal,
    #[schema(value_type = String)]
    pub value_change: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl From<LeagueMembership> for StandingInfo {
    fn from(m: LeagueMembership) -> Self {
        Self {
            account_id: m.account_id.into_uuid(),
            username: m.username,
            rank: m.rank,
            starting_value: m.starting_value,
            current_value: m.current_value,
            value_change: m.current_value - m.starting_value,
            joined_at: m.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StandingsResponse {
    pub league: LeagueInfo,
    pub members: Vec<StandingInfo>,
}

/// Result of a join
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinLeagueResponse {
    pub league_id: Uuid,
    pub membership: StandingInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_start_defaults_to_now() {
        let now = Utc::now();
        let req = CreateLeagueRequest {
            name: "Desk".into(),
            starting_capital: dec!(10000),
            starts_at: None,
            ends_at: now + Duration::days(30),
            max_members: 10,
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.into_domain(now).starts_at, now);
    }

    #[test]
    fn test_member_cap_out_of_range() {
        let req = CreateLeagueRequest {
            name: "Solo".into(),
            starting_capital: dec!(10000),
            starts_at: None,
            ends_at: Utc::now() + Duration::days(1),
            max_members: 1,
        };
        assert!(req.validate().is_err());
    }
}
