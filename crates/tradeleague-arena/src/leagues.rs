//! # Fantasy Leagues
//!
//! User-created groups that compete on paper returns between two dates.
//!
//! ## Member value
//!
//! Every member starts the league at the league's starting capital no
//! matter how large their account is. Their league value moves with their
//! account total since joining:
//!
//! ```text
//! current_value = starting_value + (account_total_now − baseline_at_join)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_types::{AccountId, LeagueId};

use crate::error::{ArenaError, ArenaResult};
use crate::notifications::{publish_all, Notification, NotificationKind};
use crate::standings::{recalculate, MemberValue, StandingsOutcome};
use crate::store::ArenaStore;
use crate::valuation::PortfolioValuator;

pub const INVITE_CODE_LEN: usize = 8;
/// Uppercase alphanumerics without 0/O and 1/I
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const MIN_MEMBERS: u32 = 2;
pub const MAX_MEMBERS: u32 = 50;
pub const MAX_NAME_LEN: usize = 60;
const INVITE_CODE_ATTEMPTS: usize = 5;

// ============================================================================
// Leagues & Memberships
// ============================================================================

/// League lifecycle, derived from its dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    Upcoming,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyLeague {
    pub id: LeagueId,
    pub name: String,
    pub invite_code: String,
    pub owner_id: AccountId,
    pub starting_capital: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_members: u32,
    pub created_at: DateTime<Utc>,
}

impl FantasyLeague {
    pub fn status_at(&self, now: DateTime<Utc>) -> LeagueStatus {
        if now >= self.ends_at {
            LeagueStatus::Ended
        } else if now < self.starts_at {
            LeagueStatus::Upcoming
        } else {
            LeagueStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueMembership {
    pub league_id: LeagueId,
    pub account_id: AccountId,
    pub username: String,
    /// Account total when the member joined
    pub baseline_value: Decimal,
    pub starting_value: Decimal,
    pub current_value: Decimal,
    /// `None` until the first recalculation
    pub rank: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

impl LeagueMembership {
    /// League value for a given account total
    pub fn value_for_total(&self, account_total: Decimal) -> Decimal {
        self.starting_value + (account_total - self.baseline_value)
    }
}

/// Persisted result of a recalculation for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStanding {
    pub account_id: AccountId,
    pub current_value: Decimal,
    pub rank: u32,
}

/// Request to create a league
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLeague {
    pub name: String,
    pub starting_capital: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_members: u32,
}

impl NewLeague {
    pub fn validate(&self) -> ArenaResult<()> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(ArenaError::Validation(format!(
                "league name must be 1 to {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.starting_capital <= Decimal::ZERO {
            return Err(ArenaError::Validation("starting capital must be positive".into()));
        }
        if self.ends_at <= self.starts_at {
            return Err(ArenaError::Validation("league must end after it starts".into()));
        }
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&self.max_members) {
            return Err(ArenaError::Validation(format!(
                "member cap must be between {} and {}",
                MIN_MEMBERS, MAX_MEMBERS
            )));
        }
        Ok(())
    }
}

/// Random invite code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

// ============================================================================
// League Service
// ============================================================================

#[derive(Clone)]
pub struct LeagueService {
    store: Arc<dyn ArenaStore>,
    valuator: PortfolioValuator,
}

impl LeagueService {
    pub fn new(store: Arc<dyn ArenaStore>, valuator: PortfolioValuator) -> Self {
        Self { store, valuator }
    }

    /// Create a league and enrol its owner
    pub async fn create(&self, owner_id: AccountId, request: NewLeague, now: DateTime<Utc>) -> ArenaResult<FantasyLeague> {
        request.validate()?;
        if request.ends_at <= now {
            return Err(ArenaError::Validation("league end date is in the past".into()));
        }
        let owner = self.store.account(owner_id).await?;

        let mut created = None;
        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let league = FantasyLeague {
                id: LeagueId::new(),
                name: request.name.trim().to_string(),
                invite_code: generate_invite_code(),
                owner_id,
                starting_capital: request.starting_capital,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
                max_members: request.max_members,
                created_at: now,
            };
            match self.store.insert_league(league.clone()).await {
                Ok(()) => {
                    created = Some(league);
                    break;
                }
                Err(ArenaError::InviteCodeTaken) => {
                    tracing::debug!(attempt, "Invite code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        let league = created.ok_or(ArenaError::InviteCodeTaken)?;

        let baseline = self.valuator.value(&owner).await?.total;
        self.store
            .add_member(
                LeagueMembership {
                    league_id: league.id,
                    account_id: owner.id,
                    username: owner.username.clone(),
                    baseline_value: baseline,
                    starting_value: league.starting_capital,
                    current_value: league.starting_capital,
                    rank: Some(1),
                    joined_at: now,
                },
                league.max_members,
            )
            .await?;

        tracing::info!(league_id = %league.id, owner = %owner_id, code = %league.invite_code, "League created");
        Ok(league)
    }

    /// Join the league behind `invite_code`
    pub async fn join(&self, account_id: AccountId, invite_code: &str, now: DateTime<Utc>) -> ArenaResult<LeagueMembership> {
        let code = invite_code.trim().to_ascii_uppercase();
        let league = self
            .store
            .league_by_invite_code(&code)
            .await?
            .ok_or_else(|| ArenaError::LeagueNotFound(code.clone()))?;
        if league.status_at(now) == LeagueStatus::Ended {
            return Err(ArenaError::LeagueEnded);
        }

        let account = self.store.account(account_id).await?;
        let baseline = self.valuator.value(&account).await?.total;
        let membership = LeagueMembership {
            league_id: league.id,
            account_id,
            username: account.username.clone(),
            baseline_value: baseline,
            starting_value: league.starting_capital,
            current_value: league.starting_capital,
            rank: None,
            joined_at: now,
        };
        self.store.add_member(membership.clone(), league.max_members).await?;
        tracing::info!(league_id = %league.id, %account_id, "Joined league");

        let outcome = self.refresh_league(&league, None).await?;
        Ok(LeagueMembership {
            rank: outcome.rank_of(&account_id),
            ..membership
        })
    }

    /// Members of a league ordered by rank
    pub async fn standings(&self, league_id: LeagueId) -> ArenaResult<(FantasyLeague, Vec<LeagueMembership>)> {
        let league = self
            .store
            .league(league_id)
            .await?
            .ok_or_else(|| ArenaError::LeagueNotFound(league_id.to_string()))?;
        let members = self.store.members(league_id).await?;
        Ok((league, members))
    }

    /// Re-value every member, re-rank, persist, and notify the trigger
    pub async fn refresh_league(&self, league: &FantasyLeague, trigger: Option<AccountId>) -> ArenaResult<StandingsOutcome> {
        let members = self.store.members(league.id).await?;

        let valued = join_all(members.iter().map(|m| async move {
            match self.valuator.total(m.account_id).await {
                Ok(total) => m.value_for_total(total),
                Err(e) => {
                    tracing::warn!(
                        league_id = %league.id,
                        account_id = %m.account_id,
                        error = %e,
                        "Member valuation failed, keeping stored value"
                    );
                    m.current_value
                }
            }
        }))
        .await;

        let inputs: Vec<MemberValue> = members
            .into_iter()
            .zip(valued)
            .map(|(m, current_value)| MemberValue {
                account_id: m.account_id,
                username: m.username,
                previous_value: m.current_value,
                current_value,
                previous_rank: m.rank,
            })
            .collect();

        let outcome = recalculate(inputs, trigger);
        let standings: Vec<MemberStanding> = outcome
            .standings
            .iter()
            .map(|m| MemberStanding {
                account_id: m.account_id,
                current_value: m.current_value,
                rank: m.rank,
            })
            .collect();
        self.store.save_standings(league.id, &standings).await?;

        if let Some(trigger_id) = trigger {
            let mut notifications: Vec<Notification> = outcome
                .passed
                .iter()
                .map(|p| {
                    Notification::new(
                        trigger_id,
                        NotificationKind::PassedMember {
                            league_id: league.id,
                            passed_account: p.account_id,
                            passed_username: p.username.clone(),
                        },
                    )
                })
                .collect();
            if let Some(improvement) = outcome.improvement {
                notifications.push(Notification::new(
                    trigger_id,
                    NotificationKind::RankImproved {
                        league_id: league.id,
                        from: improvement.from,
                        to: improvement.to,
                    },
                ));
            }
            publish_all(self.store.as_ref(), notifications).await;
        }

        Ok(outcome)
    }

    /// Refresh every running league `account_id` belongs to. Returns the
    /// number of leagues refreshed; per-league failures are logged.
    pub async fn refresh_for_account(&self, account_id: AccountId, now: DateTime<Utc>) -> ArenaResult<usize> {
        let leagues = self.store.leagues_for_account(account_id).await?;
        let mut refreshed = 0;
        for league in leagues
            .iter()
            .filter(|l| l.status_at(now) == LeagueStatus::Active)
        {
            match self.refresh_league(league, Some(account_id)).await {
                Ok(_) => refreshed += 1,
                Err(e) => {
                    tracing::warn!(league_id = %league.id, %account_id, error = %e, "League refresh failed");
                }
            }
        }
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn request() -> NewLeague {
        let now = Utc::now();
        NewLeague {
            name: "Friday Traders".into(),
            starting_capital: dec!(10000),
            starts_at: now,
            ends_at: now + Duration::days(30),
            max_members: 10,
        }
    }

    #[test]
    fn test_invite_code_shape() {
        for _ in 0..100 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_validation() {
        assert!(request().validate().is_ok());

        let mut r = request();
        r.name = "   ".into();
        assert!(matches!(r.validate(), Err(ArenaError::Validation(_))));

        let mut r = request();
        r.max_members = 1;
        assert!(r.validate().is_err());
        r.max_members = 51;
        assert!(r.validate().is_err());

        let mut r = request();
        r.ends_at = r.starts_at;
        assert!(r.validate().is_err());

        let mut r = request();
        r.starting_capital = dec!(0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_status_from_dates() {
        let r = request();
        let league = FantasyLeague {
            id: LeagueId::new(),
            name: r.name,
            invite_code: "ABCDEFGH".into(),
            owner_id: AccountId::new(),
            starting_capital: r.starting_capital,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            max_members: r.max_members,
            created_at: r.starts_at,
        };
        assert_eq!(league.status_at(r.starts_at - Duration::hours(1)), LeagueStatus::Upcoming);
        assert_eq!(league.status_at(r.starts_at), LeagueStatus::Active);
        assert_eq!(league.status_at(r.ends_at), LeagueStatus::Ended);
    }

    #[test]
    fn test_member_value_tracks_account_delta() {
        let m = LeagueMembership {
            league_id: LeagueId::new(),
            account_id: AccountId::new(),
            username: "ada".into(),
            baseline_value: dec!(100000),
            starting_value: dec!(10000),
            current_value: dec!(10000),
            rank: None,
            joined_at: Utc::now(),
        };
        assert_eq!(m.value_for_total(dec!(101500)), dec!(11500));
        assert_eq!(m.value_for_total(dec!(99000)), dec!(9000));
    }
}
