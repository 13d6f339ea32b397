//! # Weekly Rating Updates
//!
//! Once per ISO week every account's rating moves by a step function of its
//! portfolio return over the week.
//!
//! | return        | delta |
//! |---------------|-------|
//! | ≥ +20%        | +500  |
//! | ≥ +10%        | +250  |
//! | ≥ +5%         | +120  |
//! | ≥ +2%         | +60   |
//! | ≥ +0.5%       | +25   |
//! | within ±0.5%  | 0     |
//!
//! Losses mirror gains. Ratings never drop below zero.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tradeleague_types::AccountId;

use crate::error::{ArenaError, ArenaResult};
use crate::notifications::{publish_all, Notification, NotificationKind};
use crate::store::{ArenaStore, JobClaim};
use crate::tiers::TierChange;
use crate::valuation::PortfolioValuator;

/// Job name used for the idempotency claim
pub const RATING_UPDATE_JOB: &str = "rating_update";

/// Largest rating movement in one period
pub const MAX_RATING_DELTA: i64 = 500;

/// (minimum absolute return %, delta), largest first
const RATING_STEPS: [(Decimal, i64); 5] = [
    (dec!(20), 500),
    (dec!(10), 250),
    (dec!(5), 120),
    (dec!(2), 60),
    (dec!(0.5), 25),
];

// ============================================================================
// Rating Math
// ============================================================================

/// Percentage return from `start` to `current`, 0 when `start` is not positive
pub fn period_return_percent(current: Decimal, start: Decimal) -> Decimal {
    if start <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current - start) / start * dec!(100)
}

/// Signed rating delta for a period return
pub fn rating_delta(return_percent: Decimal) -> i64 {
    let magnitude = return_percent.abs();
    let step = RATING_STEPS
        .iter()
        .find(|(threshold, _)| magnitude >= *threshold)
        .map_or(0, |(_, delta)| *delta);
    let step = step.min(MAX_RATING_DELTA);
    if return_percent.is_sign_negative() {
        -step
    } else {
        step
    }
}

/// New rating after applying `delta`, floored at zero
pub fn apply_rating_delta(rating: i64, delta: i64) -> i64 {
    rating.saturating_add(delta).max(0)
}

// ============================================================================
// Rating Periods
// ============================================================================

/// ISO-week label of a rating period, e.g. `2026-W42`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn from_date(date: NaiveDate) -> Self {
        let week = date.iso_week();
        Self(format!("{:04}-W{:02}", week.year(), week.week()))
    }

    /// Period containing `at`
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self::from_date(at.date_naive())
    }

    pub fn parse(s: &str) -> ArenaResult<Self> {
        Self::monday_of(s)
            .map(Self::from_date)
            .ok_or_else(|| ArenaError::Validation(format!("invalid period key: {}", s)))
    }

    fn monday_of(s: &str) -> Option<NaiveDate> {
        let (year, week) = s.trim().split_once("-W")?;
        NaiveDate::from_isoywd_opt(year.parse().ok()?, week.parse().ok()?, Weekday::Mon)
    }

    /// The following period
    pub fn next(&self) -> Self {
        match Self::monday_of(&self.0) {
            Some(monday) => Self::from_date(monday + Duration::days(7)),
            None => self.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Rating Updater
// ============================================================================

/// Per-account result of a rating update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRatingUpdate {
    pub account_id: AccountId,
    pub old_rating: i64,
    pub new_rating: i64,
    pub return_percent: Decimal,
    pub change: TierChange,
}

/// Batch result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRunSummary {
    pub period: String,
    pub processed: u32,
    pub promotions: u32,
    pub relegations: u32,
    pub unchanged: u32,
    /// Already rated by an earlier, interrupted run
    pub skipped: u32,
    pub failed: u32,
    pub resumed: bool,
}

#[derive(Clone)]
pub struct RatingUpdater {
    store: Arc<dyn ArenaStore>,
    valuator: PortfolioValuator,
    baseline: Decimal,
}

impl RatingUpdater {
    /// `baseline` is used when an account has no snapshot for the period
    pub fn new(store: Arc<dyn ArenaStore>, valuator: PortfolioValuator, baseline: Decimal) -> Self {
        Self {
            store,
            valuator,
            baseline,
        }
    }

    /// Update every account for `period`. A completed period is rejected; a
    /// run that was cut off resumes and skips accounts it already rated.
    pub async fn run(&self, period: &PeriodKey) -> ArenaResult<RatingRunSummary> {
        let resumed = match self.store.claim_job(RATING_UPDATE_JOB, period.as_str()).await? {
            JobClaim::Claimed => false,
            JobClaim::Resumed => true,
            JobClaim::Completed => {
                return Err(ArenaError::AlreadyProcessed {
                    job: RATING_UPDATE_JOB.to_string(),
                    period: period.to_string(),
                })
            }
        };
        if resumed {
            tracing::info!(%period, "Resuming interrupted rating update");
        }

        let mut summary = RatingRunSummary {
            period: period.to_string(),
            resumed,
            ..Default::default()
        };

        for account_id in self.store.account_ids().await? {
            match self.update_account(account_id, period).await {
                Ok(Some(update)) => {
                    summary.processed += 1;
                    match update.change {
                        TierChange::Promotion { .. } => summary.promotions += 1,
                        TierChange::Relegation { .. } => summary.relegations += 1,
                        TierChange::Unchanged { .. } => summary.unchanged += 1,
                    }
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(%account_id, %period, error = %e, "Rating update failed for account");
                }
            }
        }

        let summary_json =
            serde_json::to_value(&summary).map_err(|e| ArenaError::Storage(e.to_string()))?;
        self.store
            .complete_job(RATING_UPDATE_JOB, period.as_str(), summary_json)
            .await?;

        tracing::info!(
            %period,
            processed = summary.processed,
            promotions = summary.promotions,
            relegations = summary.relegations,
            skipped = summary.skipped,
            failed = summary.failed,
            "Rating update complete"
        );
        Ok(summary)
    }

    /// Rate one account and open its next period. `None` when the account
    /// already has its next-period snapshot, i.e. it was rated for `period`.
    pub async fn update_account(&self, account_id: AccountId, period: &PeriodKey) -> ArenaResult<Option<AccountRatingUpdate>> {
        let next = period.next();
        if self.store.balance_snapshot(account_id, next.as_str()).await?.is_some() {
            return Ok(None);
        }

        let account = self.store.account(account_id).await?;
        let total = self.valuator.value(&account).await?.total;
        let start = self
            .store
            .balance_snapshot(account_id, period.as_str())
            .await?
            .unwrap_or(self.baseline);

        let return_percent = period_return_percent(total, start);
        let new_rating = apply_rating_delta(account.rating, rating_delta(return_percent));
        if !self
            .store
            .apply_rating(account_id, new_rating, next.as_str(), total)
            .await?
        {
            return Ok(None);
        }

        let change = TierChange::between(account.rating, new_rating);
        let notification = match change {
            TierChange::Promotion { from, to } => Some(NotificationKind::Promotion { from, to }),
            TierChange::Relegation { from, to } => Some(NotificationKind::Relegation { from, to }),
            TierChange::Unchanged { .. } => None,
        };
        if let Some(kind) = notification {
            publish_all(self.store.as_ref(), vec![Notification::new(account_id, kind)]).await;
        }

        Ok(Some(AccountRatingUpdate {
            account_id,
            old_rating: account.rating,
            new_rating,
            return_percent,
            change,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_return() {
        assert_eq!(period_return_percent(dec!(120000), dec!(100000)), dec!(20));
        assert_eq!(period_return_percent(dec!(95000), dec!(100000)), dec!(-5));
        assert_eq!(period_return_percent(dec!(10), dec!(0)), dec!(0));
    }

    #[test]
    fn test_step_table() {
        assert_eq!(rating_delta(dec!(0)), 0);
        assert_eq!(rating_delta(dec!(0.49)), 0);
        assert_eq!(rating_delta(dec!(0.5)), 25);
        assert_eq!(rating_delta(dec!(2)), 60);
        assert_eq!(rating_delta(dec!(7.5)), 120);
        assert_eq!(rating_delta(dec!(10)), 250);
        assert_eq!(rating_delta(dec!(20)), 500);
        assert_eq!(rating_delta(dec!(-3)), -60);
        assert_eq!(rating_delta(dec!(-0.3)), 0);
    }

    #[test]
    fn test_delta_is_capped_and_monotonic() {
        let mut previous = i64::MIN;
        let mut pct = dec!(-1000);
        while pct <= dec!(1000) {
            let delta = rating_delta(pct);
            assert!(delta.abs() <= MAX_RATING_DELTA);
            assert!(delta >= previous);
            previous = delta;
            pct += dec!(0.25);
        }
    }

    #[test]
    fn test_rating_floor() {
        assert_eq!(apply_rating_delta(100, -500), 0);
        assert_eq!(apply_rating_delta(1000, 500), 1500);
    }

    #[test]
    fn test_period_keys() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let key = PeriodKey::from_date(date);
        assert_eq!(key.as_str(), "2026-W42");
        assert_eq!(key.next().as_str(), "2026-W43");
        assert_eq!(PeriodKey::parse("2026-W42").unwrap(), key);
        assert!(PeriodKey::parse("2026-42").is_err());
    }

    #[test]
    fn test_period_key_year_rollover() {
        let key = PeriodKey::parse("2026-W53").unwrap();
        assert_eq!(key.next().as_str(), "2027-W01");
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(PeriodKey::from_date(date).as_str(), "2026-W53");
    }
}
