//! # League Standings
//!
//! Ranks league members by current value and works out what changed for the
//! member whose trade triggered the recalculation.
//!
//! Ordering is a stable sort, descending by value. Ties keep their input
//! order and still get distinct sequential ranks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_types::AccountId;

/// A member's value before and after the triggering valuation
#[derive(Debug, Clone, PartialEq)]
pub struct MemberValue {
    pub account_id: AccountId,
    pub username: String,
    pub previous_value: Decimal,
    pub current_value: Decimal,
    /// `None` until the member has been ranked once
    pub previous_rank: Option<u32>,
}

/// A member placed in the new ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMember {
    pub account_id: AccountId,
    pub username: String,
    pub current_value: Decimal,
    pub rank: u32,
    pub previous_rank: Option<u32>,
}

impl RankedMember {
    /// Positive when the member moved up
    pub fn rank_change(&self) -> i64 {
        self.previous_rank
            .map_or(0, |prev| prev as i64 - self.rank as i64)
    }
}

/// Another member the trigger overtook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassedMember {
    pub account_id: AccountId,
    pub username: String,
}

/// Rank movement of the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankImprovement {
    pub from: u32,
    pub to: u32,
}

/// Result of one recalculation
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsOutcome {
    /// Ordered by rank
    pub standings: Vec<RankedMember>,
    pub passed: Vec<PassedMember>,
    pub improvement: Option<RankImprovement>,
}

impl StandingsOutcome {
    pub fn rank_of(&self, id: &AccountId) -> Option<u32> {
        self.standings.iter().find(|m| &m.account_id == id).map(|m| m.rank)
    }
}

/// Rank `members` and detect passes and rank gains for `trigger`
pub fn recalculate(members: Vec<MemberValue>, trigger: Option<AccountId>) -> StandingsOutcome {
    let passed = trigger
        .and_then(|id| members.iter().find(|m| m.account_id == id))
        .map(|t| {
            members
                .iter()
                .filter(|m| m.account_id != t.account_id)
                .filter(|m| {
                    let exceeds_now = t.current_value > m.current_value;
                    let exceeded_before = t.previous_value > m.previous_value;
                    exceeds_now && !exceeded_before
                })
                .map(|m| PassedMember {
                    account_id: m.account_id,
                    username: m.username.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let mut ordered = members;
    // Vec::sort_by is stable
    ordered.sort_by(|a, b| b.current_value.cmp(&a.current_value));

    let standings: Vec<RankedMember> = ordered
        .into_iter()
        .enumerate()
        .map(|(i, m)| RankedMember {
            account_id: m.account_id,
            username: m.username,
            current_value: m.current_value,
            rank: i as u32 + 1,
            previous_rank: m.previous_rank,
        })
        .collect();

    let improvement = trigger
        .and_then(|id| standings.iter().find(|m| m.account_id == id))
        .filter(|m| m.rank_change() > 0)
        .and_then(|m| m.previous_rank.map(|from| RankImprovement { from, to: m.rank }));

    StandingsOutcome {
        standings,
        passed,
        improvement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(prev: Decimal, now: Decimal, prev_rank: Option<u32>) -> MemberValue {
        MemberValue {
            account_id: AccountId::new(),
            username: format!("user{}", now),
            previous_value: prev,
            current_value: now,
            previous_rank: prev_rank,
        }
    }

    #[test]
    fn test_ranks_descending_by_value() {
        let members = vec![
            member(dec!(100), dec!(100), None),
            member(dec!(300), dec!(300), None),
            member(dec!(200), dec!(200), None),
        ];
        let ids: Vec<AccountId> = members.iter().map(|m| m.account_id).collect();
        let outcome = recalculate(members, None);
        let ranks: Vec<u32> = ids.iter().map(|id| outcome.rank_of(id).unwrap()).collect();
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let members = vec![
            member(dec!(0), dec!(500), None),
            member(dec!(0), dec!(500), None),
            member(dec!(0), dec!(500), None),
        ];
        let ids: Vec<AccountId> = members.iter().map(|m| m.account_id).collect();
        let outcome = recalculate(members, None);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(outcome.rank_of(id), Some(i as u32 + 1));
        }
    }

    #[test]
    fn test_trigger_passes_members() {
        let trigger = member(dec!(100), dec!(260), Some(3));
        let overtaken = member(dec!(200), dec!(200), Some(2));
        let still_ahead = member(dec!(300), dec!(300), Some(1));
        let already_behind = member(dec!(50), dec!(50), Some(4));
        let trigger_id = trigger.account_id;
        let overtaken_id = overtaken.account_id;

        let outcome = recalculate(
            vec![still_ahead, overtaken, trigger, already_behind],
            Some(trigger_id),
        );

        assert_eq!(outcome.passed.len(), 1);
        assert_eq!(outcome.passed[0].account_id, overtaken_id);
        assert_eq!(outcome.improvement, Some(RankImprovement { from: 3, to: 2 }));
        assert_eq!(outcome.standings[1].rank_change(), 1);
    }

    #[test]
    fn test_rank_decline_is_silent() {
        let trigger = member(dec!(300), dec!(90), Some(1));
        let other = member(dec!(200), dec!(200), Some(2));
        let trigger_id = trigger.account_id;
        let outcome = recalculate(vec![trigger, other], Some(trigger_id));
        assert!(outcome.passed.is_empty());
        assert!(outcome.improvement.is_none());
        assert_eq!(outcome.rank_of(&trigger_id), Some(2));
    }

    #[test]
    fn test_first_ranking_is_not_an_improvement() {
        let trigger = member(dec!(100), dec!(100), None);
        let trigger_id = trigger.account_id;
        let outcome = recalculate(vec![trigger], Some(trigger_id));
        assert_eq!(outcome.rank_of(&trigger_id), Some(1));
        assert!(outcome.improvement.is_none());
    }
}
