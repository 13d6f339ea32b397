//! League tiers derived from rating

use serde::{Deserialize, Serialize};

/// Rating every new account starts with
pub const DEFAULT_RATING: i64 = 1000;

// ============================================================================
// League Tiers
// ============================================================================

/// Competitive bracket keyed by rating thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueTier {
    /// Below 1000
    Bronze,
    /// 1000 to 1499
    Silver,
    /// 1500 to 1999
    Gold,
    /// 2000 to 2499
    Platinum,
    /// 2500 and above
    Diamond,
}

impl LeagueTier {
    /// All tiers in ascending order
    pub const ALL: [LeagueTier; 5] = [
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
    ];

    /// Resolve the tier for a rating. Total over every integer.
    pub fn from_rating(rating: i64) -> Self {
        match rating {
            r if r >= 2500 => Self::Diamond,
            r if r >= 2000 => Self::Platinum,
            r if r >= 1500 => Self::Gold,
            r if r >= 1000 => Self::Silver,
            _ => Self::Bronze,
        }
    }

    /// Tier number, 1 (Bronze) through 5 (Diamond)
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Bronze => 1,
            Self::Silver => 2,
            Self::Gold => 3,
            Self::Platinum => 4,
            Self::Diamond => 5,
        }
    }

    /// Get tier display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
        }
    }

    /// Lowest rating in this tier
    pub fn min_rating(&self) -> i64 {
        match self {
            Self::Bronze => i64::MIN,
            Self::Silver => 1000,
            Self::Gold => 1500,
            Self::Platinum => 2000,
            Self::Diamond => 2500,
        }
    }

    /// Highest rating in this tier, `None` for the open-ended top tier
    pub fn max_rating(&self) -> Option<i64> {
        match self {
            Self::Bronze => Some(999),
            Self::Silver => Some(1499),
            Self::Gold => Some(1999),
            Self::Platinum => Some(2499),
            Self::Diamond => None,
        }
    }

    /// Get tier color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            Self::Bronze => "#CD7F32",
            Self::Silver => "#C0C0C0",
            Self::Gold => "#FFD700",
            Self::Platinum => "#E5E4E2",
            Self::Diamond => "#B9F2FF",
        }
    }

    /// Next tier up, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => Some(Self::Diamond),
            Self::Diamond => None,
        }
    }
}

impl std::fmt::Display for LeagueTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Tier movement caused by a rating change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum TierChange {
    Promotion { from: LeagueTier, to: LeagueTier },
    Relegation { from: LeagueTier, to: LeagueTier },
    Unchanged { tier: LeagueTier },
}

impl TierChange {
    pub fn between(old_rating: i64, new_rating: i64) -> Self {
        let from = LeagueTier::from_rating(old_rating);
        let to = LeagueTier::from_rating(new_rating);
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Self::Promotion { from, to },
            std::cmp::Ordering::Less => Self::Relegation { from, to },
            std::cmp::Ordering::Equal => Self::Unchanged { tier: to },
        }
    }
}
