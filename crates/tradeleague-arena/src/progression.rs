//! # Experience and Levels
//!
//! Levels grow with the square root of accumulated XP:
//!
//! ```text
//! level(xp)        = floor(sqrt(xp / 10))
//! xp_for_level(l)  = l² × 10
//! ```
//!
//! so level 1 needs 10 XP, level 2 needs 40, level 10 needs 1000. All math
//! is integer; nothing here can fail.

use serde::{Deserialize, Serialize};

/// XP divisor inside the square root
pub const XP_PER_LEVEL_UNIT: i64 = 10;

// ============================================================================
// Level Math
// ============================================================================

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let n = n as u128;
    let mut x = (n as f64).sqrt() as u128;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x as u64
}

/// Level reached with `xp` experience points. Negative input maps to 0.
pub fn level_for_xp(xp: i64) -> u32 {
    if xp <= 0 {
        return 0;
    }
    let units = (xp / XP_PER_LEVEL_UNIT) as u64;
    u32::try_from(isqrt(units)).unwrap_or(u32::MAX)
}

/// Minimum XP needed to reach `level`
pub fn xp_for_level(level: u32) -> i64 {
    let l = level as i64;
    l.saturating_mul(l).saturating_mul(XP_PER_LEVEL_UNIT)
}

/// Whole-percent progress from the current level threshold to the next, in [0, 100]
pub fn progress_to_next_level(xp: i64) -> u8 {
    let level = level_for_xp(xp);
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level.saturating_add(1));
    let width = ceiling - floor;
    if width <= 0 {
        return 100;
    }
    let pct = (xp.max(0) - floor).saturating_mul(100) / width;
    pct.clamp(0, 100) as u8
}

// ============================================================================
// Titles
// ============================================================================

/// Display title for a band of levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LevelTitle {
    Rookie,
    Trader,
    Analyst,
    Strategist,
    Mogul,
}

impl LevelTitle {
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=4 => Self::Rookie,
            5..=9 => Self::Trader,
            10..=19 => Self::Analyst,
            20..=34 => Self::Strategist,
            _ => Self::Mogul,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rookie => "Rookie",
            Self::Trader => "Trader",
            Self::Analyst => "Analyst",
            Self::Strategist => "Strategist",
            Self::Mogul => "Mogul",
        }
    }
}

/// Everything a profile page shows about progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp: i64,
    pub level: u32,
    pub current_level_xp: i64,
    pub next_level_xp: i64,
    pub progress_percent: u8,
    pub title: LevelTitle,
}

impl LevelProgress {
    pub fn from_xp(xp: i64) -> Self {
        let level = level_for_xp(xp);
        Self {
            xp,
            level,
            current_level_xp: xp_for_level(level),
            next_level_xp: xp_for_level(level.saturating_add(1)),
            progress_percent: progress_to_next_level(xp),
            title: LevelTitle::for_level(level),
        }
    }

    /// XP still missing for the next level
    pub fn xp_to_next(&self) -> i64 {
        (self.next_level_xp - self.xp).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels() {
        assert_eq!(level_for_xp(0), 0);
        assert_eq!(level_for_xp(9), 0);
        assert_eq!(level_for_xp(10), 1);
        assert_eq!(level_for_xp(40), 2);
        assert_eq!(level_for_xp(1000), 10);
    }

    #[test]
    fn test_negative_xp_is_level_zero() {
        assert_eq!(level_for_xp(-50), 0);
        assert_eq!(progress_to_next_level(-50), 0);
    }

    #[test]
    fn test_thresholds_bracket_xp() {
        for xp in (0..20_000).chain([123_456, 9_999_999, i64::MAX / 2]) {
            let level = level_for_xp(xp);
            assert!(xp_for_level(level) <= xp, "xp {} below its level floor", xp);
            assert!(xp < xp_for_level(level + 1), "xp {} reaches next level", xp);
        }
    }

    #[test]
    fn test_progress_percent() {
        // level 1 spans 10..40
        assert_eq!(progress_to_next_level(10), 0);
        assert_eq!(progress_to_next_level(25), 50);
        assert_eq!(progress_to_next_level(39), 96);
        assert_eq!(progress_to_next_level(40), 0);
    }

    #[test]
    fn test_isqrt_exact_squares() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
    }

    #[test]
    fn test_level_progress_bundle() {
        let p = LevelProgress::from_xp(250);
        assert_eq!(p.level, 5);
        assert_eq!(p.current_level_xp, 250);
        assert_eq!(p.next_level_xp, 360);
        assert_eq!(p.xp_to_next(), 110);
        assert_eq!(p.title, LevelTitle::Trader);
    }
}
