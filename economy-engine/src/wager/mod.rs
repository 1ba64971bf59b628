//! The chance element of a wager.
//!
//! The odds are fixed constants. Only the source of the coin flip is
//! pluggable, so tests can force outcomes.

use rand::Rng;

pub mod fixed;

/// Smallest stake accepted by a wager.
pub const MIN_STAKE: i64 = 500;

/// Probability that a wager wins.
pub const WIN_PROBABILITY: f64 = 0.3;

/// On a win the stake is still lost and `floor(stake * 3 / 10)` is paid back.
pub fn payout(stake: i64) -> i64 {
    // Split to keep `stake * 3` from overflowing near i64::MAX.
    stake / 10 * 3 + stake % 10 * 3 / 10
}

/// Decides whether a wager wins.
pub trait Fortune: Send + Sync {
    fn wins(&self) -> bool;
}

/// Draws from the thread-local RNG with [`WIN_PROBABILITY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomFortune;

impl Fortune for RandomFortune {
    fn wins(&self) -> bool {
        rand::thread_rng().gen_bool(WIN_PROBABILITY)
    }
}
