//! # Market Simulator
//!
//! A trend-biased random walk over the whole instrument catalog.
//!
//! A tick reads the market table, draws one delta per instrument, bends it to
//! the instrument's trend and writes `max(price + delta, 1)` back. It never
//! looks at accounts or their locks; trades may see a price one tick old.

use economy::{Instrument, MarketStore, StoreError, Trend};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub mod catalog;
pub mod ticker;

pub use catalog::default_catalog;
pub use ticker::run_ticker;

/// Default bound of the per-tick delta: draws come from `[-50, 49]`.
pub const DEFAULT_MAX_DELTA: i64 = 50;

/// One instrument's price change during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceMove {
    pub instrument: String,
    pub trend: Trend,
    pub from: u64,
    pub to: u64,
}

impl PriceMove {
    pub fn delta(&self) -> i128 {
        self.to as i128 - self.from as i128
    }
}

/// Applies a signed delta, never going below 1.
pub fn apply_delta(price: u64, delta: i64) -> u64 {
    price.saturating_add_signed(delta).max(1)
}

pub struct MarketSimulator {
    market: Arc<dyn MarketStore>,
    rng: Mutex<StdRng>,
    max_delta: i64,
    ticks: AtomicU64,
}

impl MarketSimulator {
    pub fn new(market: Arc<dyn MarketStore>, max_delta: i64) -> Self {
        Self::with_rng(market, max_delta, StdRng::from_entropy())
    }

    /// Deterministic simulator for replays and tests.
    pub fn seeded(market: Arc<dyn MarketStore>, max_delta: i64, seed: u64) -> Self {
        Self::with_rng(market, max_delta, StdRng::seed_from_u64(seed))
    }

    fn with_rng(market: Arc<dyn MarketStore>, max_delta: i64, rng: StdRng) -> Self {
        Self {
            market,
            rng: Mutex::new(rng),
            max_delta: max_delta.max(1),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn max_delta(&self) -> i64 {
        self.max_delta
    }

    /// Number of ticks fully applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn draw(&self, instrument: &Instrument) -> i64 {
        let raw = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(-self.max_delta..self.max_delta);
        instrument.trend().bias(raw)
    }

    /// Moves every instrument once.
    ///
    /// Stops at the first store failure; instruments already written keep
    /// their new price and the rest wait for the next tick.
    pub fn tick(&self) -> Result<Vec<PriceMove>, StoreError> {
        let instruments = self.market.list_instruments()?;
        let mut moves = Vec::with_capacity(instruments.len());

        for instrument in instruments {
            let delta = self.draw(&instrument);
            let to = apply_delta(instrument.price(), delta);
            self.market.set_price(instrument.name(), to)?;

            debug!(
                "{} ({}) {} -> {}",
                instrument.name(),
                instrument.trend(),
                instrument.price(),
                to
            );
            moves.push(PriceMove {
                instrument: instrument.name().to_string(),
                trend: instrument.trend(),
                from: instrument.price(),
                to,
            });
        }

        self.ticks.fetch_add(1, Ordering::SeqCst);
        Ok(moves)
    }
}
