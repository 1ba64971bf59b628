//! # Event Bus
//!
//! Fan-out of everything the outward render layer may want to show without
//! polling: the market board after every tick, and every settled receipt.
//!
//! Publishing never blocks and never fails. A slow subscriber skips old
//! events (`Lagged`) instead of slowing down the engine.

use crate::models::Receipt;
use economy::MarketSnapshot;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum EconomyEvent {
    /// **Simulator**: prices after one tick.
    MarketUpdated(MarketSnapshot),

    /// **Engine**: an operation settled.
    Settled(Receipt),
}

/// A wrapper around a tokio broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EconomyEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// See [`tokio::sync::broadcast::Sender::send`] for details.
    pub fn publish(&self, event: EconomyEvent) {
        // No subscribers is fine (e.g. headless runs and tests).
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.sender.subscribe()
    }
}
