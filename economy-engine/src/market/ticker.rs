use crate::engine::Engine;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Drives [`Engine::run_market_tick`] on a fixed period until `shutdown`
/// flips to true (or its sender is dropped).
///
/// A failed tick is logged and the loop simply waits for the next period.
pub async fn run_ticker(engine: Arc<Engine>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Market ticker armed: every {:?}", period);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if let Err(e) = engine.run_market_tick() {
                    error!("Market tick failed, waiting for next period: {}", e);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Market ticker stopped");
}
