//! Render/callback boundary
//!
//! The only coupling between the engine and the outside world. Callbacks are
//! invoked synchronously at the end of the triggering operation; a slow
//! handler stretches tick cadence proportionally since there is no internal
//! queue. Consumers may render, log, or ignore payloads, but never mutate
//! engine state through this boundary.

use rust_decimal::Decimal;

use crate::types::{Signal, SignalHistoryEntry, Stats};

/// The three notification channels the engine publishes on.
pub trait EngineCallbacks {
    /// New tick: price formatted for display plus the recent-history window.
    fn on_price_update(&mut self, _formatted_price: &str, _window: &[Decimal]) {}

    /// The live signal changed state, or the slot cleared (`None`).
    fn on_signal_update(&mut self, _signal: Option<&Signal>) {}

    /// A terminal closure appended to history and updated the stats.
    fn on_history_update(&mut self, _history: &[SignalHistoryEntry], _stats: &Stats) {}
}

/// Callback set that discards every notification.
pub struct NoopCallbacks;

impl EngineCallbacks for NoopCallbacks {}
