//! Signal lifecycle state machine
//!
//! Owns at most one signal at a time and advances it against each price
//! tick: WAITING until the entry level is crossed, then ACTIVE until TP, SL,
//! or the active-duration limit closes it. Terminal signals stay in the slot
//! for a short settlement-display window (cleared by a scheduled task) and
//! block new generation for its duration.

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::precision::{format_price, level_distance};
use crate::types::{
    RiskConfig, RiskConfigUpdate, Side, Signal, SignalHistoryEntry, SignalResult, SignalStatus,
    Stats,
};

/// What a tick did to the live signal, for the caller to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Entry level crossed, signal is now ACTIVE
    Activated,
    /// Terminal transition; history and stats were updated
    Closed {
        status: SignalStatus,
        result: SignalResult,
    },
}

enum Decision {
    Activate,
    Close(SignalStatus, &'static str),
    Hold,
}

/// The lifecycle state machine plus its outcome log and running stats.
pub struct SignalMachine {
    active: Option<Signal>,
    /// Most-recent-first outcome log, unbounded
    history: Vec<SignalHistoryEntry>,
    stats: Stats,
    risk: RiskConfig,
    entry_timeout_ticks: u64,
    max_active_ticks: u64,
    /// Next synthesized id; monotonic so a new signal never reuses the id
    /// of a historical record.
    next_id: u32,
}

impl SignalMachine {
    pub fn new(risk: RiskConfig, entry_timeout_ticks: u64, max_active_ticks: u64) -> Self {
        Self {
            active: None,
            history: Vec::new(),
            stats: Stats::default(),
            risk,
            entry_timeout_ticks,
            max_active_ticks,
            next_id: 1000,
        }
    }

    /// True while the slot is populated, live or settled-but-displayed.
    /// Generation is rejected for the whole window.
    pub fn is_occupied(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Signal> {
        self.active.as_ref()
    }

    /// The signal currently counting toward the single-liveness invariant.
    pub fn live(&self) -> Option<&Signal> {
        self.active.as_ref().filter(|s| s.status.is_live())
    }

    pub fn history(&self) -> &[SignalHistoryEntry] {
        &self.history
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn risk(&self) -> RiskConfig {
        self.risk
    }

    pub fn set_risk_config(&mut self, update: RiskConfigUpdate) {
        self.risk.merge(update);
        info!(
            tp_pips = self.risk.tp_pips,
            sl_pips = self.risk.sl_pips,
            entry_offset_pips = self.risk.entry_offset_pips,
            "risk config updated"
        );
    }

    /// Synthesizes and installs a new WAITING signal from the current price
    /// and the configured pip distances. Silent no-op while the slot is
    /// occupied, preserving single-liveness.
    pub fn synthesize<R: Rng>(&mut self, rng: &mut R, price: Decimal, tick: u64) -> Option<&Signal> {
        if self.is_occupied() {
            debug!("signal generation rejected: slot occupied");
            return None;
        }

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let offset = level_distance(self.risk.entry_offset_pips);
        let tp_dist = level_distance(self.risk.tp_pips);
        let sl_dist = level_distance(self.risk.sl_pips);

        let (entry, tp, sl) = match side {
            Side::Buy => (price + offset, price + offset + tp_dist, price + offset - sl_dist),
            Side::Sell => (price - offset, price - offset - tp_dist, price - offset + sl_dist),
        };

        let id = self.next_id;
        self.next_id += 1;
        let confidence = rng.gen_range(70u8..95);
        let signal = Signal::new(id, side, entry, tp, sl, confidence, tick);

        info!(
            id,
            side = ?side,
            entry = %format_price(entry),
            tp = %format_price(tp),
            sl = %format_price(sl),
            confidence,
            "new signal published"
        );
        self.active = Some(signal);
        self.active.as_ref()
    }

    /// Installs an externally supplied signal (e.g. read from a remote
    /// store) instead of synthesizing one. Returns false without touching
    /// state if the slot is occupied.
    pub fn adopt(&mut self, signal: Signal) -> bool {
        if self.is_occupied() {
            debug!(id = signal.id, "adopt rejected: slot occupied");
            return false;
        }
        info!(id = signal.id, side = ?signal.side, "signal adopted");
        // Keep later synthesized ids clear of the adopted one.
        self.next_id = self.next_id.max(signal.id.saturating_add(1));
        self.active = Some(signal);
        true
    }

    /// Advances the live signal against the new price. Terminal signals
    /// still in the settlement-display window are left untouched.
    pub fn on_tick(&mut self, price: Decimal, tick: u64) -> Option<LifecycleEvent> {
        let decision = {
            let sig = self.active.as_ref()?;
            match sig.status {
                SignalStatus::Waiting => {
                    let entry_crossed = match sig.side {
                        Side::Buy => price >= sig.entry_price,
                        Side::Sell => price <= sig.entry_price,
                    };
                    if entry_crossed {
                        Decision::Activate
                    } else if tick.saturating_sub(sig.created_at_tick) > self.entry_timeout_ticks {
                        Decision::Close(SignalStatus::Expired, "entry window expired")
                    } else {
                        Decision::Hold
                    }
                }
                SignalStatus::Active => {
                    let tp_crossed = match sig.side {
                        Side::Buy => price >= sig.take_profit,
                        Side::Sell => price <= sig.take_profit,
                    };
                    let sl_crossed = match sig.side {
                        Side::Buy => price <= sig.stop_loss,
                        Side::Sell => price >= sig.stop_loss,
                    };
                    let active_age =
                        tick.saturating_sub(sig.activated_at_tick.unwrap_or(sig.created_at_tick));
                    // TP strictly before SL keeps the outcome deterministic
                    // when a single tick satisfies both levels.
                    if tp_crossed {
                        Decision::Close(SignalStatus::ClosedTp, "take profit reached")
                    } else if sl_crossed {
                        Decision::Close(SignalStatus::ClosedSl, "stop loss hit")
                    } else if active_age > self.max_active_ticks {
                        Decision::Close(SignalStatus::ClosedTimeout, "active duration limit exceeded")
                    } else {
                        Decision::Hold
                    }
                }
                _ => Decision::Hold,
            }
        };

        match decision {
            Decision::Activate => {
                let sig = self.active.as_mut()?;
                sig.status = SignalStatus::Active;
                sig.activated_at_tick = Some(tick);
                info!(id = sig.id, "entry hit, signal is now active");
                Some(LifecycleEvent::Activated)
            }
            Decision::Close(status, reason) => self.close(status, tick, reason),
            Decision::Hold => None,
        }
    }

    /// Clears the slot once the settlement-display window elapsed. Guarded
    /// against stale scheduling: only clears if the slot still holds this
    /// exact terminal signal.
    pub fn clear_settled(&mut self, signal_id: u32) -> bool {
        let matches = self
            .active
            .as_ref()
            .map(|s| s.id == signal_id && s.status.is_terminal())
            .unwrap_or(false);
        if matches {
            debug!(id = signal_id, "settled signal cleared");
            self.active = None;
        }
        matches
    }

    fn close(
        &mut self,
        status: SignalStatus,
        tick: u64,
        reason: &'static str,
    ) -> Option<LifecycleEvent> {
        let sig = self.active.as_mut()?;
        sig.status = status;
        sig.closed_at_tick = Some(tick);

        let result = match status {
            SignalStatus::ClosedTp => {
                self.stats.wins += 1;
                info!(id = sig.id, reason, "signal closed");
                SignalResult::Profit
            }
            SignalStatus::ClosedSl => {
                self.stats.losses += 1;
                warn!(id = sig.id, reason, "signal closed");
                SignalResult::Loss
            }
            _ => {
                warn!(id = sig.id, reason, "signal closed");
                SignalResult::Cancelled
            }
        };
        // Timeout/expiry closures bump total without scoring a win or loss.
        self.stats.total += 1;

        self.history.insert(
            0,
            SignalHistoryEntry {
                id: sig.id,
                side: sig.side,
                entry: format_price(sig.entry_price),
                status,
                result,
            },
        );

        Some(LifecycleEvent::Closed { status, result })
    }
}
