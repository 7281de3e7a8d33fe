//! Type definitions for the signal lifecycle engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Direction sign applied to price differences when computing P&L.
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Lifecycle status of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    /// Entry level published, waiting for price to cross it
    #[serde(rename = "WAITING_FOR_ENTRY")]
    Waiting,
    /// Entry crossed, TP/SL now armed
    #[serde(rename = "ENTRY_HIT")]
    Active,
    #[serde(rename = "CLOSED_TP")]
    ClosedTp,
    #[serde(rename = "CLOSED_SL")]
    ClosedSl,
    #[serde(rename = "CLOSED_TIMEOUT")]
    ClosedTimeout,
    /// Entry window elapsed without the entry level being crossed
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl SignalStatus {
    /// A live signal blocks generation of a new one.
    pub fn is_live(&self) -> bool {
        matches!(self, SignalStatus::Waiting | SignalStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SignalStatus::ClosedTp
                | SignalStatus::ClosedSl
                | SignalStatus::ClosedTimeout
                | SignalStatus::Expired
        )
    }
}

/// A proposed trade awaiting or undergoing execution in the simulation.
///
/// Tick indices (`*_tick` fields) are the deterministic clock; the
/// `created_at` wall-clock stamp exists for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: u32,
    pub side: Side,
    pub entry_price: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Synthesized confidence percentage (70..95)
    pub confidence: u8,
    pub status: SignalStatus,
    pub created_at_tick: u64,
    pub activated_at_tick: Option<u64>,
    pub closed_at_tick: Option<u64>,
    /// Unix milliseconds, display only
    pub created_at: i64,
}

impl Signal {
    /// Builds a WAITING signal. Level ordering is not validated here: the
    /// engine's own synthesis guarantees side-consistent levels, while
    /// externally supplied signals are accepted as-is (a caller error, not
    /// an engine error).
    pub fn new(
        id: u32,
        side: Side,
        entry_price: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
        confidence: u8,
        created_at_tick: u64,
    ) -> Self {
        Self {
            id,
            side,
            entry_price,
            take_profit,
            stop_loss,
            confidence,
            status: SignalStatus::Waiting,
            created_at_tick,
            activated_at_tick: None,
            closed_at_tick: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Derived outcome of a closed signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalResult {
    Profit,
    Loss,
    Cancelled,
}

/// Immutable snapshot of a closed signal, kept most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHistoryEntry {
    pub id: u32,
    pub side: Side,
    /// Entry price formatted to 5 decimal places
    pub entry: String,
    pub status: SignalStatus,
    pub result: SignalResult,
}

/// Running win/loss statistics.
///
/// `total` counts every terminal closure while `wins`/`losses` only count
/// TP/SL closures, so `total != wins + losses` once a signal expires or
/// times out. That asymmetry is inherited behavior and kept as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
}

impl Stats {
    /// Win rate as a percentage of all terminal closures.
    pub fn win_rate(&self) -> Decimal {
        if self.total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.wins) / Decimal::from(self.total) * Decimal::from(100)
    }
}

/// Status of a simulated position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Why a position was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "TP_HIT")]
    TpHit,
    #[serde(rename = "SL_HIT")]
    SlHit,
    #[serde(rename = "MANUAL_CLOSE")]
    Manual,
}

/// An opened simulated trade tracked for P&L until closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub side: Side,
    pub symbol: String,
    pub entry_price: Decimal,
    /// Zero disables the take-profit trigger
    pub take_profit: Decimal,
    /// Zero disables the stop-loss trigger
    pub stop_loss: Decimal,
    /// Lot size
    pub size: Decimal,
    pub status: PositionStatus,
    /// Floating P&L, recomputed on every tick while open
    pub pnl: Decimal,
    /// Realized P&L, fixed exactly once at close
    pub profit: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub close_reason: Option<CloseReason>,
    /// Unix milliseconds
    pub opened_at: i64,
    pub closed_at: Option<i64>,
}

/// Pip distances used when synthesizing signal levels.
///
/// Defaults mirror the dashboard quick-panel: TP 10, SL 10, entry offset 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub tp_pips: u32,
    pub sl_pips: u32,
    pub entry_offset_pips: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            tp_pips: 10,
            sl_pips: 10,
            entry_offset_pips: 5,
        }
    }
}

impl RiskConfig {
    /// Merges provided fields over the current values. Unset fields keep
    /// their prior value; the result only affects signals generated later.
    pub fn merge(&mut self, update: RiskConfigUpdate) {
        if let Some(tp) = update.tp_pips {
            self.tp_pips = tp;
        }
        if let Some(sl) = update.sl_pips {
            self.sl_pips = sl;
        }
        if let Some(offset) = update.entry_offset_pips {
            self.entry_offset_pips = offset;
        }
    }
}

/// Partial risk configuration update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfigUpdate {
    pub tp_pips: Option<u32>,
    pub sl_pips: Option<u32>,
    pub entry_offset_pips: Option<u32>,
}

/// Errors raised at the engine boundary for externally supplied operations.
///
/// Internal tick logic is infallible: all inputs are self-generated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("entry price must be positive, got {0}")]
    InvalidPrice(Decimal),
    #[error("position size must be positive, got {0}")]
    InvalidSize(Decimal),
    #[error("unknown position id: {0}")]
    UnknownPosition(String),
}
