//! Position ledger and account state
//!
//! Tracks open simulated positions against the live price feed: floating
//! P&L is recomputed on every tick, TP/SL crossings auto-close at the
//! crossing tick's price, and the account balance absorbs each realized
//! profit exactly once at close.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::precision::position_pnl;
use crate::types::{CloseReason, EngineError, Position, PositionStatus, Side};

/// Default starting endowment for the simulated account.
pub const DEFAULT_INITIAL_BALANCE: Decimal = dec!(50000);

/// The simulated account: balance, open positions, and closed history.
pub struct PositionLedger {
    balance: Decimal,
    initial_balance: Decimal,
    positions: Vec<Position>,
    /// Closed positions, most recent first
    history: Vec<Position>,
    current_price: Decimal,
    next_order: u64,
}

impl PositionLedger {
    /// `start_price` seeds the mark price so a close issued before the
    /// first tick still settles against a real quote.
    pub fn new(initial_balance: Decimal, start_price: Decimal) -> Self {
        Self {
            balance: initial_balance,
            initial_balance,
            positions: Vec::new(),
            history: Vec::new(),
            current_price: start_price,
            next_order: 1,
        }
    }

    /// Opens a position with zero initial P&L and returns its order id.
    /// Only presence is validated: equal or inverted TP/SL levels are
    /// accepted as a caller error, not a ledger error.
    pub fn open(
        &mut self,
        side: Side,
        symbol: &str,
        entry_price: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
        size: Decimal,
    ) -> Result<String, EngineError> {
        if entry_price <= Decimal::ZERO {
            return Err(EngineError::InvalidPrice(entry_price));
        }
        if size <= Decimal::ZERO {
            return Err(EngineError::InvalidSize(size));
        }

        let id = format!("ord_{}", self.next_order);
        let position = Position {
            id: id.clone(),
            side,
            symbol: symbol.to_string(),
            entry_price,
            take_profit,
            stop_loss,
            size,
            status: PositionStatus::Open,
            pnl: Decimal::ZERO,
            profit: None,
            close_price: None,
            close_reason: None,
            opened_at: chrono::Utc::now().timestamp_millis(),
            closed_at: None,
        };
        self.next_order += 1;

        info!(
            id = %position.id,
            side = ?side,
            symbol,
            entry = %entry_price,
            size = %size,
            "order opened"
        );
        self.positions.push(position);
        Ok(id)
    }

    /// Re-marks every open position against the new price and auto-closes
    /// those whose TP (checked first) or SL level is crossed. Settlement
    /// happens at the crossing tick's price, not at the level itself.
    pub fn tick(&mut self, price: Decimal) {
        if price <= Decimal::ZERO {
            return;
        }
        self.current_price = price;

        let mut to_close = Vec::new();
        for position in &mut self.positions {
            position.pnl = position_pnl(
                position.side.sign(),
                position.entry_price,
                price,
                position.size,
            );

            // A zero level disables the trigger.
            let tp_crossed = position.take_profit > Decimal::ZERO
                && match position.side {
                    Side::Buy => price >= position.take_profit,
                    Side::Sell => price <= position.take_profit,
                };
            let sl_crossed = position.stop_loss > Decimal::ZERO
                && match position.side {
                    Side::Buy => price <= position.stop_loss,
                    Side::Sell => price >= position.stop_loss,
                };

            if tp_crossed {
                to_close.push((position.id.clone(), CloseReason::TpHit));
            } else if sl_crossed {
                to_close.push((position.id.clone(), CloseReason::SlHit));
            }
        }

        for (id, reason) in to_close {
            // The position cannot have vanished between the scan and here;
            // ignore the impossible error rather than panic in the tick loop.
            let _ = self.close(&id, reason);
        }
    }

    /// Settles a position at the current price: fixes `profit`, updates the
    /// balance exactly once, and moves the record to the history front.
    pub fn close(&mut self, id: &str, reason: CloseReason) -> Result<Decimal, EngineError> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownPosition(id.to_string()))?;

        let mut position = self.positions.remove(idx);
        let profit = position_pnl(
            position.side.sign(),
            position.entry_price,
            self.current_price,
            position.size,
        );

        position.status = PositionStatus::Closed;
        position.pnl = profit;
        position.profit = Some(profit);
        position.close_price = Some(self.current_price);
        position.close_reason = Some(reason);
        position.closed_at = Some(chrono::Utc::now().timestamp_millis());

        self.balance += profit;
        info!(
            id = %position.id,
            reason = ?reason,
            profit = %profit,
            balance = %self.balance,
            "order closed"
        );
        self.history.insert(0, position);
        Ok(profit)
    }

    /// Restores the initial endowment and drops all positions and history.
    /// Irreversible; confirmation is the caller's responsibility.
    pub fn reset(&mut self) {
        debug!(balance = %self.initial_balance, "account reset");
        self.balance = self.initial_balance;
        self.positions.clear();
        self.history.clear();
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Balance plus the floating P&L of every open position, computed on
    /// demand and never stored.
    pub fn equity(&self) -> Decimal {
        self.balance + self.positions.iter().map(|p| p.pnl).sum::<Decimal>()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn history(&self) -> &[Position] {
        &self.history
    }
}
