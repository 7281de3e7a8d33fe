//! Signal engine demo
//!
//! Runs the simulation in auto mode for a few hundred ticks with a console
//! renderer, opens one manual position along the way, and prints the final
//! account and stats summary.

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use signal_engine::callbacks::EngineCallbacks;
use signal_engine::types::{CloseReason, Side, Signal, SignalHistoryEntry, Stats};
use signal_engine::{EngineConfig, SignalEngine};

/// Renders engine notifications to the log.
struct ConsoleRenderer {
    ticks_seen: u64,
}

impl EngineCallbacks for ConsoleRenderer {
    fn on_price_update(&mut self, formatted_price: &str, _window: &[Decimal]) {
        self.ticks_seen += 1;
        if self.ticks_seen % 50 == 0 {
            info!(price = formatted_price, tick = self.ticks_seen, "market");
        }
    }

    fn on_signal_update(&mut self, signal: Option<&Signal>) {
        match signal {
            Some(sig) => info!(
                id = sig.id,
                side = ?sig.side,
                status = ?sig.status,
                "signal update"
            ),
            None => info!("signal slot cleared"),
        }
    }

    fn on_history_update(&mut self, history: &[SignalHistoryEntry], stats: &Stats) {
        info!(
            closed = history.len(),
            total = stats.total,
            wins = stats.wins,
            losses = stats.losses,
            win_rate = %stats.win_rate().round_dp(1),
            "history update"
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = EngineConfig {
        auto_mode: true,
        ..Default::default()
    };
    let mut engine = SignalEngine::new(config, Box::new(ConsoleRenderer { ticks_seen: 0 }));

    // Kick one signal off immediately rather than waiting for auto cadence.
    engine.generate_signal();

    for tick in 1..=400u32 {
        engine.tick();

        if tick == 100 {
            let price = engine.current_price();
            let id = engine.open_position(
                Side::Buy,
                "EURUSD",
                price,
                price + dec!(0.0010),
                price - dec!(0.0010),
                dec!(1),
            )?;
            info!(id = %id, entry = %price, "manual position opened");
        }
    }

    // Flatten anything still open before the summary.
    let open_ids: Vec<String> = engine.open_positions().iter().map(|p| p.id.clone()).collect();
    for id in open_ids {
        let profit = engine.close_position(&id, CloseReason::Manual)?;
        info!(id = %id, profit = %profit.round_dp(2), "flattened");
    }

    let summary = serde_json::json!({
        "ticks": engine.tick_count(),
        "final_price": engine.current_price(),
        "balance": engine.balance(),
        "equity": engine.equity(),
        "stats": engine.stats(),
        "signals_closed": engine.signal_history().len(),
        "positions_closed": engine.position_history().len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
