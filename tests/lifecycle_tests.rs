//! End-to-end tests for the signal lifecycle and position ledger

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rust_decimal_macros::dec;

use signal_engine::ledger::PositionLedger;
use signal_engine::signal::{LifecycleEvent, SignalMachine};
use signal_engine::store::SignalStore;
use signal_engine::types::{
    CloseReason, RiskConfig, Side, Signal, SignalResult, SignalStatus,
};
use signal_engine::{EngineConfig, SignalEngine};

fn waiting_signal(id: u32, side: Side, entry: &str, tp: &str, sl: &str) -> Signal {
    Signal::new(
        id,
        side,
        entry.parse().unwrap(),
        tp.parse().unwrap(),
        sl.parse().unwrap(),
        80,
        0,
    )
}

#[test]
fn at_most_one_signal_is_ever_live() {
    let mut engine = SignalEngine::with_noop(EngineConfig::default());

    engine.generate_signal();
    // A second request during the analysis window is a no-op.
    engine.generate_signal();

    for _ in 0..3 {
        engine.tick();
    }
    let first_id = engine.live_signal().expect("signal published").id;

    // A request while a signal is live is also a no-op.
    engine.generate_signal();
    engine.tick();
    assert_eq!(engine.live_signal().map(|s| s.id), Some(first_id));
}

#[test]
fn entry_crossing_happens_exactly_at_the_entry_tick() {
    let mut machine = SignalMachine::new(RiskConfig::default(), 60, 180);
    assert!(machine.adopt(waiting_signal(1, Side::Buy, "1.0851", "1.0861", "1.0841")));

    assert_eq!(machine.on_tick(dec!(1.0850), 1), None);
    assert_eq!(machine.active().unwrap().status, SignalStatus::Waiting);

    assert_eq!(
        machine.on_tick(dec!(1.0851), 2),
        Some(LifecycleEvent::Activated)
    );
    let sig = machine.active().unwrap();
    assert_eq!(sig.status, SignalStatus::Active);
    assert_eq!(sig.activated_at_tick, Some(2));

    // And not again on the next tick.
    assert_eq!(machine.on_tick(dec!(1.0852), 3), None);
}

#[test]
fn take_profit_wins_when_both_levels_are_satisfied() {
    // Inverted TP/SL (a config error the machine accepts from a caller):
    // a single price can satisfy both branches at once.
    let mut machine = SignalMachine::new(RiskConfig::default(), 60, 180);
    assert!(machine.adopt(waiting_signal(2, Side::Buy, "1.0800", "1.0790", "1.0810")));

    assert_eq!(
        machine.on_tick(dec!(1.0800), 1),
        Some(LifecycleEvent::Activated)
    );
    assert_eq!(
        machine.on_tick(dec!(1.0795), 2),
        Some(LifecycleEvent::Closed {
            status: SignalStatus::ClosedTp,
            result: SignalResult::Profit,
        })
    );
}

#[test]
fn terminal_signals_are_immutable_on_later_ticks() {
    let mut machine = SignalMachine::new(RiskConfig::default(), 60, 180);
    assert!(machine.adopt(waiting_signal(3, Side::Sell, "1.0850", "1.0840", "1.0860")));

    machine.on_tick(dec!(1.0850), 1); // activates
    machine.on_tick(dec!(1.0840), 2); // TP
    let settled = machine.active().cloned().unwrap();
    assert_eq!(settled.status, SignalStatus::ClosedTp);

    for (i, price) in [dec!(1.0900), dec!(1.0700), dec!(1.0840)].iter().enumerate() {
        assert_eq!(machine.on_tick(*price, 3 + i as u64), None);
        assert_eq!(machine.active(), Some(&settled));
    }
}

#[test]
fn expiry_increments_total_but_not_wins_or_losses() {
    let mut machine = SignalMachine::new(RiskConfig::default(), 5, 180);
    assert!(machine.adopt(waiting_signal(4, Side::Buy, "1.0860", "1.0870", "1.0850")));

    // Price never reaches the entry level; the wait times out after 5 ticks.
    let mut event = None;
    for tick in 1..=10 {
        event = machine.on_tick(dec!(1.0855), tick);
        if event.is_some() {
            break;
        }
    }
    assert_eq!(
        event,
        Some(LifecycleEvent::Closed {
            status: SignalStatus::Expired,
            result: SignalResult::Cancelled,
        })
    );
    let stats = machine.stats();
    assert_eq!((stats.total, stats.wins, stats.losses), (1, 0, 0));
}

#[test]
fn signal_history_is_most_recent_first() {
    let mut machine = SignalMachine::new(RiskConfig::default(), 60, 180);
    for id in 1..=3u32 {
        assert!(machine.adopt(waiting_signal(id, Side::Buy, "1.0850", "1.0860", "1.0840")));
        machine.on_tick(dec!(1.0850), 1); // activate
        machine.on_tick(dec!(1.0860), 2); // TP
        assert!(machine.clear_settled(id));
    }

    let history = machine.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].id, 3);
    assert_eq!(history[2].id, 1);
    assert_eq!(machine.stats().wins, 3);
}

#[test]
fn balance_updates_by_exactly_the_realized_profit() {
    let mut ledger = PositionLedger::new(dec!(50000), dec!(1.0850));
    ledger
        .open(
            Side::Buy,
            "EURUSD",
            dec!(1.0850),
            dec!(0),
            dec!(0),
            dec!(2),
        )
        .unwrap();

    ledger.tick(dec!(1.0875));
    let profit = ledger.close("ord_1", CloseReason::Manual).unwrap();

    // (1.0875 - 1.0850) * 10000 * 2 * 10
    assert_eq!(profit, dec!(500));
    assert_eq!(ledger.balance(), dec!(50500));

    // Settlement is applied exactly once; later ticks leave it alone.
    ledger.tick(dec!(1.0900));
    assert_eq!(ledger.balance(), dec!(50500));
    assert_eq!(ledger.history()[0].profit, Some(dec!(500)));
}

#[test]
fn ledger_auto_close_settles_at_the_crossing_price() {
    let mut ledger = PositionLedger::new(dec!(50000), dec!(1.0850));
    ledger
        .open(
            Side::Buy,
            "EURUSD",
            dec!(1.0850),
            dec!(1.0860),
            dec!(1.0840),
            dec!(1),
        )
        .unwrap();

    // Price gaps past the TP level: settlement uses the tick price, not
    // the level.
    ledger.tick(dec!(1.0862));
    assert!(ledger.positions().is_empty());

    let closed = &ledger.history()[0];
    assert_eq!(closed.close_reason, Some(CloseReason::TpHit));
    assert_eq!(closed.close_price, Some(dec!(1.0862)));
    assert_eq!(closed.profit, Some(dec!(120)));
    assert_eq!(ledger.balance(), dec!(50120));
}

#[test]
fn ledger_history_is_most_recent_first() {
    let mut ledger = PositionLedger::new(dec!(50000), dec!(1.0850));
    for _ in 0..3 {
        ledger
            .open(Side::Buy, "EURUSD", dec!(1.0850), dec!(0), dec!(0), dec!(1))
            .unwrap();
    }
    ledger.tick(dec!(1.0851));
    ledger.close("ord_1", CloseReason::Manual).unwrap();
    ledger.close("ord_2", CloseReason::Manual).unwrap();
    ledger.close("ord_3", CloseReason::Manual).unwrap();

    let history = ledger.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].id, "ord_3");
    assert_eq!(history[2].id, "ord_1");
}

#[test]
fn equity_is_balance_plus_floating_pnl() {
    let mut ledger = PositionLedger::new(dec!(50000), dec!(1.0850));
    ledger
        .open(Side::Buy, "EURUSD", dec!(1.0850), dec!(0), dec!(0), dec!(1))
        .unwrap();
    ledger
        .open(Side::Sell, "EURUSD", dec!(1.0850), dec!(0), dec!(0), dec!(1))
        .unwrap();

    // Opposite sides cancel out; equity stays at the balance.
    ledger.tick(dec!(1.0860));
    assert_eq!(ledger.equity(), dec!(50000));

    ledger.close("ord_2", CloseReason::Manual).unwrap();
    assert_eq!(ledger.balance(), dec!(49900));
    assert_eq!(ledger.equity(), dec!(50000));
}

#[test]
fn manual_close_before_the_first_tick_settles_at_the_start_price() {
    let mut engine = SignalEngine::with_noop(EngineConfig::default());
    let id = engine
        .open_position(Side::Buy, "EURUSD", dec!(1.08450), dec!(0), dec!(0), dec!(1))
        .unwrap();

    // No tick has been issued yet; settlement uses the configured start
    // price, not an unset quote.
    let profit = engine.close_position(&id, CloseReason::Manual).unwrap();
    assert_eq!(profit, dec!(0));
    assert_eq!(engine.balance(), dec!(50000));
    assert_eq!(engine.position_history()[0].close_price, Some(dec!(1.08450)));
}

#[test]
fn closed_records_survive_later_signal_generations() {
    let mut engine = SignalEngine::with_noop(EngineConfig::default());
    let settle_delay = EngineConfig::default().settle_delay_ticks;

    let mut closed_ids = Vec::new();
    for _ in 0..3 {
        engine.generate_signal();
        while engine.active_signal().is_none() {
            engine.tick_with_price(dec!(1.08450));
        }
        let sig = engine.active_signal().cloned().unwrap();
        closed_ids.push(sig.id);

        engine.tick_with_price(sig.entry_price);
        engine.tick_with_price(sig.take_profit);
        for _ in 0..=settle_delay {
            engine.tick_with_price(dec!(1.08450));
        }
        assert!(engine.active_signal().is_none());
    }

    // Every closed record is still queryable under its own id.
    let closed = engine.store().recent_closed(10);
    assert_eq!(closed.len(), 3);
    let mut ids: Vec<u32> = closed.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    closed_ids.sort_unstable();
    assert_eq!(ids, closed_ids);
}

#[test]
fn price_window_evicts_fifo_at_capacity() {
    let mut engine = SignalEngine::with_noop(EngineConfig {
        price_window_len: 20,
        ..Default::default()
    });

    // capacity + 5 externally supplied ticks
    for i in 0..25u32 {
        engine.tick_with_price(dec!(1.08) + rust_decimal::Decimal::new(i.into(), 4));
    }
    let window = engine.price_window();
    assert_eq!(window.len(), 20);
    // The first five generated prices were evicted.
    assert_eq!(window[0], dec!(1.08) + rust_decimal::Decimal::new(5, 4));
    assert_eq!(window[19], dec!(1.08) + rust_decimal::Decimal::new(24, 4));
}

#[test]
fn full_engine_lifecycle_from_request_to_cleared_slot() {
    let config = EngineConfig::default();
    let settle_delay = config.settle_delay_ticks;
    let mut engine = SignalEngine::with_noop(config);

    engine.generate_signal();
    while engine.active_signal().is_none() {
        engine.tick_with_price(dec!(1.08450));
    }

    let sig = engine.active_signal().cloned().unwrap();
    assert_eq!(sig.status, SignalStatus::Waiting);
    assert_eq!(engine.store().latest_live().map(|s| s.id), Some(sig.id));

    // Cross the entry level, then the take-profit level.
    engine.tick_with_price(sig.entry_price);
    assert_eq!(
        engine.active_signal().unwrap().status,
        SignalStatus::Active
    );

    engine.tick_with_price(sig.take_profit);
    assert_eq!(
        engine.active_signal().unwrap().status,
        SignalStatus::ClosedTp
    );
    assert_eq!(engine.stats().wins, 1);
    assert_eq!(engine.signal_history()[0].result, SignalResult::Profit);

    // The settled signal keeps blocking generation until the slot clears.
    engine.generate_signal();
    assert_eq!(engine.active_signal().map(|s| s.id), Some(sig.id));

    for _ in 0..=settle_delay {
        engine.tick_with_price(dec!(1.08450));
    }
    assert!(engine.active_signal().is_none());
    assert!(engine.store().latest_live().is_none());
    assert_eq!(engine.store().recent_closed(10).len(), 1);

    // The slot is free again.
    engine.generate_signal();
    for _ in 0..3 {
        engine.tick_with_price(dec!(1.08450));
    }
    assert!(engine.live_signal().is_some());
}

#[test]
fn auto_mode_generates_on_cadence() {
    let mut engine = SignalEngine::with_noop(EngineConfig {
        auto_mode: true,
        auto_interval_ticks: 10,
        ..Default::default()
    });

    for _ in 0..9 {
        engine.tick();
    }
    assert!(engine.active_signal().is_none());

    // Request fires at tick 10, publication two ticks later.
    for _ in 0..3 {
        engine.tick();
    }
    assert!(engine.active_signal().is_some());
}

proptest! {
    #[test]
    fn synthesized_signals_are_always_side_consistent(seed in 0u64..512) {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut machine = SignalMachine::new(RiskConfig::default(), 60, 180);
        let sig = machine
            .synthesize(&mut rng, dec!(1.08450), 0)
            .cloned()
            .unwrap();
        match sig.side {
            Side::Buy => {
                prop_assert!(sig.stop_loss < sig.entry_price);
                prop_assert!(sig.entry_price < sig.take_profit);
            }
            Side::Sell => {
                prop_assert!(sig.take_profit < sig.entry_price);
                prop_assert!(sig.entry_price < sig.stop_loss);
            }
        }
    }
}
