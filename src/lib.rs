//! Synthetic Trading Signal Lifecycle Engine
//!
//! Tick-driven simulation core: a seeded random-walk price generator feeds a
//! single-live-signal state machine and a position ledger on every tick, with
//! deterministic ordering (price, scheduled tasks, signal lifecycle, ledger)
//! and decimal arithmetic for all money values.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod callbacks;
pub mod ledger;
pub mod precision;
pub mod price;
pub mod scheduler;
pub mod signal;
pub mod store;
pub mod types;

use callbacks::{EngineCallbacks, NoopCallbacks};
use ledger::PositionLedger;
use precision::format_price;
use price::PriceGenerator;
use scheduler::{Scheduler, Task};
use signal::{LifecycleEvent, SignalMachine};
use store::MemoryStore;
use types::*;

/// Engine configuration.
///
/// Every delay and timeout is expressed in ticks, the engine's deterministic
/// clock; a fixed seed reproduces an entire session bit-for-bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deterministic random seed
    pub random_seed: u64,
    /// Opening quote for the synthetic walk
    pub start_price: Decimal,
    /// Largest per-tick move in micro-units (zero-mean uniform band)
    pub volatility_micro: i64,
    /// Capacity of the recent-price display window
    pub price_window_len: usize,
    /// Ticks between a generation request and signal publication
    pub analysis_delay_ticks: u64,
    /// Ticks a WAITING signal may wait for its entry level
    pub entry_timeout_ticks: u64,
    /// Ticks an ACTIVE signal may run before a timeout closure
    pub max_active_ticks: u64,
    /// Ticks a closed signal stays displayed before the slot clears
    pub settle_delay_ticks: u64,
    /// Generate a signal automatically every `auto_interval_ticks`
    pub auto_mode: bool,
    pub auto_interval_ticks: u64,
    /// Starting account balance
    pub initial_balance: Decimal,
    /// Pip distances for synthesized signal levels
    pub risk: RiskConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            random_seed: 42,
            start_price: dec!(1.08450),
            volatility_micro: 25,
            price_window_len: 20,
            analysis_delay_ticks: 2,
            entry_timeout_ticks: 60,
            max_active_ticks: 180,
            settle_delay_ticks: 4,
            auto_mode: false,
            auto_interval_ticks: 50,
            initial_balance: dec!(50000),
            risk: RiskConfig::default(),
        }
    }
}

/// The simulation engine: owns all signal, position, and account state for
/// its lifetime. Instances are fully independent; nothing is process-global.
pub struct SignalEngine {
    config: EngineConfig,
    tick_no: u64,
    rng: Pcg64,
    prices: PriceGenerator,
    signals: SignalMachine,
    ledger: PositionLedger,
    scheduler: Scheduler,
    store: MemoryStore,
    callbacks: Box<dyn EngineCallbacks>,
}

impl SignalEngine {
    pub fn new(config: EngineConfig, callbacks: Box<dyn EngineCallbacks>) -> Self {
        info!(seed = config.random_seed, "initializing signal engine");
        let rng = Pcg64::seed_from_u64(config.random_seed);
        let prices = PriceGenerator::new(
            config.start_price,
            config.volatility_micro,
            config.price_window_len,
        );
        let signals = SignalMachine::new(
            config.risk,
            config.entry_timeout_ticks,
            config.max_active_ticks,
        );
        let ledger = PositionLedger::new(config.initial_balance, config.start_price);
        Self {
            config,
            tick_no: 0,
            rng,
            prices,
            signals,
            ledger,
            scheduler: Scheduler::new(),
            store: MemoryStore::new(),
            callbacks,
        }
    }

    /// Engine without a render consumer, for headless or test use.
    pub fn with_noop(config: EngineConfig) -> Self {
        Self::new(config, Box::new(NoopCallbacks))
    }

    /// One full simulation step: generate a price, run due scheduled tasks,
    /// advance the signal lifecycle, then the position ledger. A tick always
    /// runs to completion before the next is issued.
    pub fn tick(&mut self) {
        let price = self.prices.tick(&mut self.rng);
        self.advance(price);
    }

    /// One step driven by an externally supplied quote instead of the
    /// synthetic walk.
    pub fn tick_with_price(&mut self, price: Decimal) {
        self.prices.push_external(price);
        self.advance(price);
    }

    fn advance(&mut self, price: Decimal) {
        self.tick_no += 1;

        let formatted = format_price(price);
        self.callbacks.on_price_update(&formatted, self.prices.window());

        for task in self.scheduler.take_due(self.tick_no) {
            self.run_task(task, price);
        }

        match self.signals.on_tick(price, self.tick_no) {
            Some(LifecycleEvent::Activated) => {
                if let Some(sig) = self.signals.active() {
                    let sig = sig.clone();
                    self.store.upsert(&sig);
                    self.callbacks.on_signal_update(Some(&sig));
                }
            }
            Some(LifecycleEvent::Closed { .. }) => {
                if let Some(sig) = self.signals.active() {
                    let sig = sig.clone();
                    self.store.upsert(&sig);
                    self.callbacks.on_signal_update(Some(&sig));
                    self.scheduler.schedule(
                        self.tick_no + self.config.settle_delay_ticks,
                        Task::ClearSettledSignal { signal_id: sig.id },
                    );
                }
                let stats = self.signals.stats();
                self.callbacks
                    .on_history_update(self.signals.history(), &stats);
            }
            None => {}
        }

        self.ledger.tick(price);

        if self.config.auto_mode && self.tick_no % self.config.auto_interval_ticks == 0 {
            self.generate_signal();
        }
    }

    fn run_task(&mut self, task: Task, price: Decimal) {
        match task {
            Task::PublishSignal => {
                if let Some(sig) = self.signals.synthesize(&mut self.rng, price, self.tick_no) {
                    let sig = sig.clone();
                    self.store.upsert(&sig);
                    self.callbacks.on_signal_update(Some(&sig));
                }
            }
            Task::ClearSettledSignal { signal_id } => {
                if self.signals.clear_settled(signal_id) {
                    self.callbacks.on_signal_update(None);
                }
            }
        }
    }

    /// Requests a new signal. Silently ignored while a signal is live, still
    /// displayed after settlement, or already under analysis; publication
    /// itself happens `analysis_delay_ticks` later via the scheduler.
    pub fn generate_signal(&mut self) {
        if self.signals.is_occupied()
            || self
                .scheduler
                .has_pending(|t| matches!(t, Task::PublishSignal))
        {
            debug!("generate_signal ignored: engine not idle");
            return;
        }
        info!("scanning market structure");
        self.scheduler.schedule(
            self.tick_no + self.config.analysis_delay_ticks,
            Task::PublishSignal,
        );
    }

    /// Installs a signal supplied by the surrounding system (e.g. read from
    /// a remote store). Returns false if the slot is occupied.
    pub fn adopt_signal(&mut self, signal: Signal) -> bool {
        let adopted = self.signals.adopt(signal);
        if adopted {
            if let Some(sig) = self.signals.active() {
                let sig = sig.clone();
                self.store.upsert(&sig);
                self.callbacks.on_signal_update(Some(&sig));
            }
        }
        adopted
    }

    /// Merges a partial risk update; only signals generated afterwards are
    /// affected.
    pub fn set_risk_config(&mut self, update: RiskConfigUpdate) {
        self.signals.set_risk_config(update);
    }

    pub fn open_position(
        &mut self,
        side: Side,
        symbol: &str,
        entry_price: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
        size: Decimal,
    ) -> Result<String, EngineError> {
        self.ledger
            .open(side, symbol, entry_price, take_profit, stop_loss, size)
    }

    pub fn close_position(&mut self, id: &str, reason: CloseReason) -> Result<Decimal, EngineError> {
        self.ledger.close(id, reason)
    }

    /// Resets the account to its initial endowment, dropping all positions
    /// and history. Irreversible; callers are expected to confirm first.
    pub fn reset_account(&mut self) {
        self.ledger.reset();
    }

    // Read accessors

    pub fn tick_count(&self) -> u64 {
        self.tick_no
    }

    pub fn current_price(&self) -> Decimal {
        self.prices.current()
    }

    pub fn price_window(&self) -> &[Decimal] {
        self.prices.window()
    }

    pub fn active_signal(&self) -> Option<&Signal> {
        self.signals.active()
    }

    /// The signal currently counting toward single-liveness, if any.
    pub fn live_signal(&self) -> Option<&Signal> {
        self.signals.live()
    }

    pub fn signal_history(&self) -> &[SignalHistoryEntry] {
        self.signals.history()
    }

    pub fn stats(&self) -> Stats {
        self.signals.stats()
    }

    pub fn risk_config(&self) -> RiskConfig {
        self.signals.risk()
    }

    pub fn balance(&self) -> Decimal {
        self.ledger.balance()
    }

    pub fn equity(&self) -> Decimal {
        self.ledger.equity()
    }

    pub fn open_positions(&self) -> &[Position] {
        self.ledger.positions()
    }

    pub fn position_history(&self) -> &[Position] {
        self.ledger.history()
    }

    /// Read-model mirror of the signal store queries.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}
