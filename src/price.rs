//! Synthetic price generation
//!
//! Random-walk perturbation of a running quote at each tick. Deltas are
//! sampled as whole micro-units (0.000001) so the walk stays exact in
//! `Decimal` arithmetic and a given RNG seed always reproduces the same
//! price path.

use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

/// Bounded-history price generator.
pub struct PriceGenerator {
    current: Decimal,
    /// Last `capacity` ticks, oldest first; used for trend/sparkline display
    window: Vec<Decimal>,
    capacity: usize,
    /// Largest per-tick move in micro-units (zero-mean uniform band)
    volatility_micro: i64,
}

impl PriceGenerator {
    /// The window starts pre-filled with the start price so consumers always
    /// see a full sparkline.
    pub fn new(start_price: Decimal, volatility_micro: i64, capacity: usize) -> Self {
        Self {
            current: start_price,
            window: vec![start_price; capacity],
            capacity,
            volatility_micro,
        }
    }

    /// Advances the walk by one tick and returns the new price.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Decimal {
        let step = rng.gen_range(-self.volatility_micro..=self.volatility_micro);
        self.current += Decimal::new(step, 6);
        debug!(price = %self.current, step_micro = step, "price tick");
        self.push(self.current);
        self.current
    }

    /// Accepts an externally supplied quote instead of generating one, for
    /// callers swapping in a real feed.
    pub fn push_external(&mut self, price: Decimal) {
        self.current = price;
        self.push(price);
    }

    pub fn current(&self) -> Decimal {
        self.current
    }

    pub fn window(&self) -> &[Decimal] {
        &self.window
    }

    fn push(&mut self, price: Decimal) {
        self.window.push(price);
        if self.window.len() > self.capacity {
            self.window.remove(0);
        }
    }
}
