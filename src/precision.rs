//! Pip and decimal precision helpers
//!
//! All monetary arithmetic in the engine runs on `Decimal` to avoid the
//! rounding drift that repeated floating-point P&L recomputation accumulates.
//! The conversion constants follow the simplified EURUSD convention: a pip is
//! 0.0001, signal levels are offset in 0.00001 steps, and one lot is worth
//! $10 per pip.

use anyhow::Result;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Multiplier turning a price difference into pips (4-decimal pip).
pub const PIP_FACTOR: Decimal = dec!(10000);

/// Dollar value of one pip for a 1.0 lot position.
pub const PIP_VALUE: Decimal = dec!(10);

/// Price step used when offsetting signal levels by a pip count.
pub const LEVEL_STEP: Decimal = dec!(0.00001);

/// Decimal places shown for EURUSD-style quotes.
pub const PRICE_DISPLAY_DP: u32 = 5;

/// Converts a configured pip count into a price distance for signal levels.
pub fn level_distance(pips: u32) -> Decimal {
    Decimal::from(pips) * LEVEL_STEP
}

/// Floating P&L in dollars for a position of `size` lots.
///
/// `(price - entry) * 10000 * sign * size * 10`, computed exactly.
pub fn position_pnl(side_sign: Decimal, entry: Decimal, price: Decimal, size: Decimal) -> Decimal {
    (price - entry) * PIP_FACTOR * side_sign * size * PIP_VALUE
}

/// Formats a price with the fixed 5-decimal display convention.
pub fn format_price(price: Decimal) -> String {
    format!("{:.1$}", price, PRICE_DISPLAY_DP as usize)
}

/// Converts an externally supplied `f64` quote into a `Decimal`, rounded to
/// the given number of decimal places.
pub fn f64_to_decimal(value: f64, dp: u32) -> Result<Decimal> {
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| anyhow::anyhow!("Invalid f64 value: {}", value))?;
    Ok(decimal.round_dp(dp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pnl_matches_pip_convention() {
        // BUY 1 lot, +10 pips => $100
        let pnl = position_pnl(Decimal::ONE, dec!(1.0850), dec!(1.0860), Decimal::ONE);
        assert_eq!(pnl, dec!(100.0000));
    }

    #[test]
    fn pnl_sign_flips_for_sell() {
        let pnl = position_pnl(Decimal::NEGATIVE_ONE, dec!(1.0850), dec!(1.0860), Decimal::ONE);
        assert_eq!(pnl, dec!(-100.0000));
    }

    #[test]
    fn format_pads_to_five_decimals() {
        assert_eq!(format_price(dec!(1.084)), "1.08400");
        assert_eq!(format_price(dec!(1.08455)), "1.08455");
    }

    #[test]
    fn level_distance_uses_fine_steps() {
        assert_eq!(level_distance(10), dec!(0.00010));
        assert_eq!(level_distance(5), dec!(0.00005));
    }

    #[test]
    fn f64_conversion_rounds_to_scale() {
        let price = f64_to_decimal(1.084_504_9, 5).unwrap();
        assert_eq!(price, dec!(1.08450));
    }
}
