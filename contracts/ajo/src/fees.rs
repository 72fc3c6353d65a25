//! Fixed-point helpers for basis-point arithmetic.
//!
//! Amounts are minor units (two implied decimal places) and rates are basis
//! points, so `10_000` bps is 100 %. Every percentage in the engine goes
//! through [`bps_of`], which rounds half up.
//!
//! A cycle's service fee is the sum of its contributions' fee portions, so
//! the payout and the ledger rows always report the same figure.

/// Denominator for basis-point rates.
pub const BPS_DENOMINATOR: i128 = 10_000;

/// Largest rate any group or protocol setting may carry.
pub const MAX_BPS: u32 = 10_000;

/// `amount × bps ÷ 10 000`, rounded half up. `amount` must be non-negative.
pub fn bps_of(amount: i128, bps: u32) -> i128 {
    (amount * bps as i128 + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR
}
