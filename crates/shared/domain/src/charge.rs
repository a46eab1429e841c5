//! Charge strategy: maps a raw charge amount to a wallet delta.
//!
//! The variant is chosen by the user's [`Classification`]. Adding a
//! classification means adding an arm here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::account::WalletDelta;
use crate::constants::{BASIS_POINTS_SCALE, DEFAULT_PREMIUM_POINT_RATE_BPS};
use crate::user::Classification;

/// Input to [`ChargeStrategy::calculate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount: i64,
    pub classification: Classification,
}

/// Pure charge calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeStrategy {
    /// Reward rate for premium users in basis points
    pub premium_point_rate_bps: i64,
}

impl Default for ChargeStrategy {
    fn default() -> Self {
        Self {
            premium_point_rate_bps: DEFAULT_PREMIUM_POINT_RATE_BPS,
        }
    }
}

impl ChargeStrategy {
    pub fn new(premium_point_rate_bps: i64) -> Self {
        Self {
            premium_point_rate_bps,
        }
    }

    /// Compute the delta for a charge. No I/O, deterministic.
    pub fn calculate(&self, request: ChargeRequest) -> WalletDelta {
        let ChargeRequest {
            amount,
            classification,
        } = request;

        match classification {
            Classification::Standard => WalletDelta::new(amount, 0),
            Classification::Premium => {
                WalletDelta::new(amount, floor_rate(amount, self.premium_point_rate_bps))
            }
        }
    }
}

/// floor(amount * bps / 10_000), rounding toward negative infinity.
fn floor_rate(amount: i64, bps: i64) -> i64 {
    let scaled = i128::from(amount) * i128::from(bps);
    let points = scaled.div_euclid(i128::from(BASIS_POINTS_SCALE));
    i64::try_from(points).unwrap_or(if points.is_negative() { i64::MIN } else { i64::MAX })
}
