//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Classifications
// =============================================================================

/// Classification assigned to new users
pub const CLASSIFICATION_STANDARD: &str = "standard";

/// Classification earning reward points on every charge
pub const CLASSIFICATION_PREMIUM: &str = "premium";

// =============================================================================
// Charging
// =============================================================================

/// One whole unit expressed in basis points
pub const BASIS_POINTS_SCALE: i64 = 10_000;

/// Default reward rate for premium users (1000 bp = 10%)
pub const DEFAULT_PREMIUM_POINT_RATE_BPS: i64 = 1_000;
