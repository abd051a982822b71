use soroban_sdk::contracttype;

use crate::RedemptionError;

// ── Types ───────────────────────────────────────────────────────────────────

/// Snapshot of the share token's pooled totals.
///
/// The ratio `total_stake / total_shares` is the stake-per-share rate. Every
/// conversion is one multiply-then-divide with a single final floor.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExchangeRate {
    /// Stake (rebasing denomination) backing all shares.
    pub total_stake: i128,
    /// Shares outstanding.
    pub total_shares: i128,
}

impl ExchangeRate {
    /// One stake per share.
    pub const fn parity() -> Self {
        ExchangeRate {
            total_stake: 1,
            total_shares: 1,
        }
    }

    fn is_degenerate(&self) -> bool {
        self.total_stake <= 0 || self.total_shares <= 0
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

/// Convert a stake amount into shares at `rate`, rounding down.
///
/// ```text
/// shares = stake × total_shares / total_stake
/// ```
pub fn shares_for_stake(rate: &ExchangeRate, stake: i128) -> Result<i128, RedemptionError> {
    if rate.is_degenerate() {
        return Ok(stake);
    }
    mul_div_floor(stake, rate.total_shares, rate.total_stake)
}

/// Convert shares into a stake amount at `rate`, rounding down.
///
/// ```text
/// stake = shares × total_stake / total_shares
/// ```
pub fn stake_for_shares(rate: &ExchangeRate, shares: i128) -> Result<i128, RedemptionError> {
    if rate.is_degenerate() {
        return Ok(shares);
    }
    mul_div_floor(shares, rate.total_stake, rate.total_shares)
}

/// `value × numerator / denominator` for non-negative operands.
fn mul_div_floor(
    value: i128,
    numerator: i128,
    denominator: i128,
) -> Result<i128, RedemptionError> {
    if value < 0 {
        return Err(RedemptionError::InvalidAmount);
    }
    value
        .checked_mul(numerator)
        .and_then(|product| product.checked_div(denominator))
        .ok_or(RedemptionError::ArithmeticOverflow)
}

// ── Unit tests ──────────────────────────────────────────────────────────────
