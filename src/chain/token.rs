// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Mintable ERC-20 token bindings and amount conversion.

use alloy::{primitives::U256, sol};
use rust_decimal::Decimal;

sol! {
    #[sol(rpc)]
    interface IMintableToken {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external returns (bool);
    }
}

/// Decimals of the native currency (wei).
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals of the payment token.
pub const TOKEN_DECIMALS: u8 = 18;

/// Convert a decimal amount to on-chain base units.
///
/// Fails on negative amounts or more fractional digits than the token
/// carries.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, String> {
    if amount.is_sign_negative() {
        return Err("amount must not be negative".to_string());
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(format!("too many decimal places (max {decimals})"));
    }

    let mantissa = normalized.mantissa().unsigned_abs();
    let factor = U256::from(10u64).pow(U256::from(u32::from(decimals) - scale));
    Ok(U256::from(mantissa) * factor)
}

/// Convert on-chain base units to a decimal amount, keeping six fractional
/// digits. Values beyond `Decimal` range saturate rather than wrap — good
/// enough for threshold comparisons.
pub fn from_base_units(value: U256, decimals: u8) -> Decimal {
    const KEPT: u32 = 6;

    let drop = u32::from(decimals).saturating_sub(KEPT);
    let scaled = value / U256::from(10u64).pow(U256::from(drop));

    match u128::try_from(scaled) {
        Ok(units) => match i128::try_from(units) {
            // Mantissas beyond 96 bits do not fit a Decimal; saturate.
            Ok(units) => Decimal::try_from_i128_with_scale(units, KEPT).unwrap_or(Decimal::MAX),
            Err(_) => Decimal::MAX,
        },
        Err(_) => Decimal::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_amount_to_base_units() {
        let units = to_base_units(Decimal::from(1), 18).unwrap();
        assert_eq!(units, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn fractional_amount_to_base_units() {
        let units = to_base_units("0.1".parse().unwrap(), 18).unwrap();
        assert_eq!(units, U256::from(100_000_000_000_000_000u64));

        let units = to_base_units("1000.00".parse().unwrap(), 18).unwrap();
        assert_eq!(
            units,
            U256::from(1000u64) * U256::from(10u64).pow(U256::from(18u64))
        );
    }

    #[test]
    fn negative_amount_rejected() {
        assert!(to_base_units("-1".parse().unwrap(), 18).is_err());
    }

    #[test]
    fn excess_precision_rejected() {
        assert!(to_base_units("0.123".parse().unwrap(), 2).is_err());
    }

    #[test]
    fn base_units_round_trip() {
        let one = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(from_base_units(one, 18), Decimal::from(1));

        let twentieth = U256::from(50_000_000_000_000_000u64);
        assert_eq!(from_base_units(twentieth, 18), "0.05".parse().unwrap());

        assert_eq!(from_base_units(U256::ZERO, 18), Decimal::ZERO);
    }

    #[test]
    fn oversized_balances_saturate() {
        // Fits i128 after the scale-down but exceeds Decimal's mantissa.
        let beyond_mantissa = U256::from(10u64).pow(U256::from(45u64));
        assert_eq!(from_base_units(beyond_mantissa, 18), Decimal::MAX);

        // Exceeds u128 outright.
        let beyond_u128 = U256::from(1u8) << 200;
        assert_eq!(from_base_units(beyond_u128, 18), Decimal::MAX);
    }

    #[test]
    fn gas_threshold_comparison_survives_conversion() {
        let threshold: Decimal = "0.05".parse().unwrap();
        let below = U256::from(49_000_000_000_000_000u64); // 0.049
        let above = U256::from(51_000_000_000_000_000u64); // 0.051
        assert!(from_base_units(below, 18) < threshold);
        assert!(from_base_units(above, 18) > threshold);
    }
}
