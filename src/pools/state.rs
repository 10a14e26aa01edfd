use alloy_primitives::U256;
use serde::Serialize;

use crate::{decimal::DecimalValue, prices::TokenInfo};

/// One on-chain observation of a pool, already scaled to whole-token units.
///
/// Snapshots are immutable; a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub reserve0: DecimalValue,
    pub reserve1: DecimalValue,
    pub total_supply: DecimalValue,
    pub block_observed_at: u64,
}

impl PoolState {
    /// Scales raw integer amounts by each token's decimals.
    pub fn from_raw(
        reserves: (U256, U256),
        total_supply: U256,
        decimals: (u8, u8),
        lp_decimals: u8,
        block_observed_at: u64,
    ) -> Self {
        Self {
            reserve0: DecimalValue::from_raw(reserves.0, decimals.0),
            reserve1: DecimalValue::from_raw(reserves.1, decimals.1),
            total_supply: DecimalValue::from_raw(total_supply, lp_decimals),
            block_observed_at,
        }
    }

    /// USD value of everything the pool holds.
    pub fn total_value_usd(&self, token0: &TokenInfo, token1: &TokenInfo) -> DecimalValue {
        [
            &self.reserve0 * &token0.usd_price,
            &self.reserve1 * &token1.usd_price,
        ]
        .into_iter()
        .sum()
    }

    /// `None` when the LP supply is zero.
    pub fn lp_token_price(&self, token0: &TokenInfo, token1: &TokenInfo) -> Option<DecimalValue> {
        self.total_value_usd(token0, token1)
            .checked_div(&self.total_supply)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    fn token(decimals: u8, price: &str) -> TokenInfo {
        TokenInfo::new(address!("0000000000000000000000000000000000000001"), "T", decimals, price.parse().unwrap())
    }

    #[test]
    fn values_reserves_at_their_usd_price() {
        let state = PoolState {
            reserve0: DecimalValue::from(1000u64),
            reserve1: DecimalValue::from(500u64),
            total_supply: DecimalValue::from(10_000u64),
            block_observed_at: 1,
        };
        let (t0, t1) = (token(18, "1.00"), token(6, "2.00"));

        assert_eq!(state.total_value_usd(&t0, &t1), DecimalValue::from(2000u64));
        assert_eq!(state.lp_token_price(&t0, &t1).unwrap().to_string(), "0.2");
    }

    #[test]
    fn raw_amounts_use_their_own_decimals() {
        let state = PoolState::from_raw(
            (U256::from(10u64).pow(U256::from(21u64)), U256::from(500_000_000u64)),
            U256::from(10u64).pow(U256::from(22u64)),
            (18, 6),
            18,
            7,
        );

        assert_eq!(state.reserve0, DecimalValue::from(1000u64));
        assert_eq!(state.reserve1, DecimalValue::from(500u64));
        assert_eq!(state.total_supply, DecimalValue::from(10_000u64));
        assert_eq!(state.block_observed_at, 7);
    }

    #[test]
    fn zero_supply_has_no_price() {
        let state = PoolState {
            reserve0: DecimalValue::from(1u64),
            reserve1: DecimalValue::from(1u64),
            total_supply: DecimalValue::ZERO,
            block_observed_at: 1,
        };
        assert!(state.lp_token_price(&token(18, "1"), &token(18, "1")).is_none());
    }
}
