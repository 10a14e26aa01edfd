use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use arc_swap::ArcSwapOption;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{IERC20, IHypervisor, IUniswapV2Pair, PoolConfiguration, PoolKind, PoolState};
use crate::{
    decimal::DecimalValue,
    errors::{ChainError, OracleError},
    node::{decode_return, ChainReader, ReadContext},
    prices::{AssetPriceTable, TokenInfo},
};

/// LP token price and TVL computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub lp_token_price: DecimalValue,
    pub tvl: DecimalValue,
    pub total_supply: DecimalValue,
    pub block: u64,
}

/// Prices the LP token of a single pool.
///
/// Construction is pure. [`LpPriceOracle::initialize`] takes a snapshot of
/// the pool's reserves and LP supply; every pricing call afterwards is
/// answered from the latest snapshot without touching the chain. Refreshing
/// is the caller's decision: call `initialize` again.
///
/// Snapshots are swapped in whole, so concurrent readers always see
/// reserves and supply from the same block.
pub struct LpPriceOracle {
    node: Arc<dyn ChainReader>,
    config: PoolConfiguration,
    prices: Arc<AssetPriceTable>,
    token0: TokenInfo,
    token1: TokenInfo,
    state: ArcSwapOption<PoolState>,
}

impl LpPriceOracle {
    /// Builds an oracle from a persisted configuration blob.
    pub fn new(
        node: Arc<dyn ChainReader>,
        pool: Address,
        prices: Arc<AssetPriceTable>,
        config: &[u8],
    ) -> Result<Self, OracleError> {
        Self::with_config(node, pool, prices, PoolConfiguration::from_raw(config)?)
    }

    pub fn with_config(
        node: Arc<dyn ChainReader>,
        pool: Address,
        prices: Arc<AssetPriceTable>,
        config: PoolConfiguration,
    ) -> Result<Self, OracleError> {
        if config.pool() != pool {
            return Err(OracleError::InvalidConfig(format!(
                "configuration belongs to {:?}, not {:?}",
                config.pool(),
                pool
            )))
        }

        let token0 = prices.lookup(&config.token0())?.clone();
        let token1 = prices.lookup(&config.token1())?.clone();

        Ok(Self {
            node,
            config,
            prices,
            token0,
            token1,
            state: ArcSwapOption::empty(),
        })
    }

    pub fn pool(&self) -> Address {
        self.config.pool()
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    pub fn price_table(&self) -> &AssetPriceTable {
        &self.prices
    }

    pub fn is_initialized(&self) -> bool {
        self.state.load().is_some()
    }

    /// Reads a fresh snapshot and publishes it. On failure the previous
    /// snapshot, if any, stays in place.
    pub async fn initialize(&self, ctx: &ReadContext) -> Result<(), OracleError> {
        let pool = self.pool();

        let state = self.fetch_state(ctx).await.map_err(|source| {
            warn!(target: "lp-oracle::oracle", ?pool, %source, "failed to read pool state");
            OracleError::InitializationFailed { pool, source }
        })?;

        info!(
            target: "lp-oracle::oracle",
            ?pool,
            block = state.block_observed_at,
            reserve0 = %state.reserve0,
            reserve1 = %state.reserve1,
            total_supply = %state.total_supply,
            "pool state refreshed"
        );

        self.state.store(Some(Arc::new(state)));
        Ok(())
    }

    /// The snapshot pricing calls are currently answered from.
    pub fn state(&self) -> Result<Arc<PoolState>, OracleError> {
        self.state
            .load_full()
            .ok_or(OracleError::NotInitialized(self.pool()))
    }

    pub fn lp_token_price(&self) -> Result<DecimalValue, OracleError> {
        Ok(self.quote()?.lp_token_price)
    }

    pub fn tvl(&self) -> Result<DecimalValue, OracleError> {
        Ok(self.quote()?.tvl)
    }

    pub fn quote(&self) -> Result<PriceQuote, OracleError> {
        let state = self.state()?;

        let lp_token_price = state
            .lp_token_price(&self.token0, &self.token1)
            .ok_or(OracleError::ZeroSupply(self.pool()))?;

        Ok(PriceQuote {
            lp_token_price,
            tvl: state.total_value_usd(&self.token0, &self.token1),
            total_supply: state.total_supply.clone(),
            block: state.block_observed_at,
        })
    }

    async fn fetch_state(&self, ctx: &ReadContext) -> Result<PoolState, ChainError> {
        let pool = self.pool();
        let block = ctx.run(self.node.block_number()).await?;

        let reserves_call: Bytes = match self.config.kind() {
            PoolKind::ManagedVault => IHypervisor::getTotalAmountsCall {}.abi_encode().into(),
            PoolKind::ConstantProduct => IUniswapV2Pair::getReservesCall {}.abi_encode().into(),
        };
        let calls = vec![reserves_call, IERC20::totalSupplyCall {}.abi_encode().into()];

        let res = ctx.run(self.node.call_many(pool, calls, Some(block))).await?;
        let reserves_data = res.first().and_then(Option::as_ref);

        let reserves = match self.config.kind() {
            PoolKind::ManagedVault => {
                let amounts = decode_return::<IHypervisor::getTotalAmountsCall>(pool, reserves_data)?;
                (amounts.total0, amounts.total1)
            }
            PoolKind::ConstantProduct => {
                let r = decode_return::<IUniswapV2Pair::getReservesCall>(pool, reserves_data)?;
                (U256::from(r.reserve0), U256::from(r.reserve1))
            }
        };
        let total_supply = decode_return::<IERC20::totalSupplyCall>(pool, res.get(1).and_then(Option::as_ref))?;

        debug!(target: "lp-oracle::oracle", ?pool, block, ?reserves, %total_supply, "read raw pool state");

        Ok(PoolState::from_raw(
            reserves,
            total_supply,
            (self.token0.decimals, self.token1.decimals),
            self.config.lp_decimals(),
            block,
        ))
    }
}
