use std::{fmt, sync::Arc};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{IERC20, IHypervisor, IUniswapV2Pair};
use crate::{
    errors::{ChainError, OracleError},
    node::{decode_return, ChainReader, ReadContext},
    utils::serde_address,
};

/// How a pool's reserves are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolKind {
    /// managed vault, reserves from `getTotalAmounts()`
    ManagedVault,
    /// constant product pair, reserves from `getReserves()`
    ConstantProduct,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::ManagedVault => f.write_str("managed-vault"),
            PoolKind::ConstantProduct => f.write_str("constant-product"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigWire {
    #[serde(with = "serde_address")]
    pool: Address,
    kind: PoolKind,
    #[serde(with = "serde_address")]
    token0: Address,
    #[serde(with = "serde_address")]
    token1: Address,
    lp_decimals: u8,
}

/// Static configuration of a pool.
///
/// The canonical JSON encoding is kept alongside the typed view and is what
/// callers persist. Reloading it with [`PoolConfiguration::from_raw`] yields
/// an identical value without touching the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfiguration {
    pool: Address,
    kind: PoolKind,
    token0: Address,
    token1: Address,
    lp_decimals: u8,
    raw: String,
}

impl PoolConfiguration {
    pub fn new(pool: Address, kind: PoolKind, token0: Address, token1: Address, lp_decimals: u8) -> Self {
        let wire = ConfigWire { pool, kind, token0, token1, lp_decimals };
        // a struct of plain fields always serializes
        let raw = serde_json::to_string(&wire).unwrap_or_default();

        Self { pool, kind, token0, token1, lp_decimals, raw }
    }

    /// Decodes a previously persisted blob. Anything that is not the exact
    /// canonical encoding is rejected.
    pub fn from_raw(raw: &[u8]) -> Result<Self, OracleError> {
        let wire: ConfigWire =
            serde_json::from_slice(raw).map_err(|e| OracleError::InvalidConfig(e.to_string()))?;

        let config = Self::new(wire.pool, wire.kind, wire.token0, wire.token1, wire.lp_decimals);
        if config.raw.as_bytes() != raw {
            return Err(OracleError::InvalidConfig("blob is not canonically encoded".to_string()))
        }

        Ok(config)
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn lp_decimals(&self) -> u8 {
        self.lp_decimals
    }

    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    pub fn as_json(&self) -> &str {
        &self.raw
    }
}

/// Discovers a pool's [`PoolConfiguration`] with a single batched read.
/// Nothing is cached between calls.
pub struct PoolConfigResolver {
    node: Arc<dyn ChainReader>,
}

impl PoolConfigResolver {
    pub fn new(node: Arc<dyn ChainReader>) -> Self {
        Self { node }
    }

    pub async fn resolve(&self, ctx: &ReadContext, pool: Address) -> Result<PoolConfiguration, OracleError> {
        let config = self
            .read_config(ctx, pool)
            .await
            .map_err(|source| OracleError::ConfigUnavailable { pool, source })?;

        info!(target: "lp-oracle::resolver", ?pool, kind = %config.kind, token0 = ?config.token0, token1 = ?config.token1, "resolved pool configuration");

        Ok(config)
    }

    async fn read_config(&self, ctx: &ReadContext, pool: Address) -> Result<PoolConfiguration, ChainError> {
        let calls: Vec<Bytes> = vec![
            IHypervisor::token0Call {}.abi_encode().into(),
            IHypervisor::token1Call {}.abi_encode().into(),
            IERC20::decimalsCall {}.abi_encode().into(),
            IHypervisor::getTotalAmountsCall {}.abi_encode().into(),
            IUniswapV2Pair::getReservesCall {}.abi_encode().into(),
        ];

        let res = ctx.run(self.node.call_many(pool, calls, None)).await?;
        let answer = |i: usize| res.get(i).and_then(Option::as_ref);

        let token0 = non_zero::<IHypervisor::token0Call>(decode_return::<IHypervisor::token0Call>(pool, answer(0))?)?;
        let token1 = non_zero::<IHypervisor::token1Call>(decode_return::<IHypervisor::token1Call>(pool, answer(1))?)?;
        let lp_decimals = decode_return::<IERC20::decimalsCall>(pool, answer(2))?;

        let kind = if decode_return::<IHypervisor::getTotalAmountsCall>(pool, answer(3)).is_ok() {
            PoolKind::ManagedVault
        } else if decode_return::<IUniswapV2Pair::getReservesCall>(pool, answer(4)).is_ok() {
            PoolKind::ConstantProduct
        } else {
            debug!(target: "lp-oracle::resolver", ?pool, "no known reserve getter answered");
            return Err(ChainError::Revert { to: pool })
        };

        Ok(PoolConfiguration::new(pool, kind, token0, token1, lp_decimals))
    }
}

fn non_zero<C: SolCall>(address: Address) -> Result<Address, ChainError> {
    if address.is_zero() {
        return Err(ChainError::Decode {
            call: C::SIGNATURE,
            reason: "zero address".to_string(),
        })
    }
    Ok(address)
}
