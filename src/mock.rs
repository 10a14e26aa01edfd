//! In-memory [`ChainReader`] answering the pool calls the crate makes.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;

use crate::{
    errors::ChainError,
    node::ChainReader,
    pools::{PoolKind, IERC20, IHypervisor, IUniswapV2Pair},
};

#[derive(Debug, Clone)]
pub(crate) struct MockPool {
    pub kind: PoolKind,
    pub token0: Address,
    pub token1: Address,
    pub decimals: u8,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
    /// multiply every amount by the block it is read at
    pub scale_with_block: bool,
}

impl MockPool {
    /// 1000 token0 (18 decimals), 500 token1 (6 decimals), 10k LP tokens.
    pub fn vault_default() -> Self {
        Self {
            kind: PoolKind::ManagedVault,
            token0: address!("6969696969696969696969696969696969696969"),
            token1: address!("549943e04f40284185054145c6e4e9568c1d3241"),
            decimals: 18,
            reserve0: U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64)),
            reserve1: U256::from(500_000_000u64),
            total_supply: U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18u64)),
            scale_with_block: false,
        }
    }

    pub fn pair_default() -> Self {
        Self { kind: PoolKind::ConstantProduct, ..Self::vault_default() }
    }

    fn amount(&self, value: U256, block: u64) -> U256 {
        if self.scale_with_block {
            value * U256::from(block)
        } else {
            value
        }
    }

    fn answer(&self, data: &[u8], block: u64) -> Option<Bytes> {
        let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;

        let encoded = match selector {
            IHypervisor::token0Call::SELECTOR => self.token0.abi_encode(),
            IHypervisor::token1Call::SELECTOR => self.token1.abi_encode(),
            IERC20::decimalsCall::SELECTOR => U256::from(self.decimals).abi_encode(),
            IERC20::totalSupplyCall::SELECTOR => self.amount(self.total_supply, block).abi_encode(),
            IHypervisor::getTotalAmountsCall::SELECTOR if self.kind == PoolKind::ManagedVault => {
                (self.amount(self.reserve0, block), self.amount(self.reserve1, block)).abi_encode_params()
            }
            IUniswapV2Pair::getReservesCall::SELECTOR if self.kind == PoolKind::ConstantProduct => {
                (self.amount(self.reserve0, block), self.amount(self.reserve1, block), 0u32).abi_encode_params()
            }
            _ => return None,
        };

        Some(encoded.into())
    }
}

pub(crate) struct MockChain {
    block: AtomicU64,
    advancing: bool,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
    pools: Mutex<HashMap<Address, MockPool>>,
    reads: AtomicUsize,
    block_reads: AtomicUsize,
}

impl MockChain {
    pub fn new(block: u64) -> Self {
        Self {
            block: AtomicU64::new(block),
            advancing: false,
            delay: Mutex::new(None),
            failing: AtomicBool::new(false),
            pools: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            block_reads: AtomicUsize::new(0),
        }
    }

    /// every `block_number` call mines a new block
    pub fn advancing(mut self) -> Self {
        self.advancing = true;
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_block(&self, block: u64) {
        self.block.store(block, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_pool(&self, address: Address, pool: MockPool) {
        self.pools.lock().unwrap().insert(address, pool);
    }

    pub fn update_pool(&self, address: Address, f: impl FnOnce(&mut MockPool)) {
        if let Some(pool) = self.pools.lock().unwrap().get_mut(&address) {
            f(pool);
        }
    }

    /// number of `call_many` batches served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn block_reads(&self) -> usize {
        self.block_reads.load(Ordering::SeqCst)
    }

    async fn io(&self) -> Result<(), ChainError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("node unavailable".to_string()))
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.block_reads.fetch_add(1, Ordering::SeqCst);
        self.io().await?;

        if self.advancing {
            Ok(self.block.fetch_add(1, Ordering::SeqCst) + 1)
        } else {
            Ok(self.block.load(Ordering::SeqCst))
        }
    }

    async fn call_many(
        &self,
        to: Address,
        calls: Vec<Bytes>,
        block_number: Option<u64>,
    ) -> Result<Vec<Option<Bytes>>, ChainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.io().await?;

        let block = block_number.unwrap_or_else(|| self.block.load(Ordering::SeqCst));
        let pool = self.pools.lock().unwrap().get(&to).cloned();

        Ok(calls
            .iter()
            .map(|data| pool.as_ref().and_then(|p| p.answer(data, block)))
            .collect())
    }
}
