use std::{future::Future, time::Duration};

use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockId, TransactionRequest};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::{sync::watch, time::Instant};
use tracing::{debug, trace};

use crate::errors::ChainError;

/// Read access to the chain.
///
/// `call_many` answers one entry per call. A call that reverts yields `None`
/// rather than failing the whole batch; only transport problems are errors.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn call_many(
        &self,
        to: Address,
        calls: Vec<Bytes>,
        block_number: Option<u64>,
    ) -> Result<Vec<Option<Bytes>>, ChainError>;
}

/// Deadline and cancellation signal bounding a chain read.
#[derive(Debug, Clone)]
pub struct ReadContext {
    deadline: Option<Instant>,
    cancel: watch::Receiver<bool>,
}

/// Cancels every [`ReadContext`] cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

impl ReadContext {
    /// No deadline, never cancelled.
    pub fn background() -> Self {
        let (_, cancel) = watch::channel(false);
        Self { deadline: None, cancel }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = rx;
        (self, CancelHandle(tx))
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Drives `fut` until it completes, the deadline passes or the context is
    /// cancelled. On the latter two the future is dropped mid-flight.
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ChainError>,
    {
        let mut cancel = self.cancel.clone();
        let deadline = self.deadline;

        tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancel) => Err(ChainError::Cancelled.into()),
            _ = wait_deadline(deadline) => Err(ChainError::TimedOut.into()),
            res = fut => res,
        }
    }
}

async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return
        }
        if cancel.changed().await.is_err() {
            // sender gone, cancellation can no longer happen
            std::future::pending::<()>().await;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Encodes a single typed call and decodes its return value.
pub async fn make_call<C: SolCall>(
    node: &dyn ChainReader,
    ctx: &ReadContext,
    call: C,
    to: Address,
    block_number: Option<u64>,
) -> Result<C::Return, ChainError> {
    let mut res = ctx
        .run(node.call_many(to, vec![call.abi_encode().into()], block_number))
        .await?;

    decode_return::<C>(to, res.pop().flatten().as_ref())
}

/// Encodes several calls of the same type and sends them as one batch.
pub async fn make_call_many<C: SolCall>(
    node: &dyn ChainReader,
    ctx: &ReadContext,
    calls: Vec<C>,
    to: Address,
    block_number: Option<u64>,
) -> Result<Vec<C::Return>, ChainError> {
    let encoded = calls
        .into_iter()
        .map(|call| call.abi_encode().into())
        .collect::<Vec<_>>();

    ctx.run(node.call_many(to, encoded, block_number))
        .await?
        .iter()
        .map(|res| decode_return::<C>(to, res.as_ref()))
        .collect()
}

/// Decodes the return data of `C`, treating a missing answer as a revert.
pub fn decode_return<C: SolCall>(to: Address, data: Option<&Bytes>) -> Result<C::Return, ChainError> {
    let data = data.ok_or(ChainError::Revert { to })?;

    C::abi_decode_returns(data).map_err(|e| ChainError::Decode {
        call: C::SIGNATURE,
        reason: e.to_string(),
    })
}

/// [`ChainReader`] backed by a JSON-RPC node over HTTP.
#[derive(Clone)]
pub struct RpcChainReader {
    provider: DynProvider,
}

impl RpcChainReader {
    pub fn new(rpc_url: &str) -> eyre::Result<Self> {
        let url: url::Url = rpc_url.parse()?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        debug!(target: "lp-oracle::node", rpc_url, "connected http provider");

        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn call_many(
        &self,
        to: Address,
        calls: Vec<Bytes>,
        block_number: Option<u64>,
    ) -> Result<Vec<Option<Bytes>>, ChainError> {
        let block = block_number.map(BlockId::number).unwrap_or_else(BlockId::latest);

        let requests = calls.into_iter().map(|data| {
            let req = TransactionRequest::default().to(to).input(data.into());
            async move {
                match self.provider.call(req).block(block).await {
                    Ok(out) => Ok(Some(out)),
                    Err(err)
                        if err
                            .as_error_resp()
                            .is_some_and(|p| p.code == 3 || p.message.contains("revert")) =>
                    {
                        trace!(target: "lp-oracle::node", ?to, %err, "call reverted");
                        Ok(None)
                    }
                    Err(err) => Err(ChainError::Rpc(err.to_string())),
                }
            }
        });

        try_join_all(requests).await
    }
}
