use alloy_primitives::Address;

/// Failures of the chain read capability.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("rpc request failed: {0}")]
    Rpc(String),
    #[error("call to {to:?} reverted")]
    Revert { to: Address },
    #[error("could not decode return data of `{call}`: {reason}")]
    Decode { call: &'static str, reason: String },
    #[error("chain read timed out")]
    TimedOut,
    #[error("chain read cancelled")]
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("configuration unavailable for pool {pool:?}")]
    ConfigUnavailable {
        pool: Address,
        #[source]
        source: ChainError,
    },
    #[error("invalid configuration blob: {0}")]
    InvalidConfig(String),
    #[error("no price for token {0:?}")]
    MissingPrice(Address),
    #[error("failed to initialize pool state for {pool:?}")]
    InitializationFailed {
        pool: Address,
        #[source]
        source: ChainError,
    },
    #[error("oracle for {0:?} has not been initialized")]
    NotInitialized(Address),
    #[error("pool {0:?} has zero LP supply")]
    ZeroSupply(Address),
}

#[derive(Debug, thiserror::Error)]
pub enum AprError {
    #[error("apr request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("apr api answered with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode apr response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Chain(#[from] ChainError),
}
