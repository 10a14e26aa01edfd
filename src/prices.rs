use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{decimal::DecimalValue, errors::OracleError, utils::serde_address};

/// A token together with its externally resolved USD spot price.
///
/// `decimals` must match the token's on-chain decimals, otherwise every
/// value derived from it is off by a power of ten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(with = "serde_address")]
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub usd_price: DecimalValue,
}

impl TokenInfo {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8, usd_price: DecimalValue) -> Self {
        Self { address, symbol: symbol.into(), decimals, usd_price }
    }
}

/// Caller supplied prices, keyed by token address. Read-only once handed to
/// an oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "PriceFile")]
pub struct AssetPriceTable {
    tokens: HashMap<Address, TokenInfo>,
}

impl AssetPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces and returns any previous entry for the same address.
    pub fn insert(&mut self, token: TokenInfo) -> Option<TokenInfo> {
        self.tokens.insert(token.address, token)
    }

    pub fn lookup(&self, address: &Address) -> Result<&TokenInfo, OracleError> {
        self.tokens
            .get(address)
            .ok_or(OracleError::MissingPrice(*address))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.values()
    }

    /// Parses a JSON object of the form
    /// `{"0xabc…": {"symbol": "WBERA", "decimals": 18, "usdPrice": "3.2"}}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl FromIterator<TokenInfo> for AssetPriceTable {
    fn from_iter<T: IntoIterator<Item = TokenInfo>>(iter: T) -> Self {
        Self {
            tokens: iter.into_iter().map(|t| (t.address, t)).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceEntry {
    symbol: String,
    decimals: u8,
    usd_price: DecimalValue,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct PriceFile(#[serde_as(as = "HashMap<DisplayFromStr, _>")] HashMap<Address, PriceEntry>);

impl From<PriceFile> for AssetPriceTable {
    fn from(file: PriceFile) -> Self {
        file.0
            .into_iter()
            .map(|(address, e)| TokenInfo::new(address, e.symbol, e.decimals, e.usd_price))
            .collect()
    }
}
