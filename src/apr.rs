use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tracing::debug;

use crate::{decimal::DecimalValue, errors::AprError, node::ReadContext};

/// Yield figures published for one staking token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprFigures {
    pub apr: DecimalValue,
    #[serde(default)]
    pub fee_apr: Option<DecimalValue>,
    #[serde(default)]
    pub reward_apr: Option<DecimalValue>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct AprResponse(#[serde_as(as = "HashMap<DisplayFromStr, _>")] HashMap<Address, AprFigures>);

/// Fetches the published APRs and keeps the entries for `staking_tokens`.
/// Tokens the API does not know about are simply absent from the result.
pub async fn fetch_aprs(
    ctx: &ReadContext,
    client: &reqwest::Client,
    url: &str,
    staking_tokens: &[Address],
) -> Result<HashMap<Address, AprFigures>, AprError> {
    let body = ctx
        .run(async {
            let response = client.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AprError::Status { status, body })
            }

            Ok::<_, AprError>(response.text().await?)
        })
        .await?;

    let aprs = parse_aprs(&body, staking_tokens)?;
    debug!(target: "lp-oracle::apr", requested = staking_tokens.len(), found = aprs.len(), "fetched aprs");

    Ok(aprs)
}

fn parse_aprs(body: &str, staking_tokens: &[Address]) -> Result<HashMap<Address, AprFigures>, AprError> {
    let AprResponse(mut all) = serde_json::from_str(body)?;

    Ok(staking_tokens
        .iter()
        .filter_map(|token| all.remove(token).map(|figures| (*token, figures)))
        .collect())
}
