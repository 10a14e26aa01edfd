use std::{sync::Arc, time::Duration};

use cli::CliCmd;
use eyre::WrapErr;
use node::{ChainReader, ReadContext, RpcChainReader};
use pools::{LpPriceOracle, PoolConfigResolver, PoolConfiguration};
use prices::{AssetPriceTable, TokenInfo};
use tracing::info;

pub mod apr;
pub mod aux;
pub mod cli;
pub mod decimal;
pub mod errors;
pub mod node;
pub mod pools;
pub mod prices;
pub mod utils;

#[cfg(test)]
mod mock;

pub async fn run(cli: CliCmd) -> eyre::Result<()> {
    let node: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(&cli.rpc_url)?);
    let timeout = Duration::from_secs(cli.timeout);

    let config = load_config(&cli, node.clone(), &ReadContext::with_timeout(timeout)).await?;
    println!("Config: {}", config.as_json());

    let prices = Arc::new(load_prices(&cli, &config)?);
    for token in prices.iter() {
        info!(
            target: "lp-oracle",
            token = ?token.address,
            symbol = %token.symbol,
            decimals = token.decimals,
            usd_price = %token.usd_price,
            "loaded price"
        );
    }

    let oracle = LpPriceOracle::new(node, cli.address, prices, config.raw())?;
    oracle.initialize(&ReadContext::with_timeout(timeout)).await?;

    let quote = oracle.quote()?;
    println!("LP Token Price: ${}", quote.lp_token_price);
    println!("TVL: ${}", quote.tvl);

    if let Some(url) = cli.apr_api.as_deref() {
        let aprs = apr::fetch_aprs(
            &ReadContext::with_timeout(timeout),
            &reqwest::Client::new(),
            url,
            &cli.staking_tokens,
        )
        .await?;

        for (token, figures) in &aprs {
            info!(target: "lp-oracle::apr", ?token, apr = %figures.apr, "staking apr");
        }
    }

    Ok(())
}

async fn load_config(
    cli: &CliCmd,
    node: Arc<dyn ChainReader>,
    ctx: &ReadContext,
) -> eyre::Result<PoolConfiguration> {
    match &cli.config {
        Some(path) => {
            let raw = std::fs::read(path).wrap_err_with(|| format!("reading config {}", path.display()))?;
            Ok(PoolConfiguration::from_raw(&raw)?)
        }
        None => Ok(PoolConfigResolver::new(node).resolve(ctx, cli.address).await?),
    }
}

fn load_prices(cli: &CliCmd, config: &PoolConfiguration) -> eyre::Result<AssetPriceTable> {
    if let Some(path) = &cli.prices {
        let json = std::fs::read_to_string(path).wrap_err_with(|| format!("reading prices {}", path.display()))?;
        return Ok(AssetPriceTable::from_json(&json)?)
    }

    Ok([
        TokenInfo::new(config.token0(), cli.symbol0.clone(), cli.decimals0, cli.price0.clone()),
        TokenInfo::new(config.token1(), cli.symbol1.clone(), cli.decimals1, cli.price1.clone()),
    ]
    .into_iter()
    .collect())
}
