use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{ArgAction, Args, Parser};

use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::filter::Directive;

use crate::decimal::DecimalValue;

pub const DEFAULT_RPC_URL: &str = "https://rpc.berachain.com";

#[derive(Debug, Parser)]
#[command(about = "LP token price and TVL oracle", long_about = None)]
pub struct CliCmd {
    /// address of the pool whose LP token is priced
    #[arg(short, long, default_value = "0xcffbfd665bedb19b47837461a5abf4388c560d35")]
    pub address: Address,

    /// JSON-RPC endpoint of the chain the pool lives on
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// USD price of token0
    #[arg(long, default_value = "1.0")]
    pub price0: DecimalValue,

    /// USD price of token1
    #[arg(long, default_value = "1.0")]
    pub price1: DecimalValue,

    #[arg(long, default_value = "TOKEN0")]
    pub symbol0: String,

    #[arg(long, default_value = "TOKEN1")]
    pub symbol1: String,

    /// on-chain decimals of token0
    #[arg(long, default_value_t = 18)]
    pub decimals0: u8,

    /// on-chain decimals of token1
    #[arg(long, default_value_t = 18)]
    pub decimals1: u8,

    /// JSON price table keyed by token address, replaces the per-token flags
    #[arg(long)]
    pub prices: Option<PathBuf>,

    /// previously printed configuration blob, skips resolving it on-chain
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// seconds every chain and http read must finish within
    #[arg(short, long, default_value_t = 30)]
    pub timeout: u64,

    /// endpoint publishing APRs keyed by staking token address
    #[arg(long, env = "APR_API_URL")]
    pub apr_api: Option<String>,

    /// staking tokens to look up APRs for
    #[arg(long = "staking-token")]
    pub staking_tokens: Vec<Address>,

    #[clap(flatten)]
    pub verbosity: Verbosity,
}

/// The verbosity settings for the cli.
#[derive(Debug, Copy, Clone, Args)]
#[command(next_help_heading = "Display")]
pub struct Verbosity {
    /// Set the minimum log level.
    ///
    /// -v      Errors
    /// -vv     Warnings
    /// -vvv    Info
    /// -vvvv   Debug
    /// -vvvvv  Traces (warning: very verbose!)
    #[clap(short, long, action = ArgAction::Count, global = true, default_value_t = 3, verbatim_doc_comment, help_heading = "Display")]
    verbosity: u8,

    /// Silence all log output.
    #[clap(
        long,
        alias = "silent",
        short = 'q',
        global = true,
        help_heading = "Display"
    )]
    quiet: bool,
}

impl Verbosity {
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::OFF
        }

        let level = match self.verbosity.saturating_sub(1) {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        };

        LevelFilter::from_level(level)
    }

    /// Get the corresponding [Directive] for the given verbosity, scoped to
    /// this crate's log targets.
    pub fn directive(&self) -> Directive {
        let level = self.level();
        format!("lp-oracle={level}")
            .parse()
            .unwrap_or_else(|_| level.into())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn defaults_match_the_bulla_vault() {
        let cli = CliCmd::try_parse_from(["lp-price-oracle"]).unwrap();

        assert_eq!(cli.address, address!("cffbfd665bedb19b47837461a5abf4388c560d35"));
        assert_eq!(cli.price0, DecimalValue::from(1u64));
        assert_eq!(cli.decimals1, 18);
        assert_eq!(cli.timeout, 30);
        assert!(cli.staking_tokens.is_empty());
        assert_eq!(cli.verbosity.level(), LevelFilter::INFO);
    }

    #[test]
    fn parses_prices_and_staking_tokens() {
        let cli = CliCmd::try_parse_from([
            "lp-price-oracle",
            "--price0",
            "3.25",
            "--decimals1",
            "6",
            "--staking-token",
            "0xb5d46214f4ec7f910cb433e412d32ee817986e90",
            "--staking-token",
            "0xcffbfd665bedb19b47837461a5abf4388c560d35",
            "-vvvv",
        ])
        .unwrap();

        assert_eq!(cli.price0, "3.25".parse::<DecimalValue>().unwrap());
        assert_eq!(cli.decimals1, 6);
        assert_eq!(cli.staking_tokens.len(), 2);
        assert_eq!(cli.verbosity.level(), LevelFilter::DEBUG);
    }

    #[test]
    fn quiet_silences_everything() {
        let cli = CliCmd::try_parse_from(["lp-price-oracle", "-q"]).unwrap();
        assert_eq!(cli.verbosity.level(), LevelFilter::OFF);
    }

    #[test]
    fn rejects_bad_prices() {
        assert!(CliCmd::try_parse_from(["lp-price-oracle", "--price1", "one"]).is_err());
        assert!(CliCmd::try_parse_from(["lp-price-oracle", "--address", "0x12"]).is_err());
    }
}
