use clap::Parser;
use lp_price_oracle::{aux, cli::CliCmd};

fn main() {
    dotenv::dotenv().ok();

    let cli = CliCmd::parse();
    aux::init(cli.verbosity.directive());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Error: {err:?}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(lp_price_oracle::run(cli)) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
