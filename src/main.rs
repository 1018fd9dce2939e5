use clap::Parser;

use hoist::cli::Cli;
use hoist::core::style;
use hoist::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The guard keeps the non-blocking log writers alive until exit
    let _guard = match logging::init(cli.verbose) {
        Ok((guard, path)) => {
            tracing::debug!("logging to {}", path.display());
            Some(guard)
        }
        Err(err) => {
            eprintln!("{}", style::warning(&format!("logging disabled: {err:#}")));
            None
        }
    };

    if let Err(err) = cli.run().await {
        eprintln!("{}", style::error(&format!("{err:#}")));
        std::process::exit(1);
    }
}
