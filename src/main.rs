mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use warmcache::config::Config;
use warmcache::observability::init_tracing;
use warmcache::service;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    match cli.command {
        Commands::Serve(args) => service::run(config, args.address).await?,
        Commands::RefreshOnce => {
            let report = service::refresh_once(config).await?;
            println!(
                "cycle {}: {} targets, {} refreshed, {} fetch failures, {} store failures in {:?}{}",
                report.cycle_id,
                report.populated,
                report.refreshed,
                report.fetch_failures,
                report.store_failures,
                report.elapsed,
                if report.enumeration_failed {
                    " (enumeration failed)"
                } else {
                    ""
                },
            );
        }
    }

    Ok(())
}
