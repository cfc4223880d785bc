mod scan;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "salewatch-cli")]
#[command(about = "Salewatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape cycle over the brand catalog and print the results.
    Scan(scan::ScanArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => scan::run(args).await,
    }
}
