mod scrape;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopsnap-cli")]
#[command(about = "Export a storefront's catalogue to CSV and JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape one storefront and write its export artifacts
    Scrape(ScrapeArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ScrapeArgs {
    /// Storefront URL; only its origin is used
    pub shop_url: String,

    /// Also summarize the homepage sections
    #[arg(long)]
    pub homepage: bool,

    /// Skip the sitemap/product export
    #[arg(long)]
    pub no_products: bool,

    /// Extra page to capture, relative to the store root (repeatable)
    #[arg(long = "key-page", value_name = "PATH")]
    pub key_pages: Vec<String>,

    /// Export directory; defaults to SHOPSNAP_EXPORT_DIR
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Print the CSV to stdout instead of writing artifacts
    #[arg(long)]
    pub stdout: bool,

    /// Fail on the first invalid variant instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = shopsnap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape(args) => scrape::run_scrape_command(&config, args).await,
    }
}
