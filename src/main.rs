//! tcg-charts - Batch CLI that charts TCGplayer price history per product

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tcg_charts::commands::{ChartCommand, ListCommand, RenderMode};
use tcg_charts::config::Config;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tcg-charts",
    version,
    about = "Batch CLI that charts TCGplayer price history per product",
    long_about = "Lists products from a TCGplayer search, fetches each product's \
price history and thumbnail, and renders price-over-time charts."
)]
struct Cli {
    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "TCG_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "TCG_DELAY")]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory chart PNGs are written to
    #[arg(short, long, global = true, env = "TCG_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render price-over-time charts for every product a search returns
    #[command(alias = "c")]
    Chart {
        /// Search query
        query: String,

        /// Number of search pages to list
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        pages: Option<u32>,

        /// Tile all charts into one combined PNG instead of one per product
        #[arg(long)]
        tiled: bool,

        /// Price history window requested from the API
        #[arg(long)]
        range: Option<String>,

        /// Product line searched
        #[arg(long)]
        product_line: Option<String>,
    },

    /// List product identifiers for a search query without charting
    #[command(alias = "l")]
    List {
        /// Search query
        query: String,

        /// Number of search pages to list
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        pages: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }

    match cli.command {
        Commands::Chart { query, pages, tiled, range, product_line } => {
            if let Some(pages) = pages {
                config.pages = pages;
            }
            if let Some(range) = range {
                config.range = range;
            }
            if let Some(product_line) = product_line {
                config.product_line = product_line;
            }

            let mode = if tiled { RenderMode::Tiled } else { RenderMode::Standalone };

            let cmd = ChartCommand::new(config);
            let output = cmd.execute(&query, mode).await?;
            println!("{}", output);
        }

        Commands::List { query, pages } => {
            if let Some(pages) = pages {
                config.pages = pages;
            }

            let cmd = ListCommand::new(config);
            let output = cmd.execute(&query).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
