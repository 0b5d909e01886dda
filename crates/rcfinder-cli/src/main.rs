mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use rcfinder_geo::RegionResolver;

use crate::commands::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "rcfinder-cli")]
#[command(about = "Regional center finder command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the regional center catalog.
    Regions,
    /// Resolve a coordinate and/or ZIP code to its regional center.
    Resolve {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        #[arg(long)]
        zip: Option<String>,
    },
    /// Search providers around a location.
    Search(SearchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = rcfinder_core::load_app_config()?;
    let resolver = Arc::new(RegionResolver::load(
        &config.regions_path,
        &config.boundaries_path,
    )?);

    match cli.command {
        Commands::Regions => commands::run_regions(&resolver),
        Commands::Resolve { lat, lng, zip } => commands::run_resolve(&resolver, lat, lng, zip),
        Commands::Search(args) => commands::run_search(&config, resolver, args).await,
    }
}
