//! One-shot development tool: seed the in-memory stores from a JSON file of
//! business listings, run a single search or suggest call, print JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use geo_search_engine::cache::InMemoryCacheStore;
use geo_search_engine::config::EngineConfig;
use geo_search_engine::geo::Coordinates;
use geo_search_engine::models::Business;
use geo_search_engine::query::{RawLocationQuery, SortOrder};
use geo_search_engine::search::{InMemorySpatialStore, SearchOrchestrator, SpatialStore};
use geo_search_engine::suggest::{
    BusinessNameSource, CategoryCatalogSource, SuggestOptions, SuggestionAggregator,
    SuggestionSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "geo-search-cli", version, about = "Run one-shot searches against a seeded engine")]
struct Cli {
    /// JSON file containing an array of business listings
    #[arg(long, global = true, default_value = "businesses.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a location search and print the result page
    Search {
        #[arg(long)]
        lat: f64,

        #[arg(long)]
        lng: f64,

        #[arg(long)]
        radius_km: Option<f64>,

        /// May be repeated
        #[arg(long = "category")]
        categories: Vec<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        /// distance | rating | popularity | price
        #[arg(long)]
        sort_by: Option<String>,

        #[arg(long)]
        open_only: bool,
    },

    /// Run autocomplete and print the ranked suggestions
    Suggest {
        #[arg(long)]
        text: String,

        #[arg(long)]
        lat: Option<f64>,

        #[arg(long)]
        lng: Option<f64>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geo_search_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        EngineConfig::default()
    });

    let cli = Cli::parse();

    let raw_data = std::fs::read_to_string(&cli.data)
        .with_context(|| format!("reading {}", cli.data.display()))?;
    let businesses: Vec<Business> =
        serde_json::from_str(&raw_data).with_context(|| format!("parsing {}", cli.data.display()))?;

    let spatial = Arc::new(InMemorySpatialStore::new());
    let mut catalog: Vec<String> = Vec::new();
    for business in businesses {
        for category in &business.categories {
            if !catalog.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                catalog.push(category.clone());
            }
        }
        spatial.upsert(business);
    }
    tracing::info!(count = spatial.len(), "Seeded in-memory spatial store");

    match cli.command {
        Commands::Search {
            lat,
            lng,
            radius_km,
            categories,
            text,
            page,
            page_size,
            sort_by,
            open_only,
        } => {
            let sort_by = sort_by
                .map(|s| {
                    s.parse::<SortOrder>()
                        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
                })
                .transpose()?;

            let raw = RawLocationQuery {
                lat,
                lng,
                radius_km,
                categories,
                text,
                page,
                page_size,
                sort_by,
                price_range: None,
                amenities: Vec::new(),
                open_only: open_only.then_some(true),
            };

            let cache = Arc::new(InMemoryCacheStore::new());
            let orchestrator = SearchOrchestrator::new(spatial, cache, &config);
            let result = orchestrator.search(&raw).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Suggest { text, lat, lng, limit } => {
            let location = match (lat, lng) {
                (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
                (None, None) => None,
                _ => anyhow::bail!("--lat and --lng must be provided together"),
            };

            let sources: Vec<Arc<dyn SuggestionSource>> = vec![
                Arc::new(BusinessNameSource::new(
                    spatial as Arc<dyn SpatialStore>,
                    &config.search,
                    config.suggest.name_search_radius_km,
                )),
                Arc::new(CategoryCatalogSource::new(catalog)),
            ];

            let aggregator = SuggestionAggregator::new(
                sources,
                config.suggest.clone(),
                Arc::new(geo_search_engine::SystemClock),
            );
            let results = aggregator
                .suggest(&text, location, &SuggestOptions { limit })
                .await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
