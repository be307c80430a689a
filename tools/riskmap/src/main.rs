//! Operator CLI for the risk map classifier service: summarize a data set,
//! run one what-if prediction, or check the service's model vocabulary.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use riskmap_client::{Classifier, ClientConfig, Dashboard, HttpClassifier, LoadState, Simulator};
use riskmap_core::{
    stats::aggregate, Completion, RiskCollection, RiskLevel, RiskSummary, SessionError,
    SimulationInput,
};
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "riskmap", about = "Waste-accumulation risk map client")]
struct Args {
    /// JSON client config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service root, overrides the config file.
    #[arg(short, long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count zones per risk level and list features that fail integrity checks.
    Summary {
        /// Read a local GeoJSON file instead of fetching /api/risk-data.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run one what-if prediction.
    Predict {
        /// Persons per km².
        #[arg(long, default_value_t = 3000.0)]
        pop_density: f64,

        /// Metres to the nearest disposal site.
        #[arg(long = "dist", default_value_t = 500.0)]
        dist_to_disposal: f64,

        /// kg per day.
        #[arg(long, default_value_t = 50.0)]
        waste_volume: f64,

        /// Good, Moderate or Poor.
        #[arg(long, default_value = "Moderate")]
        road_access: String,

        #[arg(long, default_value = "Residential")]
        zone_type: String,
    },

    /// Fetch /api/model-info and check it against this client's vocabulary.
    Info,
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_summary(collection: &RiskCollection, summary: &RiskSummary) {
    println!("{:<8} {:>6} {:>7}", "Level", "Zones", "Share");
    println!("{}", "-".repeat(23));
    for level in RiskLevel::ALL.into_iter().rev() {
        println!(
            "{:<8} {:>6} {:>6.1}%",
            level,
            summary.count(level),
            summary.share(level) * 100.0
        );
    }
    println!("{}", "-".repeat(23));
    println!("{:<8} {:>6}", "Total", summary.total);
    println!("Mean score: {:.2}", summary.mean_score);
    if let Some(level) = summary.dominant() {
        println!("Dominant:   {level}");
    }

    if summary.invalid > 0 {
        println!("\n{} feature(s) failed integrity checks:", summary.invalid);
        for v in collection.violations() {
            println!("  {v}");
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn summary(config: ClientConfig, file: Option<PathBuf>) -> Result<()> {
    if let Some(path) = file {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let collection = RiskCollection::from_geojson(&text)
            .with_context(|| format!("decoding {}", path.display()))?;
        print_summary(&collection, &aggregate(&collection));
        return Ok(());
    }

    let mut dashboard = Dashboard::new(HttpClassifier::new(config)?);
    match dashboard.load().await {
        LoadState::Ready { collection, summary } => {
            print_summary(collection, summary);
            Ok(())
        }
        LoadState::Failed(e) => bail!("failed to load risk data: {e}"),
        LoadState::Loading => bail!("risk data load did not finish"),
    }
}

async fn predict(config: ClientConfig, input: SimulationInput) -> Result<()> {
    let policy = config.submit_policy;
    let mut simulator = Simulator::with_input(HttpClassifier::new(config)?, input, policy);

    match simulator.run().await {
        Ok(Completion::Applied) => {}
        Ok(_) => match simulator.session().error() {
            Some(e) => bail!("prediction failed: {e}"),
            None => bail!("prediction response was discarded"),
        },
        Err(SessionError::Validation(e)) => bail!("invalid input, {e}"),
        Err(e) => return Err(e.into()),
    }

    let Some(result) = simulator.session().result() else {
        bail!("no prediction result");
    };
    let card = result.card();
    println!("Risk:       {} ({})", result.level, card.label);
    println!("Confidence: {}", card.confidence);
    if let Some(p) = result.probabilities {
        for level in RiskLevel::ALL.into_iter().rev() {
            println!("  P({:<6}) = {:.3}", level.as_str(), p.get(level));
        }
    }
    Ok(())
}

async fn info(config: ClientConfig) -> Result<()> {
    let classifier = HttpClassifier::new(config)?;
    let info = classifier.model_info().await.context("checking model info")?;
    println!("Model:    {}", info.model);
    println!("Features: {}", info.features.join(", "));
    println!("Classes:  {}", info.classes.join(", "));
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::debug!(base_url = %config.base_url, "using classifier service");

    match args.command {
        Command::Summary { file } => summary(config, file).await,
        Command::Predict { pop_density, dist_to_disposal, waste_volume, road_access, zone_type } => {
            let input = SimulationInput {
                pop_density,
                dist_to_disposal,
                waste_volume,
                road_access,
                zone_type,
            };
            predict(config, input).await
        }
        Command::Info => info(config).await,
    }
}
