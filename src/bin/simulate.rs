use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use surveybank::models::ResponsesFile;
use surveybank::simulate::{simulate_responses, SimulationConfig};
use surveybank::store::QuestionStore;
use surveybank::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Generate synthetic survey responses over the question store")]
struct Cli {
    #[arg(long, default_value_t = 100)]
    users: u64,
    #[arg(long, default_value_t = 10)]
    min_questions: usize,
    #[arg(long, default_value_t = 15)]
    max_questions: usize,
    /// Seed for a reproducible run; omitted means a fresh random run.
    #[arg(long)]
    seed: Option<u64>,
    /// Output file; defaults to the configured responses path.
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let output = cli
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| config.responses_path());

    let store = QuestionStore::open(config.store_path())
        .with_context(|| format!("failed opening store {}", config.store_path().display()))?;

    let simulation = SimulationConfig {
        num_users: cli.users,
        min_questions: cli.min_questions,
        max_questions: cli.max_questions,
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let responses = simulate_responses(store.questions(), &simulation, &mut rng);

    let file = ResponsesFile { responses };
    std::fs::write(&output, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("failed writing {}", output.display()))?;

    println!("{} generated saved as {}", file.responses.len(), output.display());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
