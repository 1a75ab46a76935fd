use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use surveybank::analysis::{
    answer_rate_by_type, effectless_rate_by_category, type_preference,
};
use surveybank::models::ResponsesFile;
use surveybank::store::QuestionStore;
use surveybank::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Print store statistics and simulated-response analysis")]
struct Cli {
    /// Also analyse a responses file when it exists.
    #[arg(long, default_value_t = true)]
    responses: bool,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let store = QuestionStore::open(config.store_path())
        .with_context(|| format!("failed opening store {}", config.store_path().display()))?;

    let stats = store.statistics();
    println!("Total questions: {}", stats.total_questions);

    println!("\nCategory distribution:");
    for (category, count) in &stats.categories_distribution {
        println!("    - {}: {}", category, count);
    }

    println!("\nQuestion type distribution:");
    for (question_type, count) in &stats.question_types_distribution {
        println!("    - {}: {}", question_type, count);
    }

    let responses_path = config.responses_path();
    if !cli.responses || !responses_path.exists() {
        return Ok(());
    }

    let file = File::open(&responses_path)
        .with_context(|| format!("failed opening {}", responses_path.display()))?;
    let responses: ResponsesFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid responses file {}", responses_path.display()))?;

    let answer_rates = answer_rate_by_type(store.questions(), &responses.responses);
    println!("\nAnswer rate by question type (effective only):");
    for (question_type, rate) in &answer_rates {
        println!("    - {}: {:.3}", question_type, rate);
    }

    println!("\nEffectless rate by category:");
    for (category, rate) in effectless_rate_by_category(store.questions(), &responses.responses) {
        println!("    - {}: {:.3}", category, rate);
    }

    println!("\nQuestion type preference (normalized):");
    for (question_type, share) in type_preference(&answer_rates) {
        println!("    - {}: {:.3}", question_type, share);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
