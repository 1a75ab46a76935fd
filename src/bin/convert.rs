use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use surveybank::ingest::{load_raw, Pipeline};
use surveybank::lexicon::Lexicon;
use surveybank::models::Question;
use surveybank::store::QuestionStore;
use surveybank::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "convert")]
#[command(about = "Convert a raw question export into the question store schema")]
struct Cli {
    /// Raw export: a JSON array of records, or an object with `fullContent`.
    #[arg(long, default_value = "questions.json")]
    input: String,
    /// Target store file; defaults to the configured store path.
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let output = cli
        .output
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.store_path());

    let records = load_raw(&cli.input).with_context(|| format!("failed loading {}", cli.input))?;
    println!("Converting {} questions...", records.len());

    let pipeline = Pipeline::new(Lexicon::default());
    let (kept, report) = pipeline.process_raw(records);
    println!("\n{report}\n");

    let questions: Vec<Question> = kept.into_iter().map(|entry| entry.question).collect();

    let mut store = QuestionStore::open(&output)
        .with_context(|| format!("failed opening store {}", output.display()))?;
    store
        .replace_questions(questions)
        .with_context(|| format!("failed writing store {}", output.display()))?;

    let stats = store.statistics();
    println!("Conversion completed! Saved to {}", output.display());
    println!("Total questions converted: {}", stats.total_questions);

    println!("\nSample questions:");
    for (index, question) in store.questions().iter().take(3).enumerate() {
        println!("{}. {}", index + 1, question.question_text);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
