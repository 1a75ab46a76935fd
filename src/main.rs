use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use surveybank::analysis::analyze_pool;
use surveybank::ingest::{split_pools, Pipeline};
use surveybank::lexicon::Lexicon;
use surveybank::models::{IndexedQuestion, Language, Question};
use surveybank::normalize::Normalizer;
use surveybank::retrieval::RetrievalEngine;
use surveybank::store::QuestionStore;
use surveybank::AppConfig;

fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let lexicon = Lexicon::default();
    let pipeline = Pipeline::new(lexicon.clone());

    let questions = match QuestionStore::open(config.store_path()) {
        Ok(store) => store.questions().to_vec(),
        Err(err) => {
            warn!("{err}; starting with an empty question pool");
            Vec::new()
        }
    };

    let (english, chinese) = split_pools(pipeline.prepare_pool(&questions));
    if english.is_empty() && chinese.is_empty() {
        anyhow::bail!("no usable questions in {}", config.store_path().display());
    }

    print_pool_report(&english, Language::En, &lexicon);
    print_pool_report(&chinese, Language::Zh, &lexicon);

    // A failed fit disables retrieval for that language only.
    let english_engine = build_engine(&pipeline, Language::En, &english);
    let chinese_engine = build_engine(&pipeline, Language::Zh, &chinese);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("=========================================");
        println!("   TOP {} RELATED QUESTIONS", config.retrieval.top_k);
        println!("=========================================");
        println!("1. English Survey");
        println!("2. Chinese Survey");
        println!("Type 'exit' to close program.");

        let Some(choice) = prompt(&mut lines, "Select: ")? else {
            break;
        };

        match choice.to_lowercase().as_str() {
            "1" => {
                if query_loop(&config, &pipeline, english_engine.as_ref(), &mut lines)? {
                    break;
                }
            }
            "2" => {
                if query_loop(&config, &pipeline, chinese_engine.as_ref(), &mut lines)? {
                    break;
                }
            }
            "exit" => {
                println!("Exiting.");
                break;
            }
            _ => println!("Invalid selection."),
        }
    }

    Ok(())
}

fn build_engine(
    pipeline: &Pipeline,
    language: Language,
    pool: &[IndexedQuestion],
) -> Option<RetrievalEngine> {
    match RetrievalEngine::build(pipeline.normalizer(), language, pool) {
        Ok(engine) => Some(engine),
        Err(err) => {
            warn!("{} retrieval disabled: {err}", language.as_str());
            None
        }
    }
}

fn print_pool_report(pool: &[IndexedQuestion], language: Language, lexicon: &Lexicon) {
    if pool.is_empty() {
        return;
    }
    let questions: Vec<Question> = pool.iter().map(|entry| entry.question.clone()).collect();
    println!();
    println!("{}", analyze_pool(&questions, language, lexicon));
}

/// Inner requirement loop for one language. Returns true when the user asked
/// to terminate the whole program.
fn query_loop(
    config: &AppConfig,
    pipeline: &Pipeline,
    engine: Option<&RetrievalEngine>,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<bool> {
    let Some(engine) = engine else {
        println!("No questions available for this language.");
        return Ok(false);
    };

    loop {
        println!();
        println!(
            "--- Generate {} Survey (Target: {})",
            engine.language().as_str().to_uppercase(),
            config.retrieval.top_k
        );
        println!("Enter requirement (or type 'exit'):");

        let Some(requirement) = prompt(lines, ">> ")? else {
            return Ok(true);
        };
        let requirement = requirement.trim();

        if requirement.eq_ignore_ascii_case("exit") {
            println!("Terminating program.");
            return Ok(true);
        }
        if requirement.is_empty() {
            continue;
        }

        print_hits(pipeline.normalizer(), engine, requirement, config);
    }
}

fn print_hits(
    normalizer: &Normalizer,
    engine: &RetrievalEngine,
    requirement: &str,
    config: &AppConfig,
) {
    let hits = engine.query(
        normalizer,
        requirement,
        config.retrieval.top_k,
        config.retrieval.min_score,
    );

    println!();
    println!("Results for: '{}'", requirement);
    println!("{}", "-".repeat(40));

    if hits.is_empty() {
        println!("No matches found.");
        return;
    }

    for (rank, hit) in hits.iter().enumerate() {
        let stars = "★".repeat(hit.difficulty as usize);
        let holes = "☆".repeat(5usize.saturating_sub(hit.difficulty as usize));
        println!(
            "{}. [Match: {}%] [Diff: {} {}{}]",
            rank + 1,
            (hit.score * 100.0) as i32,
            hit.difficulty,
            stars,
            holes
        );
        println!("    {}", hit.question_text);
        if let Some(options) = hit.options.as_deref() {
            if !options.trim().is_empty() {
                println!("    (Options: {})", options);
            }
        }
        println!("{}", "-".repeat(40));
    }
}

/// Prints a prompt and reads one line; None means end of input.
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
