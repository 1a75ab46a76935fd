use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use surveybank::assembler::{
    build_output, infer_requirement, load_requirements, render_output_text, Assembler,
};
use surveybank::lexicon::Lexicon;
use surveybank::normalize::Normalizer;
use surveybank::store::QuestionStore;
use surveybank::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Assemble a questionnaire from a requirements file")]
struct Cli {
    /// Requirements file; defaults to the configured path.
    #[arg(long)]
    requirements: Option<String>,
    /// Skip the free-text prompt and use the requirements file as-is.
    #[arg(long, default_value_t = false)]
    batch: bool,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let requirements_path = cli
        .requirements
        .map(PathBuf::from)
        .unwrap_or_else(|| config.requirements_path());

    if !requirements_path.exists() {
        anyhow::bail!("Requirements file not found: {}", requirements_path.display());
    }

    let free_text = if cli.batch {
        String::new()
    } else {
        println!(
            "Enter free-text description to guide questionnaire generation \
             (or press Enter to use existing requirements):"
        );
        read_line("> ")?
    };

    // Empty input: fall back to the default requirements file when present,
    // leaving the main file untouched. Free text: infer fields, persist them
    // into the main file, then generate from it.
    let used_path = if free_text.is_empty() {
        let default_path = config.default_requirements_path();
        if default_path.exists() {
            println!(
                "No free-text provided — using default requirements: {}",
                default_path.display()
            );
            default_path
        } else {
            println!(
                "No free-text provided and default not found — using {}",
                requirements_path.display()
            );
            requirements_path
        }
    } else {
        let mut file = load_requirements(&requirements_path)?;
        let inferred = infer_requirement(&free_text, &Lexicon::default());

        file.requirements.free_text_input = Some(free_text.clone());
        file.requirements.topic = inferred.topic.clone();
        file.requirements.language = Some(inferred.language);
        if !inferred.categories.is_empty() {
            file.requirements.categories = inferred.categories.clone();
        }

        let serialized = serde_json::to_string_pretty(&file)?;
        std::fs::write(&requirements_path, serialized)
            .with_context(|| format!("failed updating {}", requirements_path.display()))?;

        println!(
            "Updated {} with topic='{}', language='{}', categories={:?}",
            requirements_path.display(),
            inferred.topic,
            inferred.language.as_str(),
            inferred.categories
        );
        requirements_path
    };

    let requirements = load_requirements(&used_path)?;

    let mut store = QuestionStore::open(config.store_path())
        .with_context(|| format!("failed opening store {}", config.store_path().display()))?;
    let pool = store.questions().to_vec();

    let normalizer = Normalizer::new(Lexicon::default());
    let assembler = Assembler::new(&normalizer);
    let set = assembler.assemble(&requirements.requirements, &pool);

    // Record the generated questionnaire so usage counts reflect selection.
    let title = if requirements.requirements.title.is_empty() {
        "Generated questionnaire"
    } else {
        requirements.requirements.title.as_str()
    };
    let questionnaire_id = store.create_questionnaire(
        title,
        &requirements.requirements.description,
        "survey respondents",
        requirements.requirements.clone(),
    )?;
    for id in set.question_ids() {
        store.link_question(questionnaire_id, id)?;
    }
    info!(questionnaire_id, selected = set.selected.len(), "linked questionnaire");

    let output = build_output(requirements, &set);

    let json_path = config.output_json_path();
    let text_path = config.output_text_path();
    std::fs::write(&json_path, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("failed writing {}", json_path.display()))?;
    std::fs::write(&text_path, render_output_text(&output))
        .with_context(|| format!("failed writing {}", text_path.display()))?;

    println!(
        "Wrote {} and {} with {} ids",
        json_path.display(),
        text_path.display(),
        output.question_ids.len()
    );

    Ok(())
}

fn read_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
