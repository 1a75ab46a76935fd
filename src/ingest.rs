use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::dedupe::dedupe;
use crate::difficulty::DifficultyScorer;
use crate::error::{Result, SurveyError};
use crate::lexicon::Lexicon;
use crate::models::{
    IndexedQuestion, Language, Question, QuestionType, RawDocument, RawRecord,
};
use crate::normalize::{detect_language, Normalizer};

/// Cleaned texts this short are dropped as junk rows.
const MIN_TEXT_CHARS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CleaningReport {
    pub raw_count: usize,
    pub kept: usize,
    pub english: usize,
    pub chinese: usize,
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "          DATA CLEANING REPORT")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "1. Raw Questions Loaded:     {}", self.raw_count)?;
        writeln!(f, "2. Final Valid Questions:    {}", self.kept)?;
        writeln!(f, "   > English Pool:           {}", self.english)?;
        writeln!(f, "   > Chinese Pool:           {}", self.chinese)?;
        write!(f, "{}", "=".repeat(50))
    }
}

/// Cleaning, deduplication and scoring pipeline: raw records in, keyed and
/// scored questions out.
pub struct Pipeline {
    normalizer: Normalizer,
    scorer: DifficultyScorer,
}

impl Pipeline {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            normalizer: Normalizer::new(lexicon.clone()),
            scorer: DifficultyScorer::new(lexicon),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Full ingest pass over a raw export: clean each text, drop junk rows,
    /// detect language, score difficulty, collapse duplicates (first seen
    /// wins) and assign dense ids.
    pub fn process_raw(&self, records: Vec<RawRecord>) -> (Vec<IndexedQuestion>, CleaningReport) {
        let mut report = CleaningReport {
            raw_count: records.len(),
            ..CleaningReport::default()
        };

        let mut cleaned: Vec<Question> = Vec::with_capacity(records.len());
        for record in records {
            let text = self.normalizer.clean(&record.question_text);
            if text.chars().count() < MIN_TEXT_CHARS {
                continue;
            }

            let language = detect_language(&text);
            let question_type = QuestionType::from_raw(&record.question_type);
            let options = record
                .options_text
                .filter(|options| !options.trim().is_empty());
            let category = record
                .category
                .filter(|category| !category.trim().is_empty())
                .unwrap_or_else(|| "general".to_string());

            let difficulty =
                self.scorer
                    .score_parts(&text, question_type, options.as_deref(), language);

            cleaned.push(Question {
                id: 0,
                question_text: text,
                question_type,
                options,
                category: category.clone(),
                language,
                difficulty,
                tags: vec![category.to_lowercase(), language.as_str().to_string()],
                usage_count: 0,
            });
        }

        let mut kept = dedupe(&self.normalizer, cleaned);
        for (index, entry) in kept.iter_mut().enumerate() {
            entry.question.id = index as u64 + 1;
        }

        report.kept = kept.len();
        report.english = kept
            .iter()
            .filter(|q| q.question.language == Language::En)
            .count();
        report.chinese = report.kept - report.english;

        info!(
            raw = report.raw_count,
            kept = report.kept,
            english = report.english,
            chinese = report.chinese,
            "processed raw question export"
        );

        (kept, report)
    }

    /// Recomputes normalized keys for questions loaded from the store.
    /// Keys are never persisted; deduplication keeps the session pool
    /// consistent even if the store was edited by hand.
    pub fn prepare_pool(&self, questions: &[Question]) -> Vec<IndexedQuestion> {
        dedupe(&self.normalizer, questions.to_vec())
    }
}

/// Splits a keyed pool per language, detected from the question text.
/// An empty pool on one side never affects the other.
pub fn split_pools(pool: Vec<IndexedQuestion>) -> (Vec<IndexedQuestion>, Vec<IndexedQuestion>) {
    pool.into_iter()
        .partition(|entry| detect_language(&entry.question.question_text) == Language::En)
}

/// Loads a raw question export: either a bare array of records or an object
/// wrapping them in `fullContent`.
pub fn load_raw(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        SurveyError::Data(format!("cannot open {}: {err}", path.display()))
    })?;
    let document: RawDocument =
        serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            SurveyError::Data(format!("{} is not a valid raw export: {err}", path.display()))
        })?;
    Ok(document.into_records())
}
