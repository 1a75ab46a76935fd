use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    OpenEnded,
    YesNo,
    Rating,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::OpenEnded => "open_ended",
            QuestionType::YesNo => "yes_no",
            QuestionType::Rating => "rating",
        }
    }

    /// Maps the free-form labels found in raw exports; anything unrecognised
    /// is treated as open-ended.
    pub fn from_raw(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "single_choice" | "single" => QuestionType::SingleChoice,
            "multiple_choice" | "multi" => QuestionType::MultipleChoice,
            "yes_no" | "yesno" => QuestionType::YesNo,
            "rating" | "scale" => QuestionType::Rating,
            _ => QuestionType::OpenEnded,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<String>,
    pub category: String,
    pub language: Language,
    pub difficulty: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub usage_count: u64,
}

impl Question {
    /// Splits the raw options string on the separators used across the raw
    /// exports. The difficulty heuristic intentionally counts only `/`.
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_deref()
            .unwrap_or("")
            .split(['/', ';', ','])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn tags_joined(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One record from a raw question export. Raw files are schema-less; every
/// field is optional and defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub options_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Raw exports come either as a bare array or wrapped in `fullContent`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawDocument {
    Wrapped {
        #[serde(rename = "fullContent")]
        full_content: Vec<RawRecord>,
    },
    Bare(Vec<RawRecord>),
}

impl RawDocument {
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            RawDocument::Wrapped { full_content } => full_content,
            RawDocument::Bare(records) => records,
        }
    }
}

fn default_question_count() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub difficulty_range: Option<(u8, u8)>,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text_input: Option<String>,
}

impl Default for Requirement {
    fn default() -> Self {
        Self {
            topic: String::new(),
            language: None,
            categories: Vec::new(),
            difficulty_range: None,
            question_count: default_question_count(),
            title: String::new(),
            description: String::new(),
            free_text_input: None,
        }
    }
}

impl Requirement {
    /// The free-text query the ranking phase matches candidates against.
    pub fn synthetic_query(&self) -> String {
        [self.title.as_str(), self.description.as_str(), self.topic.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsFile {
    pub requirements: Requirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub target_audience: String,
    pub requirements: Requirement,
    pub question_ids: Vec<u64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub question: Question,
    pub score: f32,
    /// The requested category this candidate was pinned for, when the
    /// coverage passes selected it; used for output grouping.
    pub assigned_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssembledSet {
    pub selected: Vec<RankedCandidate>,
    pub by_category: BTreeMap<String, Vec<u64>>,
}

impl AssembledSet {
    pub fn question_ids(&self) -> Vec<u64> {
        self.selected.iter().map(|c| c.question.id).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderedQuestion {
    pub id: u64,
    pub category: String,
    pub score: f32,
    pub difficulty: u8,
    pub question_text: String,
    pub options: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub requirements: RequirementsFile,
    pub question_count_requested: usize,
    pub question_ids: Vec<u64>,
    pub by_category: BTreeMap<String, Vec<u64>>,
    pub ordered_questions: Vec<OrderedQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedResponse {
    pub user_id: u64,
    pub question_id: u64,
    pub answer: String,
    pub effective: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesFile {
    pub responses: Vec<SimulatedResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_questions: usize,
    pub categories_distribution: BTreeMap<String, usize>,
    pub question_types_distribution: BTreeMap<String, usize>,
}

/// A question paired with its recomputed normalized key, ready for index
/// construction. Keys are derived at load time, never persisted.
#[derive(Debug, Clone)]
pub struct IndexedQuestion {
    pub question: Question,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: u64,
    pub question_text: String,
    pub options: Option<String>,
    pub difficulty: u8,
    pub score: f32,
}
