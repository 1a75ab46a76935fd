use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::lexicon::Lexicon;
use crate::models::{
    AssembledSet, GenerationOutput, IndexedQuestion, Language, OrderedQuestion, Question,
    RankedCandidate, Requirement, RequirementsFile,
};
use crate::normalize::{detect_language, Normalizer};
use crate::retrieval::RetrievalEngine;

/// Score pinned onto coverage-gap selections found by synonym search.
const GAP_FALLBACK_SCORE: f32 = 0.5;

/// Ranks a candidate pool against a requirement, returning scores aligned
/// with the pool order. Two implementations exist because statistical
/// matching is only trusted for English; either can be swapped out without
/// touching the assembler.
pub trait RankingStrategy {
    fn rank(
        &self,
        normalizer: &Normalizer,
        requirement: &Requirement,
        pool: &[IndexedQuestion],
    ) -> Vec<f32>;
}

/// TF-IDF cosine over normalized keys against the requirement's synthetic
/// query. Falls back to keyword scoring when the pool is too small to fit.
pub struct TfidfStrategy;

impl RankingStrategy for TfidfStrategy {
    fn rank(
        &self,
        normalizer: &Normalizer,
        requirement: &Requirement,
        pool: &[IndexedQuestion],
    ) -> Vec<f32> {
        match RetrievalEngine::build(normalizer, Language::En, pool) {
            Ok(engine) => engine.similarities(normalizer, &requirement.synthetic_query()),
            Err(err) => {
                debug!("tf-idf ranking unavailable ({err}), falling back to keywords");
                KeywordStrategy.rank(normalizer, requirement, pool)
            }
        }
    }
}

/// Substring heuristic on the topic token: 3 points for a hit in the
/// question text, 2 for a hit in the joined tags, normalized by the maximum.
pub struct KeywordStrategy;

impl RankingStrategy for KeywordStrategy {
    fn rank(
        &self,
        _normalizer: &Normalizer,
        requirement: &Requirement,
        pool: &[IndexedQuestion],
    ) -> Vec<f32> {
        let topic = requirement.topic.to_lowercase();
        let topic = topic.trim();

        let mut scores: Vec<f32> = pool
            .iter()
            .map(|entry| {
                if topic.is_empty() {
                    return 0.0;
                }
                let mut score = 0.0;
                if entry.question.question_text.to_lowercase().contains(topic) {
                    score += 3.0;
                }
                if entry.question.tags_joined().contains(topic) {
                    score += 2.0;
                }
                score
            })
            .collect();

        let max = scores.iter().cloned().fold(0.0f32, f32::max);
        if max > 0.0 {
            for score in scores.iter_mut() {
                *score /= max;
            }
        }
        scores
    }
}

pub struct Assembler<'a> {
    normalizer: &'a Normalizer,
}

impl<'a> Assembler<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self { normalizer }
    }

    /// Six-phase selection: filter, rank, category coverage, coverage-gap
    /// search, fill by rank, relaxed shortfall. Never returns duplicate ids;
    /// the result holds min(question_count, reachable pool) entries.
    pub fn assemble(&self, requirement: &Requirement, pool: &[Question]) -> AssembledSet {
        let target = requirement.question_count;
        let req_categories: Vec<String> = requirement
            .categories
            .iter()
            .map(|c| c.to_lowercase())
            .collect();

        let language_pass = |question: &Question| match requirement.language {
            Some(language) => detect_language(&question.question_text) == language,
            None => true,
        };

        let filtered: Vec<&Question> = pool
            .iter()
            .filter(|q| language_pass(q))
            .filter(|q| {
                req_categories.is_empty() || req_categories.contains(&q.category.to_lowercase())
            })
            .filter(|q| match requirement.difficulty_range {
                Some((lo, hi)) => q.difficulty >= lo && q.difficulty <= hi,
                None => true,
            })
            .collect();

        let indexed: Vec<IndexedQuestion> = filtered
            .iter()
            .map(|q| IndexedQuestion {
                question: (*q).clone(),
                key: self.normalizer.dedup_key(
                    &q.question_text,
                    q.options.as_deref(),
                    q.language,
                ),
            })
            .collect();

        let strategy: Box<dyn RankingStrategy> = match requirement.language {
            Some(Language::En) => Box::new(TfidfStrategy),
            _ => Box::new(KeywordStrategy),
        };
        let scores = strategy.rank(self.normalizer, requirement, &indexed);

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        // Candidates per requested category, in rank order.
        let mut by_requested: HashMap<&str, Vec<(usize, f32)>> = HashMap::new();
        for &(index, score) in &ranked {
            let category = indexed[index].question.category.to_lowercase();
            if let Some(requested) = req_categories.iter().find(|rc| **rc == category) {
                by_requested
                    .entry(requested.as_str())
                    .or_default()
                    .push((index, score));
            }
        }

        let mut used: HashSet<u64> = HashSet::new();
        let mut selected: Vec<RankedCandidate> = Vec::new();

        // Coverage pass: the single top-ranked candidate per requested
        // category.
        for requested in &req_categories {
            if selected.len() >= target {
                break;
            }
            let Some(candidates) = by_requested.get(requested.as_str()) else {
                continue;
            };
            let Some(&(index, score)) = candidates.first() else {
                continue;
            };
            let question = &indexed[index].question;
            if used.insert(question.id) {
                selected.push(RankedCandidate {
                    question: question.clone(),
                    score,
                    assigned_category: Some(requested.clone()),
                });
            }
        }

        // Coverage-gap pass: categories with no direct match anywhere in the
        // filtered set are hunted across the ENTIRE pool via synonym tokens.
        for requested in &req_categories {
            if selected.len() >= target {
                break;
            }
            if by_requested.contains_key(requested.as_str()) {
                continue;
            }
            let tokens = self.normalizer.lexicon().category_tokens(requested);
            let found = pool.iter().find(|q| {
                if used.contains(&q.id) {
                    return false;
                }
                let text = q.question_text.to_lowercase();
                let tags = q.tags_joined();
                tokens
                    .iter()
                    .any(|token| text.contains(token.as_str()) || tags.contains(token.as_str()))
            });
            if let Some(question) = found {
                used.insert(question.id);
                selected.push(RankedCandidate {
                    question: question.clone(),
                    score: GAP_FALLBACK_SCORE,
                    assigned_category: Some(requested.clone()),
                });
            }
        }

        // Fill pass: global rank order.
        for &(index, score) in &ranked {
            if selected.len() >= target {
                break;
            }
            let question = &indexed[index].question;
            if used.insert(question.id) {
                selected.push(RankedCandidate {
                    question: question.clone(),
                    score,
                    assigned_category: None,
                });
            }
        }

        // Shortfall pass: relax everything except the language filter and
        // append in pool order. These carry score 0.0 so the assembled set
        // still reaches the requested count.
        if selected.len() < target {
            for question in pool.iter().filter(|q| language_pass(q)) {
                if selected.len() >= target {
                    break;
                }
                if used.insert(question.id) {
                    selected.push(RankedCandidate {
                        question: question.clone(),
                        score: 0.0,
                        assigned_category: None,
                    });
                }
            }
        }

        let mut by_category: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for candidate in &selected {
            by_category
                .entry(display_category(candidate))
                .or_default()
                .push(candidate.question.id);
        }

        AssembledSet {
            selected,
            by_category,
        }
    }
}

/// Grouping label for a selected candidate: the requested category it was
/// pinned for when the coverage passes chose it, else its native category;
/// empty categories fall back to "Uncategorized".
pub fn display_category(candidate: &RankedCandidate) -> String {
    let category = candidate
        .assigned_category
        .as_deref()
        .unwrap_or(&candidate.question.category);
    if category.trim().is_empty() {
        "Uncategorized".to_string()
    } else {
        title_case(category)
    }
}

/// Parses a requirements document. Structural problems are fatal: the caller
/// gets a `Validation` error and writes no partial output.
pub fn load_requirements(path: impl AsRef<std::path::Path>) -> crate::error::Result<RequirementsFile> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|err| {
        crate::error::SurveyError::Validation(format!("cannot read {}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        crate::error::SurveyError::Validation(format!(
            "{} is not a valid requirements file: {err}",
            path.display()
        ))
    })
}

/// Builds the structured generation output from an assembled set.
pub fn build_output(requirements: RequirementsFile, set: &AssembledSet) -> GenerationOutput {
    let question_count_requested = requirements.requirements.question_count;
    let ordered_questions: Vec<OrderedQuestion> = set
        .selected
        .iter()
        .map(|candidate| OrderedQuestion {
            id: candidate.question.id,
            category: display_category(candidate),
            score: candidate.score,
            difficulty: candidate.question.difficulty,
            question_text: candidate.question.question_text.clone(),
            options: candidate.question.options.clone(),
        })
        .collect();

    GenerationOutput {
        requirements,
        question_count_requested,
        question_ids: ordered_questions.iter().map(|q| q.id).collect(),
        by_category: set.by_category.clone(),
        ordered_questions,
    }
}

/// Human-readable companion to the JSON output: selections grouped by
/// category with score, difficulty and options.
pub fn render_output_text(output: &GenerationOutput) -> String {
    let mut text = String::new();
    let requirements_json =
        serde_json::to_string(&output.requirements).unwrap_or_else(|_| "{}".to_string());
    text.push_str(&format!("Requirements: {}\n\n", requirements_json));

    for (category, ids) in &output.by_category {
        text.push_str(&format!("Category: {}\n", category));
        for (index, id) in ids.iter().enumerate() {
            let Some(question) = output.ordered_questions.iter().find(|q| q.id == *id) else {
                continue;
            };
            text.push_str(&format!(
                "  {}. [ID {}] (score={:.3}, difficulty={}) {}\n",
                index + 1,
                question.id,
                question.score,
                question.difficulty,
                question.question_text
            ));
            if let Some(options) = question.options.as_deref() {
                if !options.trim().is_empty() {
                    text.push_str(&format!("     - options: {}\n", options));
                }
            }
        }
        text.push('\n');
    }

    text
}

/// Fields inferred from a free-text requirement description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredRequirement {
    pub topic: String,
    pub language: Language,
    pub categories: Vec<String>,
}

/// Infers language, a topic guess and requested categories from one line of
/// free text, so interactive input and a requirements file go through the
/// same generation path.
pub fn infer_requirement(free_text: &str, lexicon: &Lexicon) -> InferredRequirement {
    let language = detect_language(free_text);

    let topic = match language {
        Language::En => free_text
            .split_whitespace()
            .find(|token| token.len() > 3)
            .map(|token| {
                token
                    .trim_matches(|c| ".,!?()[]\"'".contains(c))
                    .to_lowercase()
            })
            .unwrap_or_else(|| free_text.to_lowercase()),
        Language::Zh => free_text.to_string(),
    };

    let mut categories: Vec<String> = Vec::new();
    let push_unique = |category: &str, categories: &mut Vec<String>| {
        if !categories.iter().any(|c| c == category) {
            categories.push(category.to_string());
        }
    };

    match language {
        Language::En => {
            let lowered = free_text.to_lowercase();
            for (label, keywords) in lexicon.topics(Language::En) {
                if !keywords.iter().any(|k| lowered.contains(k.as_str())) {
                    continue;
                }
                let label = label.to_lowercase();
                if label.contains("hotel") || label.contains("service") || label.contains("satisfaction")
                {
                    push_unique("Satisfaction", &mut categories);
                } else if label.contains("travel") {
                    push_unique("Usage", &mut categories);
                } else if label.contains("food") {
                    push_unique("Recommendation", &mut categories);
                }
            }
        }
        Language::Zh => {
            for (_, keywords) in lexicon.topics(Language::Zh) {
                if !keywords.iter().any(|k| free_text.contains(k.as_str())) {
                    continue;
                }
                if free_text.contains("酒店") || keywords.iter().any(|k| k.contains("酒店")) {
                    push_unique("Satisfaction", &mut categories);
                }
            }
        }
    }

    InferredRequirement {
        topic,
        language,
        categories,
    }
}

/// Capitalizes every alphabetic run for grouping labels
/// ("satisfaction" -> "Satisfaction",
/// "hotel/accommodation" -> "Hotel/Accommodation").
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_boundary = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = true;
        }
    }
    out
}
