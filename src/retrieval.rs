use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, SurveyError};
use crate::models::{IndexedQuestion, Language, QueryHit};
use crate::normalize::Normalizer;

/// Hard floor below which a candidate never appears in results, regardless
/// of rank.
pub const SCORE_FLOOR: f32 = 0.05;

#[derive(Debug, Clone)]
struct EntryMeta {
    id: u64,
    question_text: String,
    options: Option<String>,
    difficulty: u8,
}

/// Per-language TF-IDF index over normalized keys. Queries pass through the
/// same normalization pipeline the corpus did; without that symmetry the
/// cosine scores would be meaningless.
///
/// Weighting: smoothed idf `ln((1 + n) / (1 + df)) + 1` times the raw term
/// count, L2-normalized, so cosine similarity reduces to a sparse dot
/// product.
#[derive(Debug)]
pub struct RetrievalEngine {
    language: Language,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    documents: Vec<HashMap<usize, f32>>,
    entries: Vec<EntryMeta>,
}

impl RetrievalEngine {
    /// Fits the index over the pool's normalized keys. Fails with
    /// `InsufficientData` when fewer than two documents survive
    /// tokenization; the caller is expected to disable retrieval for this
    /// language only.
    pub fn build(
        normalizer: &Normalizer,
        language: Language,
        pool: &[IndexedQuestion],
    ) -> Result<Self> {
        let tokenized: Vec<Vec<&str>> = pool
            .iter()
            .map(|entry| tokenize(normalizer, language, &entry.key))
            .collect();

        let non_empty = tokenized.iter().filter(|tokens| !tokens.is_empty()).count();
        if non_empty < 2 {
            return Err(SurveyError::InsufficientData(format!(
                "{} corpus has {} non-empty documents, need at least 2",
                language.as_str(),
                non_empty
            )));
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let unique: HashSet<&&str> = tokens.iter().collect();
            for token in unique {
                let next_index = vocabulary.len();
                let index = *vocabulary
                    .entry(token.to_string())
                    .or_insert(next_index);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                document_frequency[index] += 1;
            }
        }

        let doc_count = pool.len() as f32;
        let idf: Vec<f32> = document_frequency
            .iter()
            .map(|&df| ((1.0 + doc_count) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let documents = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &vocabulary, &idf))
            .collect();

        let entries = pool
            .iter()
            .map(|entry| EntryMeta {
                id: entry.question.id,
                question_text: entry.question.question_text.clone(),
                options: entry.question.options.clone(),
                difficulty: entry.question.difficulty,
            })
            .collect();

        debug!(
            language = language.as_str(),
            documents = pool.len(),
            vocabulary = vocabulary.len(),
            "fitted tf-idf index"
        );

        Ok(Self {
            language,
            vocabulary,
            idf,
            documents,
            entries,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity of the query against every corpus document, aligned
    /// with the build order. Unseen query terms are ignored.
    pub fn similarities(&self, normalizer: &Normalizer, free_text: &str) -> Vec<f32> {
        let normalized = normalizer.normalize(free_text, self.language);
        let tokens = tokenize(normalizer, self.language, &normalized);
        let query = weigh(&tokens, &self.vocabulary, &self.idf);

        self.documents
            .iter()
            .map(|document| {
                query
                    .iter()
                    .filter_map(|(index, weight)| {
                        document.get(index).map(|doc_weight| weight * doc_weight)
                    })
                    .sum()
            })
            .collect()
    }

    /// Ranked matches for a free-text requirement: descending similarity
    /// with corpus-order ties, floor applied, deduplicated by exact question
    /// text, capped at `top_k`.
    pub fn query(
        &self,
        normalizer: &Normalizer,
        free_text: &str,
        top_k: usize,
        min_score: f32,
    ) -> Vec<QueryHit> {
        let scores = self.similarities(normalizer, free_text);

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut seen_text: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();

        for (index, score) in ranked {
            if hits.len() >= top_k {
                break;
            }
            if score <= min_score {
                continue;
            }
            let entry = &self.entries[index];
            if !seen_text.insert(entry.question_text.as_str()) {
                continue;
            }
            hits.push(QueryHit {
                id: entry.id,
                question_text: entry.question_text.clone(),
                options: entry.options.clone(),
                difficulty: entry.difficulty,
                score,
            });
        }

        hits
    }
}

fn tokenize<'a>(normalizer: &Normalizer, language: Language, key: &'a str) -> Vec<&'a str> {
    key.split_whitespace()
        .filter(|token| !normalizer.lexicon().is_stop_word(language, token))
        .collect()
}

/// Sparse tf-idf vector, L2-normalized. Empty input yields the zero vector.
fn weigh(tokens: &[&str], vocabulary: &HashMap<String, usize>, idf: &[f32]) -> HashMap<usize, f32> {
    let mut counts: HashMap<usize, f32> = HashMap::new();
    for token in tokens {
        if let Some(&index) = vocabulary.get(*token) {
            *counts.entry(index).or_insert(0.0) += 1.0;
        }
    }

    for (index, weight) in counts.iter_mut() {
        *weight *= idf[*index];
    }

    let norm: f32 = counts.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for weight in counts.values_mut() {
            *weight /= norm;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::models::{Question, QuestionType};

    fn normalizer() -> Normalizer {
        Normalizer::new(Lexicon::default())
    }

    fn indexed(normalizer: &Normalizer, id: u64, text: &str) -> IndexedQuestion {
        let language = crate::normalize::detect_language(text);
        let question = Question {
            id,
            question_text: text.to_string(),
            question_type: QuestionType::OpenEnded,
            options: None,
            category: "general".to_string(),
            language,
            difficulty: 2,
            tags: vec![],
            usage_count: 0,
        };
        let key = normalizer.normalize(text, language);
        IndexedQuestion { question, key }
    }

    fn sample_corpus(normalizer: &Normalizer) -> Vec<IndexedQuestion> {
        let mut corpus = vec![indexed(
            normalizer,
            1,
            "How clean was your room during the stay?",
        )];
        let fillers = [
            "Did the airline lose your luggage?",
            "Was the boarding process smooth?",
            "How tasty was the breakfast buffet?",
            "Would you visit the museum again?",
            "Did the tour guide speak clearly?",
            "Was the beach crowded in the morning?",
            "How fast was the airport shuttle?",
            "Did the concert start on time?",
            "Was the hiking trail well marked?",
            "How friendly were the locals?",
            "Did the ferry depart on schedule?",
            "Was the conference venue spacious?",
            "How reliable was the rental car?",
            "Did the spa accept walk-ins?",
            "Was the gym equipment modern?",
            "How quiet was the library floor?",
            "Did the pool open early enough?",
            "Was the parking garage secure?",
            "How smooth was the checkout process?",
            "Did the wifi reach the garden?",
        ];
        for (offset, text) in fillers.iter().enumerate() {
            corpus.push(indexed(normalizer, 2 + offset as u64, text));
        }
        corpus
    }

    #[test]
    fn empty_corpus_signals_insufficient_data() {
        let n = normalizer();
        let err = RetrievalEngine::build(&n, Language::En, &[]).unwrap_err();
        assert!(matches!(err, SurveyError::InsufficientData(_)));
    }

    #[test]
    fn single_document_corpus_signals_insufficient_data() {
        let n = normalizer();
        let pool = vec![indexed(&n, 1, "Only one question here")];
        let err = RetrievalEngine::build(&n, Language::En, &pool).unwrap_err();
        assert!(matches!(err, SurveyError::InsufficientData(_)));
    }

    #[test]
    fn relevant_question_ranks_in_top_three() {
        let n = normalizer();
        let corpus = sample_corpus(&n);
        let engine = RetrievalEngine::build(&n, Language::En, &corpus).unwrap();

        let hits = engine.query(&n, "is the room clean", 3, SCORE_FLOOR);
        assert!(!hits.is_empty());
        assert!(hits.iter().any(|hit| hit.id == 1));
        assert!(hits.iter().all(|hit| hit.score > SCORE_FLOOR));
    }

    #[test]
    fn results_respect_top_k_floor_and_text_dedup() {
        let n = normalizer();
        let mut corpus = sample_corpus(&n);
        // Same surface text under two different ids.
        corpus.push(indexed(&n, 99, "How clean was your room during the stay?"));

        let engine = RetrievalEngine::build(&n, Language::En, &corpus).unwrap();
        let hits = engine.query(&n, "clean room stay", 5, SCORE_FLOOR);

        assert!(hits.len() <= 5);
        assert!(hits.iter().all(|hit| hit.score > SCORE_FLOOR));
        let texts: Vec<&str> = hits.iter().map(|h| h.question_text.as_str()).collect();
        let unique: HashSet<&&str> = texts.iter().collect();
        assert_eq!(texts.len(), unique.len());
    }

    #[test]
    fn unrelated_query_returns_nothing() {
        let n = normalizer();
        let corpus = sample_corpus(&n);
        let engine = RetrievalEngine::build(&n, Language::En, &corpus).unwrap();

        let hits = engine.query(&n, "cryptocurrency blockchain mining", 10, SCORE_FLOOR);
        assert!(hits.is_empty());
    }

    #[test]
    fn chinese_corpus_matches_chinese_query() {
        let n = normalizer();
        let pool = vec![
            indexed(&n, 1, "酒店的房间干净吗？"),
            indexed(&n, 2, "航班准时起飞了吗？"),
            indexed(&n, 3, "餐厅的食物好吃吗？"),
        ];
        let engine = RetrievalEngine::build(&n, Language::Zh, &pool).unwrap();

        let hits = engine.query(&n, "房间 干净", 3, SCORE_FLOOR);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn similarities_align_with_corpus_order() {
        let n = normalizer();
        let corpus = sample_corpus(&n);
        let engine = RetrievalEngine::build(&n, Language::En, &corpus).unwrap();

        let scores = engine.similarities(&n, "clean room");
        assert_eq!(scores.len(), corpus.len());
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
            .map(|(idx, _)| idx);
        assert_eq!(best, Some(0));
    }
}
