use std::collections::HashSet;

use crate::models::{IndexedQuestion, Question};
use crate::normalize::Normalizer;

/// Collapses questions that share a normalized key, keeping the first
/// occurrence in pool order. Language is not part of the key; a cross-language
/// collision would collapse too (accepted risk — a key containing CJK tokens
/// can never be produced by the English pipeline).
pub fn dedupe(normalizer: &Normalizer, questions: Vec<Question>) -> Vec<IndexedQuestion> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(questions.len());

    for question in questions {
        let key = normalizer.dedup_key(
            &question.question_text,
            question.options.as_deref(),
            question.language,
        );
        if seen.insert(key.clone()) {
            kept.push(IndexedQuestion { question, key });
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::models::{Language, QuestionType};

    fn question(id: u64, text: &str) -> Question {
        Question {
            id,
            question_text: text.to_string(),
            question_type: QuestionType::OpenEnded,
            options: None,
            category: "general".to_string(),
            language: crate::normalize::detect_language(text),
            difficulty: 1,
            tags: vec![],
            usage_count: 0,
        }
    }

    #[test]
    fn first_seen_wins_and_order_is_preserved() {
        let normalizer = Normalizer::new(Lexicon::default());
        let pool = vec![
            question(1, "Hotel room quality?"),
            question(2, "Was the flight on time?"),
            question(3, "hotel room quality"),
            question(4, "Inn room quality?"),
        ];

        let kept = dedupe(&normalizer, pool);
        let ids: Vec<u64> = kept.iter().map(|q| q.question.id).collect();
        // 3 and 4 both normalize to the key of 1.
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let normalizer = Normalizer::new(Lexicon::default());
        let pool = vec![
            question(1, "Hotel room quality?"),
            question(2, "Hotel room quality!"),
            question(3, "How was the food?"),
        ];

        let once = dedupe(&normalizer, pool);
        let again = dedupe(
            &normalizer,
            once.iter().map(|q| q.question.clone()).collect(),
        );
        assert_eq!(once.len(), again.len());
        for (a, b) in once.iter().zip(again.iter()) {
            assert_eq!(a.question.id, b.question.id);
            assert_eq!(a.key, b.key);
        }
    }

    #[test]
    fn differing_options_keep_both_questions() {
        let normalizer = Normalizer::new(Lexicon::default());
        let mut first = question(1, "Rate the breakfast");
        first.options = Some("Good / Bad".to_string());
        let mut second = question(2, "Rate the breakfast");
        second.options = Some("Excellent / Poor / Terrible".to_string());

        let kept = dedupe(&normalizer, vec![first, second]);
        assert_eq!(kept.len(), 2);
    }
}
