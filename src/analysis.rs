use std::collections::BTreeMap;
use std::fmt;

use crate::lexicon::Lexicon;
use crate::models::{Language, Question, SimulatedResponse};

/// Distributions over one language pool, rendered as the session's analysis
/// report.
#[derive(Debug, Clone)]
pub struct PoolReport {
    pub language: Language,
    pub type_distribution: BTreeMap<String, usize>,
    pub topic_coverage: Vec<(String, usize)>,
    pub difficulty_distribution: [usize; 5],
}

pub fn analyze_pool(questions: &[Question], language: Language, lexicon: &Lexicon) -> PoolReport {
    let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for question in questions {
        *type_distribution
            .entry(question.question_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    let topic_coverage = lexicon
        .topics(language)
        .iter()
        .map(|(label, keywords)| {
            let count = questions
                .iter()
                .filter(|q| {
                    let lowered = q.question_text.to_lowercase();
                    keywords.iter().any(|k| lowered.contains(k.as_str()))
                })
                .count();
            (label.clone(), count)
        })
        .collect();

    let mut difficulty_distribution = [0usize; 5];
    for question in questions {
        let level = question.difficulty.clamp(1, 5) as usize;
        difficulty_distribution[level - 1] += 1;
    }

    PoolReport {
        language,
        type_distribution,
        topic_coverage,
        difficulty_distribution,
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ">>> ANALYSIS FOR {} DATASET <<<",
            self.language.as_str().to_uppercase()
        )?;

        writeln!(f, "[1] Question Type Distribution:")?;
        if self.type_distribution.is_empty() {
            writeln!(f, "    (No data)")?;
        }
        for (question_type, count) in &self.type_distribution {
            writeln!(f, "    - {}: {}", question_type, count)?;
        }

        writeln!(f, "[2] Topic Coverage:")?;
        for (topic, count) in &self.topic_coverage {
            writeln!(f, "    - {}: {}", topic, count)?;
        }

        writeln!(f, "[3] Difficulty Level Distribution (1=Easy, 5=Hard):")?;
        for (index, count) in self.difficulty_distribution.iter().enumerate() {
            writeln!(f, "    - Level {}: {}", index + 1, count)?;
        }
        write!(f, "{}", "-".repeat(40))
    }
}

/// Share of effective responses per question type that were actually
/// answered. Responses flagged as not effective are skipped entirely.
pub fn answer_rate_by_type(
    questions: &[Question],
    responses: &[SimulatedResponse],
) -> BTreeMap<String, f64> {
    let type_of: BTreeMap<u64, &str> = questions
        .iter()
        .map(|q| (q.id, q.question_type.as_str()))
        .collect();

    let mut answered: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for response in responses {
        if !response.effective {
            continue;
        }
        let Some(&question_type) = type_of.get(&response.question_id) else {
            continue;
        };
        let entry = answered.entry(question_type).or_insert((0, 0));
        entry.1 += 1;
        if response.answer != "not_answered" {
            entry.0 += 1;
        }
    }

    answered
        .into_iter()
        .map(|(question_type, (hits, total))| {
            let rate = if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            };
            (question_type.to_string(), rate)
        })
        .collect()
}

/// Share of responses per category that were flagged not effective.
pub fn effectless_rate_by_category(
    questions: &[Question],
    responses: &[SimulatedResponse],
) -> BTreeMap<String, f64> {
    let category_of: BTreeMap<u64, &str> = questions
        .iter()
        .map(|q| (q.id, q.category.as_str()))
        .collect();

    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for response in responses {
        let Some(&category) = category_of.get(&response.question_id) else {
            continue;
        };
        let entry = counts.entry(category).or_insert((0, 0));
        entry.1 += 1;
        if !response.effective {
            entry.0 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(category, (effectless, total))| {
            let rate = if total > 0 {
                effectless as f64 / total as f64
            } else {
                0.0
            };
            (category.to_string(), rate)
        })
        .collect()
}

/// Answer rates normalized into a preference distribution summing to 1.
pub fn type_preference(rates: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let sum: f64 = rates.values().sum();
    if sum <= 0.0 {
        return BTreeMap::new();
    }
    rates
        .iter()
        .map(|(question_type, rate)| (question_type.clone(), rate / sum))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;

    fn question(id: u64, text: &str, question_type: QuestionType, category: &str) -> Question {
        Question {
            id,
            question_text: text.to_string(),
            question_type,
            options: None,
            category: category.to_string(),
            language: Language::En,
            difficulty: ((id % 5) + 1) as u8,
            tags: vec![],
            usage_count: 0,
        }
    }

    fn response(question_id: u64, answer: &str, effective: bool) -> SimulatedResponse {
        SimulatedResponse {
            user_id: 1,
            question_id,
            answer: answer.to_string(),
            effective,
        }
    }

    #[test]
    fn pool_report_counts_types_topics_and_difficulty() {
        let lexicon = Lexicon::default();
        let questions = vec![
            question(1, "How was the hotel room?", QuestionType::Rating, "Satisfaction"),
            question(2, "Was the flight on time?", QuestionType::YesNo, "Transport"),
            question(3, "Describe the food quality", QuestionType::OpenEnded, "Dining"),
        ];

        let report = analyze_pool(&questions, Language::En, &lexicon);
        assert_eq!(report.type_distribution.get("rating"), Some(&1));
        assert_eq!(report.type_distribution.get("yes_no"), Some(&1));

        let coverage: BTreeMap<&str, usize> = report
            .topic_coverage
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        assert_eq!(coverage.get("Hotel/Accommodation"), Some(&1));
        assert_eq!(coverage.get("Flight/Transport"), Some(&1));
        // "food" and "quality" both hit; the question counts once per topic.
        assert_eq!(coverage.get("Food/Dining"), Some(&1));

        assert_eq!(report.difficulty_distribution.iter().sum::<usize>(), 3);
        assert!(report.to_string().contains(">>> ANALYSIS FOR EN DATASET <<<"));
    }

    #[test]
    fn answer_rates_skip_ineffective_responses() {
        let questions = vec![
            question(1, "a", QuestionType::YesNo, "General"),
            question(2, "b", QuestionType::Rating, "General"),
        ];
        let responses = vec![
            response(1, "Yes", true),
            response(1, "not_answered", true),
            response(1, "Yes", false),
            response(2, "7", true),
        ];

        let rates = answer_rate_by_type(&questions, &responses);
        assert_eq!(rates.get("yes_no"), Some(&0.5));
        assert_eq!(rates.get("rating"), Some(&1.0));
    }

    #[test]
    fn effectless_rates_group_by_category() {
        let questions = vec![
            question(1, "a", QuestionType::YesNo, "Satisfaction"),
            question(2, "b", QuestionType::YesNo, "Usage"),
        ];
        let responses = vec![
            response(1, "Yes", false),
            response(1, "No", true),
            response(2, "Yes", true),
        ];

        let rates = effectless_rate_by_category(&questions, &responses);
        assert_eq!(rates.get("Satisfaction"), Some(&0.5));
        assert_eq!(rates.get("Usage"), Some(&0.0));
    }

    #[test]
    fn preference_distribution_sums_to_one() {
        let mut rates = BTreeMap::new();
        rates.insert("yes_no".to_string(), 0.9);
        rates.insert("rating".to_string(), 0.6);

        let preference = type_preference(&rates);
        let sum: f64 = preference.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(preference.get("yes_no") > preference.get("rating"));

        assert!(type_preference(&BTreeMap::new()).is_empty());
    }
}
