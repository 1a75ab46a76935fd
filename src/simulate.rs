use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Question, QuestionType, SimulatedResponse};

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub num_users: u64,
    pub min_questions: usize,
    pub max_questions: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_users: 100,
            min_questions: 10,
            max_questions: 15,
        }
    }
}

/// Generates synthetic responses over the question pool. Each simulated user
/// answers a random sample of questions, with open-ended questions capped at
/// roughly 10% of the draw. Every category gets a fixed "effectless"
/// probability drawn once per run. Deterministic under a seeded rng.
pub fn simulate_responses<R: Rng>(
    questions: &[Question],
    config: &SimulationConfig,
    rng: &mut R,
) -> Vec<SimulatedResponse> {
    if questions.is_empty() || config.num_users == 0 {
        return Vec::new();
    }

    let open: Vec<&Question> = questions
        .iter()
        .filter(|q| q.question_type == QuestionType::OpenEnded)
        .collect();
    let non_open: Vec<&Question> = questions
        .iter()
        .filter(|q| q.question_type != QuestionType::OpenEnded)
        .collect();

    // BTreeMap keeps category order stable so a fixed seed reproduces the
    // same probabilities.
    let mut effectless: BTreeMap<&str, f64> = BTreeMap::new();
    for question in questions {
        effectless
            .entry(question.category.as_str())
            .or_insert_with(|| rng.gen_range(0.2..0.6));
    }

    let mut responses = Vec::new();

    for user_id in 1..=config.num_users {
        let total = rng.gen_range(config.min_questions..=config.max_questions.max(config.min_questions));

        let mut open_share = if open.is_empty() {
            0
        } else {
            (0.1 * total as f64).round() as usize
        };
        open_share = open_share.min(open.len()).min(total);
        let non_open_share = total - open_share;

        let mut sampled: Vec<&Question> = open
            .choose_multiple(rng, open_share)
            .copied()
            .collect();

        if !non_open.is_empty() {
            if non_open_share <= non_open.len() {
                sampled.extend(non_open.choose_multiple(rng, non_open_share).copied());
            } else {
                // Short pool: sample with replacement.
                for _ in 0..non_open_share {
                    if let Some(question) = non_open.choose(rng) {
                        sampled.push(question);
                    }
                }
            }
        }

        sampled.shuffle(rng);

        for question in sampled {
            let answer_prob = if question.question_type == QuestionType::OpenEnded {
                0.7
            } else {
                rng.gen_range(0.8..0.95)
            };

            let answer = if rng.gen::<f64>() > answer_prob {
                "not_answered".to_string()
            } else {
                draw_answer(question, rng)
            };

            let effectless_prob = effectless
                .get(question.category.as_str())
                .copied()
                .unwrap_or(0.0);

            responses.push(SimulatedResponse {
                user_id,
                question_id: question.id,
                answer,
                effective: rng.gen::<f64>() > effectless_prob,
            });
        }
    }

    responses
}

fn draw_answer<R: Rng>(question: &Question, rng: &mut R) -> String {
    let options = question.option_list();

    match question.question_type {
        QuestionType::SingleChoice => options
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "N/A".to_string()),
        QuestionType::MultipleChoice => {
            if options.is_empty() {
                "N/A".to_string()
            } else {
                let picks = rng.gen_range(1..=options.len());
                options
                    .choose_multiple(rng, picks)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" / ")
            }
        }
        QuestionType::YesNo | QuestionType::OpenEnded => ["Yes", "No"]
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Yes".to_string()),
        QuestionType::Rating => rng.gen_range(0..=10).to_string(),
    }
}
