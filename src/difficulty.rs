use crate::lexicon::Lexicon;
use crate::models::{Language, Question, QuestionType};

const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 5;

/// Deterministic multi-factor difficulty heuristic. Total function: any
/// input maps into 1..=5, never fails.
pub struct DifficultyScorer {
    lexicon: Lexicon,
}

impl DifficultyScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn score(&self, question: &Question) -> u8 {
        self.score_parts(
            &question.question_text,
            question.question_type,
            question.options.as_deref(),
            question.language,
        )
    }

    pub fn score_parts(
        &self,
        text: &str,
        question_type: QuestionType,
        options: Option<&str>,
        language: Language,
    ) -> u8 {
        let mut score: i32 = 1;

        score += match question_type {
            QuestionType::OpenEnded => 2,
            QuestionType::SingleChoice | QuestionType::MultipleChoice => 1,
            QuestionType::YesNo | QuestionType::Rating => 0,
        };

        // CJK has no whitespace word boundaries, so Chinese length is
        // measured in characters instead of words.
        score += match language {
            Language::En => {
                let words = text.split_whitespace().count();
                if words > 30 {
                    2
                } else if words > 15 {
                    1
                } else {
                    0
                }
            }
            Language::Zh => {
                let chars = text.chars().count();
                if chars > 50 {
                    2
                } else if chars > 20 {
                    1
                } else {
                    0
                }
            }
        };

        if let Some(options) = options {
            if !options.is_empty() {
                let option_count = options.matches('/').count() + 1;
                if option_count > 6 {
                    score += 1;
                }
            }
        }

        let lowered = text.to_lowercase();
        if self
            .lexicon
            .hard_words(language)
            .iter()
            .any(|word| lowered.contains(word.as_str()))
        {
            score += 1;
        }

        score.clamp(MIN_SCORE as i32, MAX_SCORE as i32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> DifficultyScorer {
        DifficultyScorer::new(Lexicon::default())
    }

    #[test]
    fn short_rating_question_scores_minimum() {
        let score = scorer().score_parts("Rate us", QuestionType::Rating, None, Language::En);
        assert_eq!(score, 1);
    }

    #[test]
    fn open_ended_adds_two_and_choice_adds_one() {
        let s = scorer();
        assert_eq!(
            s.score_parts("Your thoughts?", QuestionType::OpenEnded, None, Language::En),
            3
        );
        assert_eq!(
            s.score_parts("Pick one", QuestionType::SingleChoice, None, Language::En),
            2
        );
    }

    #[test]
    fn long_english_text_earns_length_bonus() {
        let s = scorer();
        let sixteen_words = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen";
        assert_eq!(
            s.score_parts(sixteen_words, QuestionType::YesNo, None, Language::En),
            2
        );

        let long_text = sixteen_words.repeat(2);
        assert_eq!(
            s.score_parts(&long_text, QuestionType::YesNo, None, Language::En),
            3
        );
    }

    #[test]
    fn chinese_length_counts_characters() {
        let s = scorer();
        let twenty_one = "这".repeat(21);
        assert_eq!(
            s.score_parts(&twenty_one, QuestionType::YesNo, None, Language::Zh),
            2
        );
        let fifty_one = "这".repeat(51);
        assert_eq!(
            s.score_parts(&fifty_one, QuestionType::YesNo, None, Language::Zh),
            3
        );
    }

    #[test]
    fn many_options_add_one() {
        let s = scorer();
        let options = "a/b/c/d/e/f/g";
        assert_eq!(
            s.score_parts("Pick", QuestionType::SingleChoice, Some(options), Language::En),
            3
        );
        assert_eq!(
            s.score_parts("Pick", QuestionType::SingleChoice, Some("a/b"), Language::En),
            2
        );
    }

    #[test]
    fn hard_wording_markers_add_one_per_language() {
        let s = scorer();
        assert_eq!(
            s.score_parts(
                "Please explain your choice",
                QuestionType::YesNo,
                None,
                Language::En
            ),
            2
        );
        assert_eq!(
            s.score_parts("为什么选择我们", QuestionType::YesNo, None, Language::Zh),
            2
        );
    }

    #[test]
    fn score_is_clamped_to_five() {
        let s = scorer();
        let text = format!(
            "Please describe and explain in detail {}",
            "word ".repeat(40)
        );
        let options = "a/b/c/d/e/f/g/h";
        let score = s.score_parts(&text, QuestionType::OpenEnded, Some(options), Language::En);
        assert_eq!(score, 5);
    }

    #[test]
    fn every_combination_stays_in_bounds() {
        let s = scorer();
        let long_en = "long word ".repeat(40);
        let long_zh = "这".repeat(80);
        let texts = ["", "short", long_en.as_str(), long_zh.as_str()];
        let types = [
            QuestionType::SingleChoice,
            QuestionType::MultipleChoice,
            QuestionType::OpenEnded,
            QuestionType::YesNo,
            QuestionType::Rating,
        ];
        for text in texts {
            for question_type in types {
                for language in [Language::En, Language::Zh] {
                    let score =
                        s.score_parts(text, question_type, Some("a/b/c/d/e/f/g"), language);
                    assert!((1..=5).contains(&score));
                }
            }
        }
    }
}
