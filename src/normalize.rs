use jieba_rs::Jieba;
use regex::Regex;

use crate::lexicon::Lexicon;
use crate::models::Language;

/// True for CJK Unified Ideographs (U+4E00..U+9FFF).
pub fn is_cjk(ch: char) -> bool {
    matches!(ch, '\u{4e00}'..='\u{9fff}')
}

/// A text containing at least one CJK ideograph is Chinese; everything else
/// is treated as English.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_cjk) {
        Language::Zh
    } else {
        Language::En
    }
}

/// Language-aware text normalizer. Produces the canonical token sequence
/// used both as the deduplication key and as the vectorizer document, so
/// equivalent phrasings collapse at ingest time AND match at query time.
pub struct Normalizer {
    lexicon: Lexicon,
    jieba: Jieba,
    ask_prefix: Regex,
    enumeration_prefix: Regex,
}

impl Normalizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            jieba: Jieba::new(),
            ask_prefix: Regex::new(r"(?i)^\s*ask\s+")
                .unwrap_or_else(|_| Regex::new("^").unwrap()),
            enumeration_prefix: Regex::new(r"(?i)^\s*(?:q\s*)?\d+[.:\s]\s*")
                .unwrap_or_else(|_| Regex::new("^").unwrap()),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn detect_language(&self, text: &str) -> Language {
        detect_language(text)
    }

    /// Strips interrogative markers and enumeration prefixes, then cuts
    /// everything before the first alphabetic or CJK character. Returns an
    /// empty string when no such character exists.
    pub fn clean(&self, text: &str) -> String {
        let text = self.ask_prefix.replace(text, "");
        let text = self.enumeration_prefix.replace(&text, "");

        match text
            .char_indices()
            .find(|(_, ch)| ch.is_ascii_alphabetic() || is_cjk(*ch))
        {
            Some((idx, _)) => text[idx..].trim().to_string(),
            None => String::new(),
        }
    }

    /// Canonical whitespace-joined token sequence. Idempotent: feeding the
    /// output back through yields the same string.
    pub fn normalize(&self, text: &str, language: Language) -> String {
        let text = text.to_lowercase();

        let tokens: Vec<String> = match language {
            Language::En => text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|token| !token.is_empty())
                .filter(|token| !self.lexicon.is_stop_word(Language::En, token))
                .map(lemmatize)
                .map(|token| {
                    self.lexicon
                        .fold_synonym(Language::En, &token)
                        .to_string()
                })
                .collect(),
            Language::Zh => {
                let stripped: String = text
                    .chars()
                    .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
                    .collect();
                self.jieba
                    .cut(&stripped, false)
                    .into_iter()
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(|token| {
                        self.lexicon
                            .fold_synonym(Language::Zh, token)
                            .to_string()
                    })
                    .collect()
            }
        };

        tokens.join(" ")
    }

    /// The deduplication key for a question: text and options normalized as
    /// one unit.
    pub fn dedup_key(&self, text: &str, options: Option<&str>, language: Language) -> String {
        match options {
            Some(options) if !options.trim().is_empty() => {
                self.normalize(&format!("{} {}", text, options), language)
            }
            _ => self.normalize(text, language),
        }
    }
}

/// Light plural reduction. Deliberately a fixpoint so that `normalize` stays
/// idempotent: lemmatize(lemmatize(w)) == lemmatize(w).
fn lemmatize(token: &str) -> String {
    if token.len() <= 3 {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{}y", stem);
        }
    }
    for sibilant in ["sses", "xes", "ches", "shes", "zes"] {
        if token.ends_with(sibilant) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix('s') {
        return stem.to_string();
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn normalizer() -> Normalizer {
        Normalizer::new(Lexicon::default())
    }

    #[test]
    fn detects_language_by_cjk_presence() {
        assert_eq!(detect_language("How was your stay?"), Language::En);
        assert_eq!(detect_language("房间干净吗"), Language::Zh);
        assert_eq!(detect_language("rate 酒店"), Language::Zh);
        assert_eq!(detect_language(""), Language::En);
    }

    #[test]
    fn clean_strips_ask_marker_and_enumeration_prefix() {
        let n = normalizer();
        assert_eq!(n.clean("ask hotel room quality?"), "hotel room quality?");
        assert_eq!(n.clean("Q1: Hotel room quality"), "Hotel room quality");
        assert_eq!(n.clean("12. How was the flight?"), "How was the flight?");
        assert_eq!(n.clean("  3: 酒店的服务怎么样？"), "酒店的服务怎么样？");
    }

    #[test]
    fn clean_without_letters_yields_empty() {
        let n = normalizer();
        assert_eq!(n.clean("???"), "");
        assert_eq!(n.clean("12345"), "");
        assert_eq!(n.clean(""), "");
    }

    #[test]
    fn clean_keeps_questions_without_terminal_question_mark() {
        let n = normalizer();
        assert_eq!(n.clean("Rate the breakfast"), "Rate the breakfast");
    }

    #[test]
    fn english_normalization_folds_synonyms_and_plurals() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Hotel room quality?", Language::En),
            "accommodation room quality"
        );
        assert_eq!(
            n.normalize("Were the hotels near the resort?", Language::En),
            "accommodation near accommodation"
        );
    }

    #[test]
    fn english_normalization_drops_stop_words() {
        let n = normalizer();
        assert_eq!(
            n.normalize("How clean was your room during the stay?", Language::En),
            "clean room stay"
        );
    }

    #[test]
    fn equivalent_phrasings_share_one_key() {
        let n = normalizer();
        let a = n.normalize(&n.clean("ask hotel room quality?"), Language::En);
        let b = n.normalize(&n.clean("Q1: Hotel room quality"), Language::En);
        assert_eq!(a, b);
        assert_eq!(a, "accommodation room quality");
    }

    #[test]
    fn chinese_normalization_strips_punctuation_and_folds_synonyms() {
        let n = normalizer();
        let key = n.normalize("宾馆的房间干净吗？", Language::Zh);
        assert!(key.contains("酒店"));
        assert!(!key.contains('？'));
        assert!(!key.contains("宾馆"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = normalizer();
        for (text, language) in [
            ("How clean was your room during the stay?", Language::En),
            ("Did you enjoy the hotels and resorts?", Language::En),
            ("酒店 服务 满意", Language::Zh),
        ] {
            let once = n.normalize(text, language);
            let twice = n.normalize(&once, language);
            assert_eq!(once, twice, "not idempotent for {:?}", text);
        }
    }

    #[test]
    fn dedup_key_includes_options_text() {
        let n = normalizer();
        let with = n.dedup_key("Rate the service", Some("Good / Bad"), Language::En);
        let without = n.dedup_key("Rate the service", None, Language::En);
        assert_ne!(with, without);
        assert_eq!(without, n.dedup_key("Rate the service", Some("  "), Language::En));
    }

    #[test]
    fn lemmatize_is_a_fixpoint() {
        for word in ["rooms", "cities", "classes", "boxes", "status", "bus", "stay"] {
            let once = lemmatize(word);
            assert_eq!(lemmatize(&once), once);
        }
    }
}
