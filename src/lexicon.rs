use std::collections::{HashMap, HashSet};

use crate::models::Language;

/// English stop words dropped during normalization and vectorization.
const EN_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "will", "with", "would", "you", "your", "yours",
];

/// Short Chinese stop-word list supplied to the vectorizer.
const ZH_STOP_WORDS: &[&str] = &[
    "的", "了", "是", "我", "你", "在", "和", "有", "去", "吗", "我们", "什么",
];

/// English synonym folds, applied after lemmatization (singular keys only).
/// Every lodging term collapses to "accommodation".
const EN_SYNONYMS: &[(&str, &str)] = &[
    ("hotel", "accommodation"),
    ("inn", "accommodation"),
    ("resort", "accommodation"),
    ("trip", "travel"),
    ("journey", "travel"),
    ("service", "hospitality"),
];

const ZH_SYNONYMS: &[(&str, &str)] = &[
    ("宾馆", "酒店"),
    ("饭店", "酒店"),
    ("住宿", "酒店"),
    ("游览", "旅游"),
];

/// Wording markers that indicate a harder question.
const EN_HARD_WORDS: &[&str] = &[
    "describe",
    "explain",
    "comprehensive",
    "evaluate",
    "perspective",
    "why",
];

const ZH_HARD_WORDS: &[&str] = &["描述", "解释", "详细", "评估", "看法", "为什么"];

/// Topic labels with their trigger keywords, used for coverage analysis and
/// free-text requirement inference.
const EN_TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Hotel/Accommodation",
        &["hotel", "accommodation", "room", "stay", "inn"],
    ),
    (
        "Travel/General",
        &["travel", "trip", "journey", "tour", "tourism"],
    ),
    (
        "Flight/Transport",
        &["flight", "airline", "plane", "transport", "bus"],
    ),
    ("Food/Dining", &["food", "meal", "dining", "restaurant", "eat"]),
    (
        "Service/Satisfaction",
        &["service", "staff", "satisfaction", "quality"],
    ),
];

const ZH_TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("Hotel/Accommodation", &["酒店", "住宿", "房间", "宾馆", "饭店"]),
    ("Travel/General", &["旅游", "旅行", "行程", "度假"]),
    ("Flight/Transport", &["航班", "飞机", "交通", "机场"]),
    ("Food/Dining", &["餐饮", "食物", "吃饭", "餐厅"]),
    ("Service/Satisfaction", &["服务", "满意", "推荐", "态度"]),
];

/// Search tokens tried when a requested category has no direct match in the
/// filtered pool.
const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    ("usage", &["usage", "frequency", "behavior"]),
    ("satisfaction", &["satisfaction", "satisfied", "satisfy"]),
    ("recommendation", &["recommend", "recommendation", "nps"]),
];

/// Immutable per-language lookup tables injected into the pipeline
/// components. Constructed once; cloning is cheap enough for a session-long
/// batch tool.
#[derive(Clone, Debug)]
pub struct Lexicon {
    en_stop_words: HashSet<String>,
    zh_stop_words: HashSet<String>,
    en_synonyms: HashMap<String, String>,
    zh_synonyms: HashMap<String, String>,
    en_hard_words: Vec<String>,
    zh_hard_words: Vec<String>,
    en_topics: Vec<(String, Vec<String>)>,
    zh_topics: Vec<(String, Vec<String>)>,
    category_synonyms: HashMap<String, Vec<String>>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let pairs = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        };
        let topics = |table: &[(&str, &[&str])]| {
            table
                .iter()
                .map(|(label, kws)| {
                    (
                        label.to_string(),
                        kws.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect::<Vec<_>>()
        };

        Self {
            en_stop_words: EN_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            zh_stop_words: ZH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            en_synonyms: pairs(EN_SYNONYMS),
            zh_synonyms: pairs(ZH_SYNONYMS),
            en_hard_words: EN_HARD_WORDS.iter().map(|w| w.to_string()).collect(),
            zh_hard_words: ZH_HARD_WORDS.iter().map(|w| w.to_string()).collect(),
            en_topics: topics(EN_TOPIC_KEYWORDS),
            zh_topics: topics(ZH_TOPIC_KEYWORDS),
            category_synonyms: CATEGORY_SYNONYMS
                .iter()
                .map(|(cat, toks)| {
                    (
                        cat.to_string(),
                        toks.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl Lexicon {
    pub fn is_stop_word(&self, language: Language, token: &str) -> bool {
        match language {
            Language::En => self.en_stop_words.contains(token),
            Language::Zh => self.zh_stop_words.contains(token),
        }
    }

    pub fn fold_synonym<'a>(&'a self, language: Language, token: &'a str) -> &'a str {
        let table = match language {
            Language::En => &self.en_synonyms,
            Language::Zh => &self.zh_synonyms,
        };
        table.get(token).map(String::as_str).unwrap_or(token)
    }

    pub fn hard_words(&self, language: Language) -> &[String] {
        match language {
            Language::En => &self.en_hard_words,
            Language::Zh => &self.zh_hard_words,
        }
    }

    pub fn topics(&self, language: Language) -> &[(String, Vec<String>)] {
        match language {
            Language::En => &self.en_topics,
            Language::Zh => &self.zh_topics,
        }
    }

    /// Fallback search tokens for a requested category; the category name
    /// itself when no synonym entry exists.
    pub fn category_tokens(&self, category: &str) -> Vec<String> {
        self.category_synonyms
            .get(category)
            .cloned()
            .unwrap_or_else(|| vec![category.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotel_folds_to_accommodation() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.fold_synonym(Language::En, "hotel"), "accommodation");
        assert_eq!(lexicon.fold_synonym(Language::En, "inn"), "accommodation");
        assert_eq!(lexicon.fold_synonym(Language::En, "room"), "room");
    }

    #[test]
    fn zh_lodging_terms_fold_to_one_canonical() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.fold_synonym(Language::Zh, "宾馆"), "酒店");
        assert_eq!(lexicon.fold_synonym(Language::Zh, "住宿"), "酒店");
    }

    #[test]
    fn unknown_category_falls_back_to_its_own_name() {
        let lexicon = Lexicon::default();
        assert_eq!(
            lexicon.category_tokens("satisfaction"),
            vec!["satisfaction", "satisfied", "satisfy"]
        );
        assert_eq!(lexicon.category_tokens("pricing"), vec!["pricing"]);
    }
}
