use std::env;
use std::path::PathBuf;

use crate::retrieval::SCORE_FLOOR;

#[derive(Clone, Debug)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_score: f32,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub store_file: String,
    pub requirements_file: String,
    pub default_requirements_file: String,
    pub responses_file: String,
    pub output_stem: String,
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = env::var("SURVEYBANK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            data_dir,
            store_file: env::var("SURVEYBANK_STORE")
                .unwrap_or_else(|_| "convert_data.json".to_string()),
            requirements_file: env::var("SURVEYBANK_REQUIREMENTS")
                .unwrap_or_else(|_| "questionaire_requirements.json".to_string()),
            default_requirements_file: env::var("SURVEYBANK_DEFAULT_REQUIREMENTS")
                .unwrap_or_else(|_| "questionaire_requirements_default.json".to_string()),
            responses_file: env::var("SURVEYBANK_RESPONSES")
                .unwrap_or_else(|_| "simulated_responses.json".to_string()),
            output_stem: env::var("SURVEYBANK_OUTPUT_STEM")
                .unwrap_or_else(|_| "output_questionaire".to_string()),
            retrieval: RetrievalConfig {
                top_k: env::var("SURVEYBANK_TOP_K")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                min_score: env::var("SURVEYBANK_MIN_SCORE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(SCORE_FLOOR),
            },
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.data_dir.join(&self.requirements_file)
    }

    pub fn default_requirements_path(&self) -> PathBuf {
        self.data_dir.join(&self.default_requirements_file)
    }

    pub fn responses_path(&self) -> PathBuf {
        self.data_dir.join(&self.responses_file)
    }

    pub fn output_json_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.output_stem))
    }

    pub fn output_text_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.txt", self.output_stem))
    }
}
