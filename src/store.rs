use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Result, SurveyError};
use crate::models::{Question, Questionnaire, Requirement, Statistics};

/// On-disk document shape. `users` is carried opaquely so wholesale rewrites
/// never drop sections this tool does not manage.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    questionnaires: Vec<Questionnaire>,
    #[serde(default)]
    users: Vec<serde_json::Value>,
}

/// Flat-file question store: loaded wholesale at open, rewritten wholesale
/// (atomically, via a temp file in the same directory) on every mutation.
/// At most one writer is assumed; there is no locking.
#[derive(Debug)]
pub struct QuestionStore {
    path: PathBuf,
    data: StoreData,
}

impl QuestionStore {
    /// Opens the store, creating an empty base document when the file does
    /// not exist yet. A present-but-malformed file is a `Data` error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let mut store = Self {
                path,
                data: StoreData::default(),
            };
            store.save()?;
            info!(path = %store.path.display(), "initialised empty question store");
            return Ok(store);
        }

        let file = File::open(&path)?;
        let data: StoreData = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            SurveyError::Data(format!("{} is not a valid store file: {err}", path.display()))
        })?;

        Ok(Self { path, data })
    }

    pub fn questions(&self) -> &[Question] {
        &self.data.questions
    }

    pub fn questionnaires(&self) -> &[Questionnaire] {
        &self.data.questionnaires
    }

    pub fn question_by_id(&self, question_id: u64) -> Option<&Question> {
        self.data.questions.iter().find(|q| q.id == question_id)
    }

    pub fn questions_by_category(&self, category: &str) -> Vec<&Question> {
        self.data
            .questions
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }

    pub fn questionnaire_by_id(&self, questionnaire_id: u64) -> Option<&Questionnaire> {
        self.data
            .questionnaires
            .iter()
            .find(|q| q.id == questionnaire_id)
    }

    /// Adds a question, allocating the next id (max existing + 1, or 1) and
    /// resetting its usage count.
    pub fn add_question(&mut self, mut question: Question) -> Result<u64> {
        let new_id = self
            .data
            .questions
            .iter()
            .map(|q| q.id)
            .max()
            .unwrap_or(0)
            + 1;
        question.id = new_id;
        question.usage_count = 0;
        self.data.questions.push(question);
        self.save()?;
        Ok(new_id)
    }

    /// Replaces the whole question section, e.g. after a raw-export
    /// conversion run.
    pub fn replace_questions(&mut self, questions: Vec<Question>) -> Result<()> {
        self.data.questions = questions;
        self.save()
    }

    pub fn create_questionnaire(
        &mut self,
        title: &str,
        description: &str,
        target_audience: &str,
        requirements: Requirement,
    ) -> Result<u64> {
        let new_id = self
            .data
            .questionnaires
            .iter()
            .map(|q| q.id)
            .max()
            .unwrap_or(0)
            + 1;

        self.data.questionnaires.push(Questionnaire {
            id: new_id,
            title: title.to_string(),
            description: description.to_string(),
            target_audience: target_audience.to_string(),
            requirements,
            question_ids: Vec::new(),
            status: "draft".to_string(),
            created_at: Utc::now(),
        });
        self.save()?;
        Ok(new_id)
    }

    /// Links a question into a questionnaire, bumping the question's usage
    /// count. Returns false when either id is unknown; linking an already
    /// linked question is a no-op that still reports success.
    pub fn link_question(&mut self, questionnaire_id: u64, question_id: u64) -> Result<bool> {
        if self.question_by_id(question_id).is_none() {
            return Ok(false);
        }
        let Some(questionnaire) = self
            .data
            .questionnaires
            .iter_mut()
            .find(|q| q.id == questionnaire_id)
        else {
            return Ok(false);
        };

        if !questionnaire.question_ids.contains(&question_id) {
            questionnaire.question_ids.push(question_id);
            if let Some(question) = self
                .data
                .questions
                .iter_mut()
                .find(|q| q.id == question_id)
            {
                question.usage_count += 1;
            }
            self.save()?;
        }

        Ok(true)
    }

    pub fn statistics(&self) -> Statistics {
        let mut categories = std::collections::BTreeMap::new();
        let mut types = std::collections::BTreeMap::new();

        for question in &self.data.questions {
            let category = if question.category.trim().is_empty() {
                "Uncategorized"
            } else {
                question.category.as_str()
            };
            *categories.entry(category.to_string()).or_insert(0) += 1;
            *types
                .entry(question.question_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        Statistics {
            total_questions: self.data.questions.len(),
            categories_distribution: categories,
            question_types_distribution: types,
        }
    }

    fn save(&mut self) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&temp, &self.data).map_err(|err| {
            SurveyError::Data(format!(
                "failed serialising store {}: {err}",
                self.path.display()
            ))
        })?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}
