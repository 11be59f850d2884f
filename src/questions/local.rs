//! File-backed question source.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{QuestionSource, UsedQuestionStore};
use crate::broadcast::ErrorReporter;
use crate::config::GameSettings;
use crate::error::{TriviaError, TriviaResult};
use crate::types::{Question, QuestionKey};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlQuestion {
    question_text: String,
    answers: Vec<YamlAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlAnswer {
    answer_text: serde_yaml::Value,
    #[serde(default)]
    is_correct: bool,
}

fn answer_text(value: serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported answerText value: {:?}", other)),
    }
}

/// Stable key for a question: file stem plus SHA-256 of the question text
pub fn question_key(file_stem: &str, question_text: &str) -> QuestionKey {
    let digest = Sha256::digest(question_text.as_bytes());
    format!("{}-{}", file_stem, hex::encode(digest))
}

/// Parse question file contents into a keyed pool.
///
/// Entries that cannot be read are reported and skipped. An entry without
/// a correct answer is a critical report. A file with no usable entries is
/// an error.
pub fn parse_question_file(
    contents: &str,
    path: &Path,
    reporter: &ErrorReporter,
) -> TriviaResult<BTreeMap<QuestionKey, Question>> {
    let display = path.display().to_string();
    let entries: Vec<serde_yaml::Value> =
        serde_yaml::from_str(contents).map_err(|e| TriviaError::QuestionFileParse {
            path: display.clone(),
            reason: e.to_string(),
        })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut pool = BTreeMap::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = match serde_yaml::from_value::<YamlQuestion>(entry) {
            Ok(parsed) => parsed,
            Err(e) => {
                reporter.report(&TriviaError::InvalidQuestion {
                    index,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let mut correct_answers = Vec::new();
        let mut incorrect_answers = Vec::new();
        let mut bad_answer = None;
        for answer in parsed.answers {
            match answer_text(answer.answer_text) {
                Ok(text) if answer.is_correct => correct_answers.push(text),
                Ok(text) => incorrect_answers.push(text),
                Err(reason) => {
                    bad_answer = Some(reason);
                    break;
                }
            }
        }
        if let Some(reason) = bad_answer {
            reporter.report(&TriviaError::InvalidQuestion { index, reason });
            continue;
        }

        if correct_answers.is_empty() {
            reporter.report(&TriviaError::NoCorrectAnswers(parsed.question_text));
            continue;
        }

        pool.insert(
            question_key(&stem, &parsed.question_text),
            Question {
                question_text: parsed.question_text,
                correct_answers,
                incorrect_answers,
            },
        );
    }

    if pool.is_empty() {
        return Err(TriviaError::EmptyQuestionFile(display));
    }
    Ok(pool)
}

/// Settings the file source needs, captured when the source is built
#[derive(Debug, Clone)]
pub struct LocalSourceConfig {
    pub trivia_file: PathBuf,
    pub persist_used_questions: bool,
    pub recycle_questions: bool,
    pub used_questions_path: PathBuf,
}

impl LocalSourceConfig {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            trivia_file: settings.source.trivia_file.clone(),
            persist_used_questions: settings.other.persist_used_questions,
            recycle_questions: settings.other.recycle_questions,
            used_questions_path: settings.other.used_questions_path.clone(),
        }
    }
}

#[derive(Default)]
struct Selection {
    questions: BTreeMap<QuestionKey, Question>,
    used: BTreeSet<QuestionKey>,
    /// Bumped on every change to `used`
    generation: u64,
}

impl Selection {
    fn unused(&self) -> Vec<&QuestionKey> {
        self.questions
            .keys()
            .filter(|key| !self.used.contains(*key))
            .collect()
    }

    fn snapshot(&self) -> (u64, Vec<QuestionKey>) {
        (self.generation, self.used.iter().cloned().collect())
    }
}

pub struct LocalQuestionSource {
    config: LocalSourceConfig,
    /// Single-flight guard over the pool and used set
    selection: Mutex<Selection>,
    store: UsedQuestionStore,
    reporter: ErrorReporter,
}

impl LocalQuestionSource {
    pub fn new(config: LocalSourceConfig, reporter: ErrorReporter) -> Self {
        let store = UsedQuestionStore::new(config.used_questions_path.clone());
        Self {
            config,
            selection: Mutex::new(Selection::default()),
            store,
            reporter,
        }
    }

    async fn load_questions(&self) -> TriviaResult<BTreeMap<QuestionKey, Question>> {
        let path = &self.config.trivia_file;
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            TriviaError::QuestionFileRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let pool = parse_question_file(&contents, path, &self.reporter)?;
        tracing::debug!(
            "{} questions have been loaded from {}",
            pool.len(),
            path.display()
        );
        Ok(pool)
    }

    async fn persist(&self, generation: u64, keys: &[QuestionKey]) {
        if let Err(e) = self.store.save(generation, keys).await {
            self.reporter.report(&e);
        }
    }

    #[cfg(test)]
    async fn used_count(&self) -> usize {
        self.selection.lock().await.used.len()
    }
}

#[async_trait]
impl QuestionSource for LocalQuestionSource {
    async fn initialize(&self) -> TriviaResult<()> {
        tracing::debug!("Initializing questions");
        let questions = self.load_questions().await?;

        let used = if self.config.persist_used_questions {
            self.store.load().await
        } else {
            BTreeSet::new()
        };

        let mut selection = self.selection.lock().await;
        selection.questions = questions;
        selection.used = used;
        selection.generation += 1;
        Ok(())
    }

    async fn get_new_question(&self) -> TriviaResult<Question> {
        let (question, snapshot) = {
            let mut selection = self.selection.lock().await;

            if selection.questions.is_empty() {
                selection.questions = self.load_questions().await?;
                tracing::warn!(
                    "Reloaded questions from file; there are now {} questions",
                    selection.questions.len()
                );
            }

            if selection.unused().is_empty() && self.config.recycle_questions {
                tracing::info!("Recycling used questions");
                match self.load_questions().await {
                    Ok(questions) => selection.questions = questions,
                    Err(e) => self.reporter.report(&e),
                }
                selection.used.clear();
                selection.generation += 1;
            }

            let unused = selection.unused();
            tracing::debug!(
                "{} of {} questions unused before this draw",
                unused.len(),
                selection.questions.len()
            );
            let key = unused
                .choose(&mut rand::rng())
                .map(|key| (*key).clone())
                .ok_or(TriviaError::NoQuestionsAvailable)?;

            let question = selection
                .questions
                .get(&key)
                .cloned()
                .ok_or(TriviaError::NoQuestionsAvailable)?;
            selection.used.insert(key);
            selection.generation += 1;

            let snapshot = self
                .config
                .persist_used_questions
                .then(|| selection.snapshot());
            (question, snapshot)
        };

        if let Some((generation, keys)) = snapshot {
            self.persist(generation, &keys).await;
        }
        Ok(question)
    }

    fn name(&self) -> &str {
        "file"
    }
}
