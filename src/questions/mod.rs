mod local;
mod remote;
mod used;

use async_trait::async_trait;

use crate::broadcast::ErrorReporter;
use crate::config::{GameSettings, SourceKind};
use crate::error::TriviaResult;
use crate::types::Question;

pub use local::{parse_question_file, question_key, LocalQuestionSource, LocalSourceConfig};
pub use remote::{decode_result, RemoteQuestionSource, REQUEST_TIMEOUT};
pub use used::UsedQuestionStore;

/// Trait that all question sources must implement
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Prepare the source (load files, fetch tokens)
    async fn initialize(&self) -> TriviaResult<()>;

    /// Produce one question that has not been asked yet
    async fn get_new_question(&self) -> TriviaResult<Question>;

    /// Get the name of this source
    fn name(&self) -> &str;
}

/// The question source selected by the current settings.
///
/// Failures are reported through the error reporter and surface to the
/// caller only as `false` / `None`.
pub struct QuestionSupply {
    source: Box<dyn QuestionSource>,
    reporter: ErrorReporter,
}

impl QuestionSupply {
    pub fn new(source: Box<dyn QuestionSource>, reporter: ErrorReporter) -> Self {
        Self { source, reporter }
    }

    /// Build the source named by `settings.source.kind`
    pub fn from_settings(settings: &GameSettings, reporter: ErrorReporter) -> Self {
        let source: Box<dyn QuestionSource> = match settings.source.kind {
            SourceKind::File => Box::new(LocalQuestionSource::new(
                LocalSourceConfig::from_settings(settings),
                reporter.clone(),
            )),
            SourceKind::Api => Box::new(RemoteQuestionSource::from_settings(settings)),
        };
        tracing::info!("Using {} question source", source.name());
        Self::new(source, reporter)
    }

    pub async fn initialize(&self) -> bool {
        match self.source.initialize().await {
            Ok(()) => true,
            Err(e) => {
                self.reporter.report(&e);
                false
            }
        }
    }

    pub async fn get_new_question(&self) -> Option<Question> {
        match self.source.get_new_question().await {
            Ok(question) => {
                tracing::debug!("Drew question: {}", question.question_text);
                Some(question)
            }
            Err(e) => {
                self.reporter.report(&e);
                None
            }
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}
