//! Open Trivia DB question source.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

use super::QuestionSource;
use crate::config::GameSettings;
use crate::error::{TriviaError, TriviaResult};
use crate::types::Question;

/// Upper bound for a single API call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const RESPONSE_SUCCESS: i64 = 0;
const RESPONSE_TOKEN_NOT_FOUND: i64 = 3;
const RESPONSE_TOKEN_EMPTY: i64 = 4;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    response_code: i64,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionResponse {
    response_code: i64,
    #[serde(default)]
    results: Vec<ApiResult>,
}

/// One base64-encoded result as returned with `encode=base64`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResult {
    pub question: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub correct_answers: Option<Vec<String>>,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

fn decode_field(encoded: &str) -> TriviaResult<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TriviaError::Decode(format!("{}: {}", encoded, e)))?;
    String::from_utf8(bytes).map_err(|e| TriviaError::Decode(e.to_string()))
}

/// Decode a base64 API result into a question
pub fn decode_result(result: &ApiResult) -> TriviaResult<Question> {
    let correct: Vec<&String> = match (&result.correct_answers, &result.correct_answer) {
        (Some(many), _) => many.iter().collect(),
        (None, Some(one)) => vec![one],
        (None, None) => Vec::new(),
    };

    let question_text = decode_field(&result.question)?;
    if correct.is_empty() {
        return Err(TriviaError::NoCorrectAnswers(question_text));
    }

    Ok(Question {
        question_text,
        correct_answers: correct
            .into_iter()
            .map(|a| decode_field(a))
            .collect::<TriviaResult<_>>()?,
        incorrect_answers: result
            .incorrect_answers
            .iter()
            .map(|a| decode_field(a))
            .collect::<TriviaResult<_>>()?,
    })
}

pub struct RemoteQuestionSource {
    client: reqwest::Client,
    base_url: String,
    categories: Vec<u32>,
    difficulties: Vec<String>,
    types: Vec<String>,
    timeout: Duration,
    /// Session token; reduces repeats across draws
    token: Mutex<Option<String>>,
}

impl RemoteQuestionSource {
    pub fn from_settings(settings: &GameSettings) -> Self {
        let source = &settings.source;
        Self {
            client: reqwest::Client::new(),
            base_url: source.api_base_url.trim_end_matches('/').to_string(),
            categories: source.enabled_categories.clone(),
            difficulties: source.enabled_difficulties.clone(),
            types: source.enabled_types.clone(),
            timeout: REQUEST_TIMEOUT,
            token: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn check_settings(&self) -> TriviaResult<()> {
        if self.categories.is_empty() || self.difficulties.is_empty() || self.types.is_empty() {
            return Err(TriviaError::MisconfiguredSource(format!(
                "{} categories, {} difficulties, {} types enabled",
                self.categories.len(),
                self.difficulties.len(),
                self.types.len()
            )));
        }
        Ok(())
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> TriviaResult<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TriviaError::RemoteApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TriviaError::RemoteApi(format!(
                "HTTP error! status: {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TriviaError::Decode(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> TriviaResult<T> {
        tokio::time::timeout(self.timeout, self.send(url, query))
            .await
            .map_err(|_| TriviaError::Timeout(self.timeout))?
    }

    async fn request_token(&self) -> TriviaResult<String> {
        let url = format!("{}/api_token.php", self.base_url);
        let response: TokenResponse = self
            .get_json(&url, &[("command", "request".to_string())])
            .await?;
        response.token.ok_or_else(|| {
            TriviaError::RemoteApi(format!(
                "no session token in response (response code {})",
                response.response_code
            ))
        })
    }

    /// Fetch a token if we do not hold one. Failure only costs repeat protection.
    async fn ensure_token(&self) -> Option<String> {
        let mut token = self.token.lock().await;
        if token.is_none() {
            match self.request_token().await {
                Ok(fresh) => {
                    tracing::debug!("Got trivia API session token");
                    *token = Some(fresh);
                }
                Err(e) => tracing::warn!("Continuing without a session token: {}", e),
            }
        }
        token.clone()
    }

    fn pick_filters(&self) -> Option<(u32, String, String)> {
        let mut rng = rand::rng();
        let category = *self.categories.choose(&mut rng)?;
        let difficulty = self.difficulties.choose(&mut rng)?.clone();
        let kind = self.types.choose(&mut rng)?.clone();
        Some((category, difficulty, kind))
    }

    #[cfg(test)]
    async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionSource {
    async fn initialize(&self) -> TriviaResult<()> {
        self.check_settings()?;
        self.ensure_token().await;
        Ok(())
    }

    async fn get_new_question(&self) -> TriviaResult<Question> {
        self.check_settings()?;
        let token = self.ensure_token().await;

        let (category, difficulty, kind) = self
            .pick_filters()
            .ok_or_else(|| TriviaError::MisconfiguredSource("empty filter set".into()))?;

        let mut query = vec![
            ("amount", "1".to_string()),
            ("category", category.to_string()),
            ("difficulty", difficulty),
            ("type", kind),
            ("encode", "base64".to_string()),
        ];
        if let Some(token) = token {
            query.push(("token", token));
        }

        let url = format!("{}/api.php", self.base_url);
        let response: QuestionResponse = self.get_json(&url, &query).await?;

        match response.response_code {
            RESPONSE_SUCCESS => {
                let result = response
                    .results
                    .first()
                    .ok_or_else(|| TriviaError::RemoteApi("response contained no results".into()))?;
                decode_result(result)
            }
            code @ (RESPONSE_TOKEN_NOT_FOUND | RESPONSE_TOKEN_EMPTY) => {
                tracing::warn!("Session token rejected (response code {}); dropping it", code);
                *self.token.lock().await = None;
                Err(TriviaError::RemoteApi(format!(
                    "opentdb.com API response code: {}",
                    code
                )))
            }
            code => Err(TriviaError::RemoteApi(format!(
                "opentdb.com API response code: {}",
                code
            ))),
        }
    }

    fn name(&self) -> &str {
        "opentdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_decode_single_correct_answer() {
        let result = ApiResult {
            question: b64("What is 2 + 2?"),
            correct_answer: Some(b64("4")),
            correct_answers: None,
            incorrect_answers: vec![b64("3"), b64("5"), b64("22")],
        };
        let q = decode_result(&result).unwrap();
        assert_eq!(q.question_text, "What is 2 + 2?");
        assert_eq!(q.correct_answers, vec!["4"]);
        assert_eq!(q.incorrect_answers, vec!["3", "5", "22"]);
    }

    #[test]
    fn test_decode_many_correct_answers() {
        let result = ApiResult {
            question: b64("Pick the primes"),
            correct_answer: Some(b64("ignored")),
            correct_answers: Some(vec![b64("2"), b64("3")]),
            incorrect_answers: vec![b64("4")],
        };
        let q = decode_result(&result).unwrap();
        assert_eq!(q.correct_answers, vec!["2", "3"]);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let result = ApiResult {
            question: "not base64!!".to_string(),
            correct_answer: Some(b64("x")),
            ..Default::default()
        };
        assert!(matches!(
            decode_result(&result),
            Err(TriviaError::Decode(_))
        ));

        let result = ApiResult {
            question: b64("No answers"),
            ..Default::default()
        };
        assert!(matches!(
            decode_result(&result),
            Err(TriviaError::NoCorrectAnswers(_))
        ));
    }

    #[test]
    fn test_response_shape() {
        let json = r#"{
            "response_code": 0,
            "results": [{
                "type": "Ym9vbGVhbg==",
                "difficulty": "ZWFzeQ==",
                "category": "R2VuZXJhbCBLbm93bGVkZ2U=",
                "question": "VGhlIHNreSBpcyBibHVlLg==",
                "correct_answer": "VHJ1ZQ==",
                "incorrect_answers": ["RmFsc2U="]
            }]
        }"#;
        let response: QuestionResponse = serde_json::from_str(json).unwrap();
        let q = decode_result(&response.results[0]).unwrap();
        assert_eq!(q.question_text, "The sky is blue.");
        assert_eq!(q.correct_answers, vec!["True"]);
        assert_eq!(q.incorrect_answers, vec!["False"]);
    }

    #[tokio::test]
    async fn test_misconfigured_filters() {
        let mut settings = GameSettings::default();
        settings.source.enabled_difficulties.clear();
        let source = RemoteQuestionSource::from_settings(&settings);

        let err = source.initialize().await.unwrap_err();
        assert!(matches!(err, TriviaError::MisconfiguredSource(_)));
        assert!(err.is_critical());
        assert!(matches!(
            source.get_new_question().await,
            Err(TriviaError::MisconfiguredSource(_))
        ));
        assert!(!source.has_token().await);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_critical() {
        let mut settings = GameSettings::default();
        // Nothing listens on port 9 locally
        settings.source.api_base_url = "http://127.0.0.1:9".to_string();
        let source =
            RemoteQuestionSource::from_settings(&settings).with_timeout(Duration::from_secs(2));

        // A missing token is not fatal for initialize
        assert!(source.initialize().await.is_ok());
        assert!(!source.has_token().await);

        let err = source.get_new_question().await.unwrap_err();
        assert!(err.is_critical());
    }
}
