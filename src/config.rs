//! Game settings snapshot and environment loading.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default trivia API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://opentdb.com";

/// Default file name for the persisted used-question set
pub const USED_QUESTIONS_FILE: &str = "used-questions.json";

/// How answer choices are ordered before display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AnswerSortOrder {
    Alphabetical,
    #[default]
    Random,
}

/// Which question source backs the game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SourceKind {
    File,
    #[default]
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrencySettings {
    /// Deducted at a user's first answer
    pub wager: i64,
    /// Base amount won on a correct answer
    pub payout: i64,
    /// Bonus for a correct answer at t=0
    pub time_bonus: i64,
    /// Higher values reward faster answers more
    pub time_bonus_decay: f64,
    pub allow_insufficient_balance: bool,
    /// Record adjustments without applying them
    pub dry_run: bool,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            wager: 10,
            payout: 10,
            time_bonus: 10,
            time_bonus_decay: 1.0,
            allow_insufficient_balance: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub trivia_file: PathBuf,
    pub enabled_categories: Vec<u32>,
    pub enabled_difficulties: Vec<String>,
    pub enabled_types: Vec<String>,
    pub api_base_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Api,
            trivia_file: PathBuf::new(),
            // 24 (Politics) is off by default
            enabled_categories: (9..=32).filter(|c| *c != 24).collect(),
            enabled_difficulties: vec!["easy".into(), "medium".into(), "hard".into()],
            enabled_types: vec!["multiple".into(), "boolean".into()],
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameplaySettings {
    pub answer_sort_order: AnswerSortOrder,
    pub time_limit_secs: u64,
    pub permit_answer_change: bool,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            answer_sort_order: AnswerSortOrder::Random,
            time_limit_secs: 30,
            permit_answer_change: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OtherSettings {
    /// Seconds between "answer accepted" batches
    pub confirmation_interval_secs: u64,
    /// Applies to the file source only
    pub persist_used_questions: bool,
    /// Applies to the file source only
    pub recycle_questions: bool,
    pub used_questions_path: PathBuf,
}

impl Default for OtherSettings {
    fn default() -> Self {
        Self {
            confirmation_interval_secs: 3,
            persist_used_questions: true,
            recycle_questions: true,
            used_questions_path: PathBuf::from(USED_QUESTIONS_FILE),
        }
    }
}

/// Read-only settings snapshot consumed by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GameSettings {
    pub currency: CurrencySettings,
    pub source: SourceSettings,
    pub gameplay: GameplaySettings,
    pub other: OtherSettings,
}

impl GameSettings {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.gameplay.time_limit_secs.max(1))
    }

    pub fn confirmation_interval(&self) -> Duration {
        Duration::from_secs(self.other.confirmation_interval_secs.max(1))
    }

    /// Load settings from `TRIVIA_*` environment variables over the defaults
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        let c = &mut settings.currency;
        c.wager = env_parse("TRIVIA_WAGER").unwrap_or(c.wager).max(0);
        c.payout = env_parse("TRIVIA_PAYOUT").unwrap_or(c.payout).max(0);
        c.time_bonus = env_parse("TRIVIA_TIME_BONUS").unwrap_or(c.time_bonus).max(0);
        c.time_bonus_decay = env_parse("TRIVIA_TIME_BONUS_DECAY")
            .unwrap_or(c.time_bonus_decay)
            .max(1.0);
        c.allow_insufficient_balance =
            env_flag("TRIVIA_ALLOW_INSUFFICIENT_BALANCE").unwrap_or(c.allow_insufficient_balance);
        c.dry_run = env_flag("TRIVIA_DRY_RUN").unwrap_or(c.dry_run);

        let s = &mut settings.source;
        s.kind = match env_string("TRIVIA_SOURCE").map(|v| v.to_lowercase()).as_deref() {
            Some("file") => SourceKind::File,
            Some("api") => SourceKind::Api,
            Some(other) => {
                tracing::warn!("Unknown TRIVIA_SOURCE '{}', using API", other);
                SourceKind::Api
            }
            None => s.kind,
        };
        if let Some(file) = env_string("TRIVIA_FILE") {
            s.trivia_file = PathBuf::from(file);
        }
        if let Some(categories) = env_list("TRIVIA_CATEGORIES") {
            s.enabled_categories = categories
                .iter()
                .filter_map(|c| c.parse().ok())
                .collect();
        }
        if let Some(difficulties) = env_list("TRIVIA_DIFFICULTIES") {
            s.enabled_difficulties = difficulties;
        }
        if let Some(types) = env_list("TRIVIA_TYPES") {
            s.enabled_types = types;
        }
        if let Some(url) = env_string("TRIVIA_API_BASE_URL") {
            s.api_base_url = url.trim_end_matches('/').to_string();
        }

        let g = &mut settings.gameplay;
        g.answer_sort_order = match env_string("TRIVIA_ANSWER_SORT_ORDER")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("alphabetical") => AnswerSortOrder::Alphabetical,
            Some("random") => AnswerSortOrder::Random,
            _ => g.answer_sort_order,
        };
        g.time_limit_secs = env_parse("TRIVIA_TIME_LIMIT")
            .unwrap_or(g.time_limit_secs)
            .max(1);
        g.permit_answer_change =
            env_flag("TRIVIA_PERMIT_ANSWER_CHANGE").unwrap_or(g.permit_answer_change);

        let o = &mut settings.other;
        o.confirmation_interval_secs = env_parse("TRIVIA_CONFIRMATION_INTERVAL")
            .unwrap_or(o.confirmation_interval_secs)
            .max(1);
        o.persist_used_questions =
            env_flag("TRIVIA_PERSIST_USED_QUESTIONS").unwrap_or(o.persist_used_questions);
        o.recycle_questions = env_flag("TRIVIA_RECYCLE_QUESTIONS").unwrap_or(o.recycle_questions);
        if let Some(path) = env_string("TRIVIA_USED_QUESTIONS_PATH") {
            o.used_questions_path = PathBuf::from(path);
        }

        settings
    }
}

/// Settings for the standalone host binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Balance given to users the host has never seen
    pub starting_balance: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8487,
            starting_balance: 100,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            starting_balance: env_parse("TRIVIA_STARTING_BALANCE")
                .unwrap_or(defaults.starting_balance),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env_string(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}='{}'", key, value);
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env_string(key).map(|v| v != "0" && v.to_lowercase() != "false")
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env_string(key).map(|v| {
        v.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "TRIVIA_WAGER",
        "TRIVIA_PAYOUT",
        "TRIVIA_TIME_BONUS_DECAY",
        "TRIVIA_SOURCE",
        "TRIVIA_FILE",
        "TRIVIA_CATEGORIES",
        "TRIVIA_ANSWER_SORT_ORDER",
        "TRIVIA_TIME_LIMIT",
        "TRIVIA_PERMIT_ANSWER_CHANGE",
        "TRIVIA_DRY_RUN",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.currency.wager, 10);
        assert_eq!(settings.currency.payout, 10);
        assert_eq!(settings.currency.time_bonus, 10);
        assert_eq!(settings.currency.time_bonus_decay, 1.0);
        assert!(!settings.currency.allow_insufficient_balance);
        assert_eq!(settings.source.kind, SourceKind::Api);
        assert!(!settings.source.enabled_categories.contains(&24));
        assert_eq!(settings.source.enabled_categories.len(), 23);
        assert_eq!(settings.gameplay.time_limit_secs, 30);
        assert!(settings.gameplay.permit_answer_change);
        assert_eq!(settings.confirmation_interval(), Duration::from_secs(3));
        assert!(settings.other.recycle_questions);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("TRIVIA_WAGER", "25");
        std::env::set_var("TRIVIA_SOURCE", "File");
        std::env::set_var("TRIVIA_FILE", " /tmp/questions.yaml ");
        std::env::set_var("TRIVIA_CATEGORIES", "9, 17,bogus");
        std::env::set_var("TRIVIA_ANSWER_SORT_ORDER", "Alphabetical");
        std::env::set_var("TRIVIA_PERMIT_ANSWER_CHANGE", "false");
        std::env::set_var("TRIVIA_DRY_RUN", "1");

        let settings = GameSettings::from_env();
        assert_eq!(settings.currency.wager, 25);
        assert!(settings.currency.dry_run);
        assert_eq!(settings.source.kind, SourceKind::File);
        assert_eq!(settings.source.trivia_file, PathBuf::from("/tmp/questions.yaml"));
        assert_eq!(settings.source.enabled_categories, vec![9, 17]);
        assert_eq!(
            settings.gameplay.answer_sort_order,
            AnswerSortOrder::Alphabetical
        );
        assert!(!settings.gameplay.permit_answer_change);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_garbage() {
        clear_env();
        std::env::set_var("TRIVIA_PAYOUT", "lots");
        std::env::set_var("TRIVIA_TIME_LIMIT", "0");
        std::env::set_var("TRIVIA_TIME_BONUS_DECAY", "0.2");

        let settings = GameSettings::from_env();
        assert_eq!(settings.currency.payout, 10);
        assert_eq!(settings.gameplay.time_limit_secs, 1);
        assert_eq!(settings.currency.time_bonus_decay, 1.0);

        clear_env();
    }
}
