//! Runtime configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NotebookConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Wait before the badge notice so it does not cover a level-up notice
    pub badge_notice_delay: Duration,
    pub app_name: String,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: "info".to_string(),
            badge_notice_delay: Duration::from_millis(500),
            app_name: "wordbook".to_string(),
        }
    }
}

impl NotebookConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("WORDBOOK_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        let badge_notice_delay = std::env::var("WORDBOOK_BADGE_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.badge_notice_delay);

        let app_name = std::env::var("WORDBOOK_APP_NAME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.app_name);

        Self {
            db_path,
            log_level,
            badge_notice_delay,
            app_name,
        }
    }
}
