//! Records persisted by the notebook

use serde::{Deserialize, Serialize};

/// Protected default dictionary. Always present, never deleted or renamed.
pub const DEFAULT_THEME: &str = "Chung";

/// Word entry stored in the notebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub id: String,
    pub word: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub theme: String,
    /// Epoch milliseconds
    pub added_at: i64,
}

impl WordEntry {
    /// Theme with the blank-means-default rule applied.
    pub fn theme_or_default(&self) -> &str {
        if self.theme.trim().is_empty() {
            DEFAULT_THEME
        } else {
            &self.theme
        }
    }
}

/// One finished quiz. Appended to history, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    /// ISO-8601 timestamp
    pub date: String,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub xp_earned: u32,
}

impl QuizResult {
    pub fn is_perfect(&self) -> bool {
        self.score == self.total_questions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub xp: u32,
    /// Cached; recomputed from `xp` after every XP event and import.
    pub level: u32,
    #[serde(default)]
    pub unlocked_badges: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            unlocked_badges: Vec::new(),
        }
    }
}

impl UserProfile {
    pub fn has_badge(&self, id: &str) -> bool {
        self.unlocked_badges.iter().any(|b| b == id)
    }

    /// Set union; badges are never removed.
    pub fn unlock<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.has_badge(&id) {
                self.unlocked_badges.push(id);
            }
        }
    }
}

/// Definition data returned by the word lookup collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupData {
    pub pronunciation: String,
    pub meaning: String,
    pub explanation: String,
    pub example: String,
}
