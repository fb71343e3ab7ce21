//! Word collection and dictionary (theme) set

use tracing::debug;

use crate::error::ValidationError;
use crate::model::{WordEntry, DEFAULT_THEME};

/// Theme name with its derived word count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInfo {
    pub name: String,
    pub word_count: usize,
}

/// Words (newest first) plus the ordered, duplicate-free theme set.
///
/// Every mutation either succeeds completely or leaves both collections
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<WordEntry>,
    themes: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            themes: vec![DEFAULT_THEME.to_string()],
        }
    }
}

impl Vocabulary {
    /// Build from persisted parts. Duplicate themes are dropped and the
    /// default dictionary is inserted at the front when missing.
    pub fn from_parts(words: Vec<WordEntry>, themes: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(themes.len() + 1);
        for theme in themes {
            if !unique.contains(&theme) {
                unique.push(theme);
            }
        }
        if !unique.iter().any(|t| t == DEFAULT_THEME) {
            unique.insert(0, DEFAULT_THEME.to_string());
        }
        Self {
            words,
            themes: unique,
        }
    }

    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn has_theme(&self, name: &str) -> bool {
        self.themes.iter().any(|t| t == name)
    }

    /// Prepend a word. Returns true when its theme was new and got appended
    /// to the theme set.
    pub fn add_word(&mut self, mut entry: WordEntry) -> bool {
        if entry.theme.trim().is_empty() {
            entry.theme = DEFAULT_THEME.to_string();
        }
        let discovered = !self.has_theme(&entry.theme);
        if discovered {
            debug!(theme = %entry.theme, "discovered dictionary from new word");
            self.themes.push(entry.theme.clone());
        }
        self.words.insert(0, entry);
        discovered
    }

    pub fn add_theme(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = checked_name(name)?;
        if self.has_theme(name) {
            return Err(ValidationError::ThemeExists(name.to_string()));
        }
        self.themes.push(name.to_string());
        debug!(theme = name, "dictionary created");
        Ok(())
    }

    /// Rename in place and retag its words. Returns the number of words
    /// moved to the new name.
    pub fn rename_theme(&mut self, old_name: &str, new_name: &str) -> Result<usize, ValidationError> {
        let new_name = checked_name(new_name)?;
        if old_name == DEFAULT_THEME {
            return Err(ValidationError::ProtectedTheme(old_name.to_string()));
        }
        if self.has_theme(new_name) {
            return Err(ValidationError::ThemeExists(new_name.to_string()));
        }
        let position = self
            .themes
            .iter()
            .position(|t| t == old_name)
            .ok_or_else(|| ValidationError::UnknownTheme(old_name.to_string()))?;

        self.themes[position] = new_name.to_string();
        let mut moved = 0;
        for word in self.words.iter_mut().filter(|w| w.theme == old_name) {
            word.theme = new_name.to_string();
            moved += 1;
        }
        debug!(from = old_name, to = new_name, moved, "dictionary renamed");
        Ok(moved)
    }

    /// Remove a dictionary together with all of its words. Returns how many
    /// words were removed.
    pub fn delete_theme(&mut self, name: &str) -> Result<usize, ValidationError> {
        if name == DEFAULT_THEME {
            return Err(ValidationError::ProtectedTheme(name.to_string()));
        }
        if !self.has_theme(name) {
            return Err(ValidationError::UnknownTheme(name.to_string()));
        }
        self.themes.retain(|t| t != name);
        let before = self.words.len();
        self.words.retain(|w| w.theme != name);
        let removed = before - self.words.len();
        debug!(theme = name, removed, "dictionary deleted");
        Ok(removed)
    }

    pub fn word_count(&self, theme: &str) -> usize {
        self.words
            .iter()
            .filter(|w| w.theme_or_default() == theme)
            .count()
    }

    /// Every theme in display order with its word count
    pub fn theme_counts(&self) -> Vec<ThemeInfo> {
        self.themes
            .iter()
            .map(|name| ThemeInfo {
                name: name.clone(),
                word_count: self.word_count(name),
            })
            .collect()
    }
}

fn checked_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyThemeName)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(id: &str, word: &str, theme: &str) -> WordEntry {
        WordEntry {
            id: id.to_string(),
            word: word.to_string(),
            pronunciation: format!("/{word}/"),
            meaning: format!("meaning of {word}"),
            explanation: String::new(),
            example: format!("I like the {word}."),
            theme: theme.to_string(),
            added_at: 0,
        }
    }

    fn sample() -> Vocabulary {
        let mut vocab = Vocabulary::default();
        vocab.add_theme("Travel").unwrap();
        vocab.add_theme("Food").unwrap();
        vocab.add_word(entry("1", "ticket", "Travel"));
        vocab.add_word(entry("2", "apple", "Food"));
        vocab.add_word(entry("3", "passport", "Travel"));
        vocab.add_word(entry("4", "hello", DEFAULT_THEME));
        vocab.add_word(entry("5", "luggage", "Travel"));
        vocab
    }

    #[test]
    fn add_word_prepends_and_discovers_theme() {
        let mut vocab = Vocabulary::default();
        vocab.add_word(entry("1", "a", DEFAULT_THEME));
        assert!(vocab.add_word(entry("2", "b", "Medical")));
        assert!(!vocab.add_word(entry("3", "c", "Medical")));
        assert_eq!(vocab.words()[0].id, "3");
        assert_eq!(vocab.themes(), &[DEFAULT_THEME, "Medical"]);
    }

    #[test]
    fn blank_word_theme_goes_to_default() {
        let mut vocab = Vocabulary::default();
        assert!(!vocab.add_word(entry("1", "a", "   ")));
        assert_eq!(vocab.themes(), &[DEFAULT_THEME]);
        assert_eq!(vocab.words()[0].theme, DEFAULT_THEME);
    }

    #[test]
    fn add_theme_rejects_duplicates() {
        let mut vocab = sample();
        let before = vocab.clone();
        assert_eq!(
            vocab.add_theme("Travel"),
            Err(ValidationError::ThemeExists("Travel".into()))
        );
        assert_eq!(vocab, before);
        // case-sensitive
        assert!(vocab.add_theme("travel").is_ok());
    }

    #[test]
    fn rename_keeps_position_and_retags_words() {
        let mut vocab = sample();
        let index = vocab.themes().iter().position(|t| t == "Travel").unwrap();
        assert_eq!(vocab.rename_theme("Travel", "Trips"), Ok(3));
        assert_eq!(vocab.themes()[index], "Trips");
        assert!(!vocab.has_theme("Travel"));
        assert_eq!(vocab.themes().iter().filter(|t| *t == "Trips").count(), 1);
        assert!(vocab.words().iter().all(|w| w.theme != "Travel"));
        assert_eq!(vocab.word_count("Trips"), 3);
    }

    #[test]
    fn rename_onto_existing_name_changes_nothing() {
        let mut vocab = sample();
        let before = vocab.clone();
        assert_eq!(
            vocab.rename_theme("Travel", "Food"),
            Err(ValidationError::ThemeExists("Food".into()))
        );
        assert_eq!(vocab, before);
    }

    #[test]
    fn default_theme_cannot_be_renamed() {
        let mut vocab = sample();
        assert!(matches!(
            vocab.rename_theme(DEFAULT_THEME, "General"),
            Err(ValidationError::ProtectedTheme(_))
        ));
    }

    #[test]
    fn delete_cascades_to_words() {
        let mut vocab = sample();
        assert_eq!(vocab.delete_theme("Travel"), Ok(3));
        assert!(!vocab.has_theme("Travel"));
        assert_eq!(vocab.words().len(), 2);
        assert!(vocab.words().iter().all(|w| w.theme != "Travel"));
    }

    #[test]
    fn deleting_default_theme_is_rejected() {
        let mut vocab = sample();
        let before = vocab.clone();
        assert!(matches!(
            vocab.delete_theme(DEFAULT_THEME),
            Err(ValidationError::ProtectedTheme(_))
        ));
        assert_eq!(vocab, before);
    }

    #[test]
    fn from_parts_repairs_theme_set() {
        let vocab = Vocabulary::from_parts(Vec::new(), vec!["A".into(), "A".into()]);
        assert_eq!(vocab.themes(), &[DEFAULT_THEME, "A"]);
    }

    #[test]
    fn theme_counts_follow_display_order() {
        let counts = sample().theme_counts();
        let view: Vec<(&str, usize)> = counts.iter().map(|c| (c.name.as_str(), c.word_count)).collect();
        assert_eq!(view, vec![(DEFAULT_THEME, 1), ("Travel", 3), ("Food", 1)]);
    }
}
