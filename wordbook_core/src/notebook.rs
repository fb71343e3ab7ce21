//! Notebook - every user action against the persisted vocabulary state

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::codec::{self, Backup};
use crate::config::NotebookConfig;
use crate::error::{LookupError, NotebookError, ValidationError};
use crate::lookup::WordLookup;
use crate::model::{LookupData, QuizResult, UserProfile, WordEntry, DEFAULT_THEME};
use crate::progress::{self, LevelProgress, Notification, ProgressUpdate, WORD_XP};
use crate::storage::{self, KeyValueStore, PROFILE_KEY, STATS_KEY, THEMES_KEY, WORDS_KEY};
use crate::vocabulary::{ThemeInfo, Vocabulary};

/// Counts from a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub words: usize,
    pub stats: usize,
    pub themes: usize,
}

/// In-memory view of the notebook backed by a [`KeyValueStore`].
///
/// Each mutation is computed on a copy, written to the store, and only then
/// made visible, so a failed write leaves both the store and this view as
/// they were.
pub struct Notebook<S: KeyValueStore> {
    store: S,
    config: NotebookConfig,
    vocabulary: Vocabulary,
    stats: Vec<QuizResult>,
    profile: UserProfile,
    notifications: Vec<Notification>,
}

impl<S: KeyValueStore> Notebook<S> {
    pub fn open(store: S, config: NotebookConfig) -> Result<Self, NotebookError> {
        let words = storage::load_words(&store)?;
        let themes = storage::load_themes(&store)?;
        let stats = storage::load_stats(&store)?;
        let profile = storage::load_profile(&store)?;
        Ok(Self {
            store,
            config,
            vocabulary: Vocabulary::from_parts(words, themes),
            stats,
            profile,
            notifications: Vec::new(),
        })
    }

    pub fn words(&self) -> &[WordEntry] {
        self.vocabulary.words()
    }

    pub fn themes(&self) -> &[String] {
        self.vocabulary.themes()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn stats(&self) -> &[QuizResult] {
        &self.stats
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn config(&self) -> &NotebookConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn theme_counts(&self) -> Vec<ThemeInfo> {
        self.vocabulary.theme_counts()
    }

    pub fn level_progress(&self) -> LevelProgress {
        progress::level_progress(&self.profile)
    }

    /// Pending notices, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Ask the lookup collaborator about a word. Nothing is stored.
    pub fn lookup<L: WordLookup + ?Sized>(
        &self,
        lookup: &L,
        word: &str,
        theme: &str,
    ) -> Result<LookupData, NotebookError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(LookupError::EmptyQuery.into());
        }
        lookup.lookup(word, theme).map_err(|err| {
            warn!(word, theme, error = %err, "word lookup failed");
            err.into()
        })
    }

    /// Store a looked-up word under `theme` and award XP for it.
    pub fn add_word(
        &mut self,
        word: &str,
        theme: &str,
        data: LookupData,
    ) -> Result<ProgressUpdate, NotebookError> {
        let now = Utc::now().timestamp_millis();
        let theme = match theme.trim() {
            "" => DEFAULT_THEME,
            named => named,
        };
        let entry = WordEntry {
            id: Uuid::new_v4().to_string(),
            word: word.trim().to_string(),
            pronunciation: data.pronunciation,
            meaning: data.meaning,
            explanation: data.explanation,
            example: data.example,
            theme: theme.to_string(),
            added_at: now,
        };

        let mut vocabulary = self.vocabulary.clone();
        let discovered = vocabulary.add_word(entry);
        let update = progress::apply_xp(
            &self.profile,
            WORD_XP,
            vocabulary.words(),
            &self.stats,
            self.config.badge_notice_delay,
        );

        let mut entries = vec![
            (WORDS_KEY, storage::encode(vocabulary.words())?),
            (PROFILE_KEY, storage::encode(&update.profile)?),
        ];
        if discovered {
            entries.push((THEMES_KEY, storage::encode(vocabulary.themes())?));
        }
        self.store.set_many(&entries)?;

        self.vocabulary = vocabulary;
        self.commit_progress(&update);
        Ok(update)
    }

    /// Look up and add in one step; a failed lookup adds nothing.
    pub fn learn_word<L: WordLookup + ?Sized>(
        &mut self,
        lookup: &L,
        word: &str,
        theme: &str,
    ) -> Result<ProgressUpdate, NotebookError> {
        let data = self.lookup(lookup, word, theme)?;
        self.add_word(word, theme, data)
    }

    pub fn add_theme(&mut self, name: &str) -> Result<(), NotebookError> {
        let mut vocabulary = self.vocabulary.clone();
        vocabulary.add_theme(name)?;
        self.store
            .set(THEMES_KEY, &storage::encode(vocabulary.themes())?)?;
        self.vocabulary = vocabulary;
        Ok(())
    }

    /// Returns how many words moved to the new name.
    pub fn rename_theme(&mut self, old_name: &str, new_name: &str) -> Result<usize, NotebookError> {
        let mut vocabulary = self.vocabulary.clone();
        let moved = vocabulary.rename_theme(old_name, new_name)?;
        self.persist_vocabulary(&vocabulary)?;
        self.vocabulary = vocabulary;
        Ok(moved)
    }

    /// Delete a dictionary and its words. Returns how many words went with it.
    pub fn delete_theme(&mut self, name: &str) -> Result<usize, NotebookError> {
        let mut vocabulary = self.vocabulary.clone();
        let removed = vocabulary.delete_theme(name)?;
        self.persist_vocabulary(&vocabulary)?;
        self.vocabulary = vocabulary;
        Ok(removed)
    }

    /// Append a finished quiz to history and award its XP.
    pub fn finish_quiz(&mut self, result: QuizResult) -> Result<ProgressUpdate, NotebookError> {
        if self.stats.iter().any(|s| s.id == result.id) {
            return Err(ValidationError::DuplicateResult(result.id).into());
        }
        let mut stats = self.stats.clone();
        let xp = result.xp_earned;
        stats.push(result);
        let update = progress::apply_xp(
            &self.profile,
            xp,
            self.vocabulary.words(),
            &stats,
            self.config.badge_notice_delay,
        );

        self.store.set_many(&[
            (STATS_KEY, storage::encode(&stats)?),
            (PROFILE_KEY, storage::encode(&update.profile)?),
        ])?;

        self.stats = stats;
        self.commit_progress(&update);
        Ok(update)
    }

    pub fn export_backup(&self) -> Result<String, NotebookError> {
        let backup = Backup {
            profile: self.profile.clone(),
            words: self.vocabulary.words().to_vec(),
            stats: self.stats.clone(),
            themes: self.vocabulary.themes().to_vec(),
        };
        Ok(codec::encode(&backup)?)
    }

    pub fn backup_file_name(&self) -> String {
        codec::backup_file_name(&self.config.app_name, Utc::now().date_naive())
    }

    /// Replace all four collections with the backup's contents. Any error
    /// leaves the current state untouched.
    pub fn import_backup(&mut self, content: &str) -> Result<ImportSummary, NotebookError> {
        let Backup {
            mut profile,
            words,
            stats,
            themes,
        } = codec::decode(content)?;
        profile.level = progress::calculate_level(profile.xp);

        let vocabulary = Vocabulary::from_parts(words, themes);
        self.store.set_many(&[
            (WORDS_KEY, storage::encode(vocabulary.words())?),
            (STATS_KEY, storage::encode(&stats)?),
            (PROFILE_KEY, storage::encode(&profile)?),
            (THEMES_KEY, storage::encode(vocabulary.themes())?),
        ])?;

        let summary = ImportSummary {
            words: vocabulary.words().len(),
            stats: stats.len(),
            themes: vocabulary.themes().len(),
        };
        info!(?summary, "backup imported");
        self.vocabulary = vocabulary;
        self.stats = stats;
        self.profile = profile;
        Ok(summary)
    }

    fn persist_vocabulary(&mut self, vocabulary: &Vocabulary) -> Result<(), NotebookError> {
        self.store.set_many(&[
            (THEMES_KEY, storage::encode(vocabulary.themes())?),
            (WORDS_KEY, storage::encode(vocabulary.words())?),
        ])?;
        Ok(())
    }

    fn commit_progress(&mut self, update: &ProgressUpdate) {
        self.profile = update.profile.clone();
        self.notifications.extend(update.notifications.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;

    fn data(meaning: &str) -> LookupData {
        LookupData {
            pronunciation: "/x/".into(),
            meaning: meaning.into(),
            explanation: "e".into(),
            example: "ex".into(),
        }
    }

    fn notebook() -> Notebook<MemoryStore> {
        Notebook::open(MemoryStore::new(), NotebookConfig::default()).unwrap()
    }

    /// Store whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail {
                let err = serde_json::from_str::<u8>("disk full").unwrap_err();
                return Err(StoreError::Serialize(err));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn adding_words_awards_xp_and_discovers_themes() {
        let mut nb = notebook();
        let update = nb.add_word("  scalpel ", "Medical", data("dao mo")).unwrap();
        assert_eq!(update.profile.xp, 10);
        assert_eq!(nb.words()[0].word, "scalpel");
        assert_eq!(nb.themes(), &[DEFAULT_THEME, "Medical"]);

        let reopened = Notebook::open(nb.store().clone(), NotebookConfig::default()).unwrap();
        assert_eq!(reopened.words().len(), 1);
        assert_eq!(reopened.themes(), nb.themes());
        assert_eq!(reopened.profile().xp, 10);
    }

    #[test]
    fn fifth_word_unlocks_badge_with_notice() {
        let mut nb = notebook();
        for i in 0..5 {
            nb.add_word(&format!("w{i}"), DEFAULT_THEME, data("m")).unwrap();
        }
        assert!(nb.profile().has_badge("novice_scholar"));
        let notices = nb.drain_notifications();
        assert_eq!(notices.len(), 1);
        assert!(nb.drain_notifications().is_empty());
    }

    #[test]
    fn failed_lookup_adds_nothing() {
        let mut nb = notebook();
        let failing = |_: &str, _: &str| -> Result<LookupData, LookupError> {
            Err(LookupError::Provider("offline".into()))
        };
        let err = nb.learn_word(&failing, "apple", DEFAULT_THEME).unwrap_err();
        assert!(matches!(err, NotebookError::Lookup(LookupError::Provider(_))));
        assert!(nb.words().is_empty());
        assert_eq!(nb.profile().xp, 0);

        let err = nb.learn_word(&failing, "   ", DEFAULT_THEME).unwrap_err();
        assert!(matches!(err, NotebookError::Lookup(LookupError::EmptyQuery)));
    }

    #[test]
    fn theme_changes_are_persisted_together() {
        let mut nb = notebook();
        nb.add_theme("Travel").unwrap();
        for w in ["ticket", "passport", "luggage"] {
            nb.add_word(w, "Travel", data(w)).unwrap();
        }
        assert_eq!(nb.rename_theme("Travel", "Trips").unwrap(), 3);
        assert_eq!(nb.delete_theme("Trips").unwrap(), 3);

        let reopened = Notebook::open(nb.store().clone(), NotebookConfig::default()).unwrap();
        assert!(reopened.words().is_empty());
        assert_eq!(reopened.themes(), &[DEFAULT_THEME]);
    }

    #[test]
    fn rejected_theme_actions_change_nothing() {
        let mut nb = notebook();
        nb.add_theme("Travel").unwrap();
        assert!(matches!(
            nb.add_theme("Travel"),
            Err(NotebookError::Validation(ValidationError::ThemeExists(_)))
        ));
        assert!(matches!(
            nb.delete_theme(DEFAULT_THEME),
            Err(NotebookError::Validation(ValidationError::ProtectedTheme(_)))
        ));
        assert_eq!(nb.themes(), &[DEFAULT_THEME, "Travel"]);
    }

    #[test]
    fn failed_write_keeps_previous_state() {
        let store = FlakyStore::default();
        let mut nb = Notebook::open(store, NotebookConfig::default()).unwrap();
        nb.add_theme("Travel").unwrap();
        nb.add_word("ticket", "Travel", data("ve")).unwrap();

        nb.store.fail = true;
        assert!(matches!(nb.delete_theme("Travel"), Err(NotebookError::Store(_))));
        assert_eq!(nb.words().len(), 1);
        assert!(nb.themes().iter().any(|t| t == "Travel"));
        assert!(nb.finish_quiz(QuizResult {
            id: "q".into(),
            date: "2026-10-16T00:00:00Z".into(),
            score: 1,
            total_questions: 1,
            xp_earned: 60,
        })
        .is_err());
        assert!(nb.stats().is_empty());
        assert_eq!(nb.profile().xp, 10);
    }

    #[test]
    fn resubmitted_quiz_result_is_rejected() {
        let mut nb = notebook();
        let result = QuizResult {
            id: "q1".into(),
            date: "2026-10-16T00:00:00Z".into(),
            score: 3,
            total_questions: 4,
            xp_earned: 30,
        };
        nb.finish_quiz(result.clone()).unwrap();
        assert!(matches!(
            nb.finish_quiz(result),
            Err(NotebookError::Validation(ValidationError::DuplicateResult(_)))
        ));
        assert_eq!(nb.stats().len(), 1);
        assert_eq!(nb.profile().xp, 30);
    }

    #[test]
    fn reopening_recomputes_cached_level() {
        let mut store = MemoryStore::new();
        store
            .set(PROFILE_KEY, r#"{"xp":400,"level":1,"unlockedBadges":[]}"#)
            .unwrap();
        let nb = Notebook::open(store, NotebookConfig::default()).unwrap();
        assert_eq!(nb.profile().level, 3);
        assert_eq!(nb.level_progress().next_level_xp, 600);
    }

    #[test]
    fn bad_import_keeps_previous_state() {
        let mut nb = notebook();
        nb.add_word("ticket", "Travel", data("ve")).unwrap();
        assert!(matches!(nb.import_backup(""), Err(NotebookError::Import(_))));
        assert!(matches!(nb.import_backup("just,some\ncsv"), Err(NotebookError::Import(_))));
        assert_eq!(nb.words().len(), 1);
        assert_eq!(nb.profile().xp, 10);
    }

    #[test]
    fn backup_file_name_uses_app_name() {
        let nb = notebook();
        let name = nb.backup_file_name();
        assert!(name.starts_with("wordbook_backup_"));
        assert!(name.ends_with(".csv"));
    }
}
