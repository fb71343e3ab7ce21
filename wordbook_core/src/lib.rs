//! Wordbook Core - vocabulary notebook engine
//!
//! Dictionaries of looked-up words, auto-generated quizzes, XP/level/badge
//! progression and a CSV backup format. Persistence goes through a
//! [`KeyValueStore`], randomness through any [`rand::Rng`].

mod codec;
mod config;
mod error;
mod fuzzy;
mod logging;
mod lookup;
mod model;
mod notebook;
mod progress;
mod quiz;
mod storage;
mod vocabulary;

#[cfg(feature = "python")]
mod python;

pub use codec::{backup_file_name, decode, encode, reconcile_themes, Backup, ThemesColumn};
pub use config::NotebookConfig;
pub use error::{
    ExportError, ImportError, LookupError, NotebookError, QuizError, StoreError, ValidationError,
};
pub use fuzzy::{check_typed_answer, TypedAnswer};
pub use logging::init_tracing;
pub use lookup::{parse_lookup_payload, WordLookup};
pub use model::{LookupData, QuizResult, UserProfile, WordEntry, DEFAULT_THEME};
pub use notebook::{ImportSummary, Notebook};
pub use progress::{
    apply_xp, calculate_level, check_new_badges, daily_averages, find_badge, level_progress,
    next_level_xp, ActivityStats, Badge, DailyScore, LevelProgress, Notification,
    NotificationKind, ProgressUpdate, BADGES, LEVELS, WORD_XP,
};
pub use quiz::{
    generate_questions, mask_word, quiz_xp, Advance, AnswerOutcome, OptionState, Question,
    QuestionKind, QuizSession, QuizStep, BLANK, MAX_QUESTIONS, MIN_POOL_SIZE,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use vocabulary::{ThemeInfo, Vocabulary};
