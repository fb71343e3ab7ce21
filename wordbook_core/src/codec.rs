//! CSV backup format
//!
//! One document, four sections in fixed order. Each section is a
//! `SECTION:<NAME>` marker line, a column header line, data rows and a
//! blank separator line:
//!
//! ```text
//! SECTION:PROFILE
//! xp,level,unlockedBadges
//! 120,2,novice_scholar|quiz_starter
//!
//! SECTION:WORDS
//! id,word,pronunciation,meaning,explanation,example,theme,addedAt
//! ...
//! ```

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ExportError, ImportError};
use crate::model::{QuizResult, UserProfile, WordEntry, DEFAULT_THEME};
use crate::progress::calculate_level;

pub const SECTION_PREFIX: &str = "SECTION:";
const BADGE_SEPARATOR: char = '|';

const PROFILE_HEADER: [&str; 3] = ["xp", "level", "unlockedBadges"];
const WORDS_HEADER: [&str; 8] = [
    "id",
    "word",
    "pronunciation",
    "meaning",
    "explanation",
    "example",
    "theme",
    "addedAt",
];
const STATS_HEADER: [&str; 5] = ["id", "date", "score", "totalQuestions", "xpEarned"];
const THEMES_HEADER: [&str; 1] = ["themes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Profile,
    Words,
    Stats,
    Themes,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Self::Profile => "PROFILE",
            Self::Words => "WORDS",
            Self::Stats => "STATS",
            Self::Themes => "THEMES",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "PROFILE" => Some(Self::Profile),
            "WORDS" => Some(Self::Words),
            "STATS" => Some(Self::Stats),
            "THEMES" => Some(Self::Themes),
            _ => None,
        }
    }
}

/// The full persisted state, as carried by a backup file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Backup {
    pub profile: UserProfile,
    pub words: Vec<WordEntry>,
    pub stats: Vec<QuizResult>,
    pub themes: Vec<String>,
}

/// THEMES column contents. JSON is what gets written; the pipe-joined
/// form is only read, for older backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemesColumn {
    Json(Vec<String>),
    Legacy(Vec<String>),
}

impl ThemesColumn {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(themes) => Self::Json(themes),
            Err(_) => Self::Legacy(
                raw.split(BADGE_SEPARATOR)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }

    pub fn into_themes(self) -> Vec<String> {
        match self {
            Self::Json(themes) | Self::Legacy(themes) => themes,
        }
    }
}

/// Serialize the whole notebook into one CSV document.
pub fn encode(backup: &Backup) -> Result<String, ExportError> {
    let mut out = String::new();

    let profile_row = vec![
        backup.profile.xp.to_string(),
        backup.profile.level.to_string(),
        backup.profile.unlocked_badges.join("|"),
    ];
    write_section(&mut out, Section::Profile, &PROFILE_HEADER, std::iter::once(profile_row))?;

    let word_rows = backup.words.iter().map(|w| {
        vec![
            w.id.clone(),
            w.word.clone(),
            w.pronunciation.clone(),
            w.meaning.clone(),
            w.explanation.clone(),
            w.example.clone(),
            w.theme.clone(),
            format_timestamp(w.added_at),
        ]
    });
    write_section(&mut out, Section::Words, &WORDS_HEADER, word_rows)?;

    let stat_rows = backup.stats.iter().map(|s| {
        vec![
            s.id.clone(),
            s.date.clone(),
            s.score.to_string(),
            s.total_questions.to_string(),
            s.xp_earned.to_string(),
        ]
    });
    write_section(&mut out, Section::Stats, &STATS_HEADER, stat_rows)?;

    let themes_json = serde_json::to_string(&backup.themes)?;
    write_section(&mut out, Section::Themes, &THEMES_HEADER, std::iter::once(vec![themes_json]))?;

    Ok(out)
}

fn write_section<I>(out: &mut String, section: Section, header: &[&str], rows: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record([format!("{SECTION_PREFIX}{}", section.name())])?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    out.push_str(&String::from_utf8_lossy(&bytes));
    out.push('\n');
    Ok(())
}

/// Parse a backup document.
///
/// Rows are lenient: bad fields fall back to defaults. A document that is
/// empty, not CSV, or has no sections fails as a whole. The returned theme
/// list is already reconciled against the words.
pub fn decode(content: &str) -> Result<Backup, ImportError> {
    if content.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut backup = Backup::default();
    let mut declared_themes: Vec<String> = Vec::new();
    let mut current: Option<Section> = None;
    let mut seen_marker = false;
    let mut expect_header = false;

    for result in reader.records() {
        let record = result?;
        if let Some(name) = marker_name(&record) {
            seen_marker = true;
            current = Section::parse(name);
            expect_header = true;
            if current.is_none() {
                debug!(section = name, "skipping unknown backup section");
            }
            continue;
        }
        if expect_header {
            expect_header = false;
            continue;
        }
        if is_blank(&record) {
            continue;
        }
        match current {
            Some(Section::Profile) => backup.profile = parse_profile(&record),
            Some(Section::Words) => backup.words.push(parse_word(&record)),
            Some(Section::Stats) => backup.stats.push(parse_stat(&record)),
            Some(Section::Themes) => {
                if let Some(raw) = record.get(0) {
                    declared_themes.extend(ThemesColumn::parse(raw).into_themes());
                }
            }
            None => {}
        }
    }

    if !seen_marker {
        return Err(ImportError::Malformed("no backup sections found".to_string()));
    }

    backup.themes = reconcile_themes(&declared_themes, &backup.words);
    info!(
        words = backup.words.len(),
        stats = backup.stats.len(),
        themes = backup.themes.len(),
        "decoded backup"
    );
    Ok(backup)
}

/// Marker rows may carry trailing empty cells from spreadsheet re-saves.
fn marker_name(record: &StringRecord) -> Option<&str> {
    if record.iter().skip(1).any(|f| !f.trim().is_empty()) {
        return None;
    }
    record.get(0)?.strip_prefix(SECTION_PREFIX)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

fn parse_profile(record: &StringRecord) -> UserProfile {
    let xp = field(record, 0).trim().parse().unwrap_or(0);
    let level = field(record, 1)
        .trim()
        .parse()
        .unwrap_or_else(|_| calculate_level(xp));
    let mut profile = UserProfile {
        xp,
        level,
        unlocked_badges: Vec::new(),
    };
    profile.unlock(
        field(record, 2)
            .split(BADGE_SEPARATOR)
            .map(str::trim)
            .filter(|b| !b.is_empty()),
    );
    profile
}

fn parse_word(record: &StringRecord) -> WordEntry {
    let id = match field(record, 0).trim() {
        "" => Uuid::new_v4().to_string(),
        id => id.to_string(),
    };
    let theme = match field(record, 6) {
        t if t.trim().is_empty() => DEFAULT_THEME.to_string(),
        t => t.to_string(),
    };
    WordEntry {
        id,
        word: field(record, 1).to_string(),
        pronunciation: field(record, 2).to_string(),
        meaning: field(record, 3).to_string(),
        explanation: field(record, 4).to_string(),
        example: field(record, 5).to_string(),
        theme,
        added_at: parse_timestamp(field(record, 7)).unwrap_or_else(|| Utc::now().timestamp_millis()),
    }
}

fn parse_stat(record: &StringRecord) -> QuizResult {
    QuizResult {
        id: field(record, 0).to_string(),
        date: field(record, 1).to_string(),
        score: field(record, 2).trim().parse().unwrap_or(0),
        total_questions: field(record, 3).trim().parse().unwrap_or(0),
        xp_earned: field(record, 4).trim().parse().unwrap_or(0),
    }
}

pub fn format_timestamp(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => millis.to_string(),
    }
}

/// RFC 3339 or epoch milliseconds
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.timestamp_millis());
    }
    raw.parse::<i64>().ok()
}

/// Declared themes (deduplicated) plus every theme a word refers to, with
/// the default dictionary first if it was missing.
pub fn reconcile_themes(declared: &[String], words: &[WordEntry]) -> Vec<String> {
    let mut themes: Vec<String> = Vec::with_capacity(declared.len() + 1);
    let referenced = words.iter().map(|w| w.theme_or_default());
    for theme in declared.iter().map(String::as_str).chain(referenced) {
        if !themes.iter().any(|t| t == theme) {
            themes.push(theme.to_string());
        }
    }
    if !themes.iter().any(|t| t == DEFAULT_THEME) {
        themes.insert(0, DEFAULT_THEME.to_string());
    }
    themes
}

/// `<app>_backup_<YYYY-MM-DD>.csv`
pub fn backup_file_name(app_name: &str, date: NaiveDate) -> String {
    format!("{}_backup_{}.csv", app_name, date.format("%Y-%m-%d"))
}
