//! Progression - XP levels, badges and learner statistics

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use tracing::info;

use crate::model::{QuizResult, UserProfile, WordEntry};

/// `(level, xp threshold)`, ascending
pub const LEVELS: [(u32, u32); 10] = [
    (1, 0),
    (2, 100),
    (3, 300),
    (4, 600),
    (5, 1000),
    (6, 1500),
    (7, 2200),
    (8, 3000),
    (9, 4000),
    (10, 5500),
];

pub const WORD_XP: u32 = 10;

/// Counts the badge conditions are evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    pub word_count: usize,
    pub quiz_count: usize,
    pub perfect_score_count: usize,
}

impl ActivityStats {
    pub fn collect(words: &[WordEntry], stats: &[QuizResult]) -> Self {
        Self {
            word_count: words.len(),
            quiz_count: stats.len(),
            perfect_score_count: stats.iter().filter(|s| s.is_perfect()).count(),
        }
    }
}

/// Static achievement definition
#[derive(Debug, Clone, Copy)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: fn(&ActivityStats) -> bool,
}

pub static BADGES: [Badge; 5] = [
    Badge {
        id: "novice_scholar",
        name: "Novice Scholar",
        description: "Learn 5 new words",
        icon: "🌱",
        condition: |s: &ActivityStats| s.word_count >= 5,
    },
    Badge {
        id: "vocabulary_collector",
        name: "Vocabulary Collector",
        description: "Learn 20 new words",
        icon: "📚",
        condition: |s: &ActivityStats| s.word_count >= 20,
    },
    Badge {
        id: "quiz_starter",
        name: "Quiz Starter",
        description: "Finish 3 quizzes",
        icon: "🎯",
        condition: |s: &ActivityStats| s.quiz_count >= 3,
    },
    Badge {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Get a perfect score in a quiz",
        icon: "⭐",
        condition: |s: &ActivityStats| s.perfect_score_count >= 1,
    },
    Badge {
        id: "word_master",
        name: "Word Master",
        description: "Learn 50 new words",
        icon: "👑",
        condition: |s: &ActivityStats| s.word_count >= 50,
    },
];

pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// Highest level whose threshold is reached
pub fn calculate_level(xp: u32) -> u32 {
    let mut level = 1;
    for &(lvl, threshold) in LEVELS.iter() {
        if xp >= threshold {
            level = lvl;
        } else {
            break;
        }
    }
    level
}

/// Threshold of the next level; past the table, 1.5x the top threshold.
pub fn next_level_xp(level: u32) -> u32 {
    LEVELS
        .iter()
        .find(|&&(lvl, _)| lvl == level.saturating_add(1))
        .map(|&(_, xp)| xp)
        .unwrap_or_else(|| {
            let (_, top) = LEVELS[LEVELS.len() - 1];
            top * 3 / 2
        })
}

/// Badge ids newly qualified for, in catalog order
pub fn check_new_badges(
    profile: &UserProfile,
    words: &[WordEntry],
    stats: &[QuizResult],
) -> Vec<&'static str> {
    let activity = ActivityStats::collect(words, stats);
    BADGES
        .iter()
        .filter(|badge| !profile.has_badge(badge.id))
        .filter(|badge| (badge.condition)(&activity))
        .map(|badge| badge.id)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    LevelUp { level: u32 },
    BadgesUnlocked { ids: Vec<String> },
}

/// Message for the learner; `delay` is how long to wait before showing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub delay: Duration,
}

/// Outcome of one XP-earning event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub profile: UserProfile,
    pub level_up: Option<u32>,
    pub new_badges: Vec<&'static str>,
    pub notifications: Vec<Notification>,
}

/// Add `xp_gain` and re-evaluate level and badges against the post-event
/// snapshot of words and stats.
pub fn apply_xp(
    profile: &UserProfile,
    xp_gain: u32,
    words: &[WordEntry],
    stats: &[QuizResult],
    badge_delay: Duration,
) -> ProgressUpdate {
    let mut next = profile.clone();
    next.xp = next.xp.saturating_add(xp_gain);
    let mut notifications = Vec::new();

    let level = calculate_level(next.xp);
    let level_up = (level > profile.level).then_some(level);
    next.level = level;
    if let Some(level) = level_up {
        info!(level, xp = next.xp, "level up");
        notifications.push(Notification {
            kind: NotificationKind::LevelUp { level },
            message: format!("🎉 Congratulations! You reached level {level}!"),
            delay: Duration::ZERO,
        });
    }

    let new_badges = check_new_badges(&next, words, stats);
    if !new_badges.is_empty() {
        next.unlock(new_badges.iter().copied());
        let names: Vec<&str> = new_badges
            .iter()
            .filter_map(|id| find_badge(id).map(|b| b.name))
            .collect();
        info!(badges = ?new_badges, "badges unlocked");
        notifications.push(Notification {
            kind: NotificationKind::BadgesUnlocked {
                ids: new_badges.iter().map(|id| id.to_string()).collect(),
            },
            message: format!("🏆 New badge: {}", names.join(", ")),
            delay: badge_delay,
        });
    }

    ProgressUpdate {
        profile: next,
        level_up,
        new_badges,
        notifications,
    }
}

/// XP toward the next level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub xp: u32,
    pub next_level_xp: u32,
    pub percent: f64,
}

pub fn level_progress(profile: &UserProfile) -> LevelProgress {
    let next = next_level_xp(profile.level);
    let percent = if next == 0 {
        100.0
    } else {
        (f64::from(profile.xp) / f64::from(next) * 100.0).min(100.0)
    };
    LevelProgress {
        xp: profile.xp,
        next_level_xp: next,
        percent,
    }
}

/// Average quiz score (out of 10) for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyScore {
    pub day: NaiveDate,
    pub average: f64,
}

/// Per-day averages of the most recent 7 days with quizzes.
/// Results with an unparseable date or zero questions are skipped.
pub fn daily_averages(stats: &[QuizResult]) -> Vec<DailyScore> {
    let mut groups: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for result in stats.iter().filter(|s| s.total_questions > 0) {
        let Ok(date) = DateTime::parse_from_rfc3339(&result.date) else {
            continue;
        };
        let entry = groups.entry(date.date_naive()).or_insert((0.0, 0));
        entry.0 += f64::from(result.score) / f64::from(result.total_questions) * 10.0;
        entry.1 += 1;
    }
    let days: Vec<DailyScore> = groups
        .into_iter()
        .map(|(day, (total, count))| DailyScore {
            day,
            average: (total / f64::from(count) * 10.0).round() / 10.0,
        })
        .collect();
    let skip = days.len().saturating_sub(7);
    days.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::tests::entry;

    fn result(score: u32, total: u32) -> QuizResult {
        QuizResult {
            id: format!("q{score}-{total}"),
            date: "2026-10-16T10:00:00.000Z".into(),
            score,
            total_questions: total,
            xp_earned: 0,
        }
    }

    fn words(n: usize) -> Vec<WordEntry> {
        (0..n).map(|i| entry(&i.to_string(), "w", "Chung")).collect()
    }

    #[test]
    fn level_matches_table_at_thresholds() {
        for &(level, threshold) in LEVELS.iter() {
            assert_eq!(calculate_level(threshold), level);
        }
        assert_eq!(calculate_level(999), 4);
        assert_eq!(calculate_level(1000), 5);
        assert_eq!(calculate_level(u32::MAX), 10);
    }

    #[test]
    fn next_level_extrapolates_past_table() {
        assert_eq!(next_level_xp(1), 100);
        assert_eq!(next_level_xp(9), 5500);
        assert_eq!(next_level_xp(10), 8250);
        assert_eq!(next_level_xp(u32::MAX), 8250);
    }

    #[test]
    fn badges_come_in_catalog_order_and_skip_owned() {
        let mut profile = UserProfile::default();
        let stats = vec![result(10, 10), result(3, 10), result(5, 10)];
        let found = check_new_badges(&profile, &words(20), &stats);
        assert_eq!(
            found,
            vec!["novice_scholar", "vocabulary_collector", "quiz_starter", "perfectionist"]
        );

        profile.unlock(["novice_scholar", "perfectionist"]);
        let found = check_new_badges(&profile, &words(50), &stats);
        assert_eq!(found, vec!["vocabulary_collector", "quiz_starter", "word_master"]);
    }

    #[test]
    fn crossing_a_threshold_levels_up() {
        let profile = UserProfile {
            xp: 90,
            level: 1,
            unlocked_badges: Vec::new(),
        };
        let update = apply_xp(&profile, 15, &[], &[], Duration::from_millis(500));
        assert_eq!(update.profile.xp, 105);
        assert_eq!(update.profile.level, 2);
        assert_eq!(update.level_up, Some(2));
        assert!(update.new_badges.is_empty());
        assert_eq!(update.notifications.len(), 1);
    }

    #[test]
    fn badge_notice_follows_level_up_after_delay() {
        let profile = UserProfile {
            xp: 95,
            level: 1,
            unlocked_badges: Vec::new(),
        };
        let delay = Duration::from_millis(500);
        let update = apply_xp(&profile, WORD_XP, &words(5), &[], delay);
        assert_eq!(update.new_badges, vec!["novice_scholar"]);
        assert!(update.profile.has_badge("novice_scholar"));
        assert_eq!(update.notifications[0].kind, NotificationKind::LevelUp { level: 2 });
        assert_eq!(update.notifications[1].delay, delay);
        assert!(update.notifications[1].message.contains("Novice Scholar"));
    }

    #[test]
    fn stale_cached_level_is_recomputed() {
        let profile = UserProfile {
            xp: 400,
            level: 1,
            unlocked_badges: Vec::new(),
        };
        let update = apply_xp(&profile, 0, &[], &[], Duration::ZERO);
        assert_eq!(update.profile.level, 3);
    }

    #[test]
    fn progress_is_capped() {
        let profile = UserProfile {
            xp: 9000,
            level: 10,
            unlocked_badges: Vec::new(),
        };
        let progress = level_progress(&profile);
        assert_eq!(progress.next_level_xp, 8250);
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn daily_averages_group_by_day() {
        let mut a = result(10, 10);
        a.date = "2026-10-15T08:00:00Z".into();
        let mut b = result(5, 10);
        b.date = "2026-10-15T20:00:00Z".into();
        let mut c = result(2, 4);
        c.date = "2026-10-16T08:00:00Z".into();
        let mut broken = result(1, 1);
        broken.date = "yesterday".into();

        let days = daily_averages(&[a, b, c, broken]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].average, 7.5);
        assert_eq!(days[1].average, 5.0);
    }
}
