//! Property tests for levels and the backup codec

use proptest::prelude::*;

use wordbook_core::{
    calculate_level, decode, encode, Backup, QuizResult, UserProfile, WordEntry, LEVELS,
};

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,\"\n|:.-]{0,16}"
}

fn arb_word() -> impl Strategy<Value = WordEntry> {
    (
        "[a-z0-9]{1,8}",
        arb_text(),
        arb_text(),
        arb_text(),
        arb_text(),
        arb_text(),
        "[A-Za-z][A-Za-z ,\"]{0,8}",
        0i64..4_000_000_000_000,
    )
        .prop_map(
            |(id, word, pronunciation, meaning, explanation, example, theme, added_at)| WordEntry {
                id,
                word,
                pronunciation,
                meaning,
                explanation,
                example,
                theme,
                added_at,
            },
        )
}

fn arb_result() -> impl Strategy<Value = QuizResult> {
    ("[a-z0-9]{1,8}", arb_text(), 0u32..=10, 1u32..=10, 0u32..200).prop_map(
        |(id, date, score, total_questions, xp_earned)| QuizResult {
            id,
            date,
            score,
            total_questions,
            xp_earned,
        },
    )
}

fn arb_backup() -> impl Strategy<Value = Backup> {
    (
        0u32..10_000,
        proptest::collection::btree_set("[a-z_]{1,12}", 0..5),
        proptest::collection::vec(arb_word(), 0..6),
        proptest::collection::vec(arb_result(), 0..4),
        proptest::collection::vec("[A-Za-z][A-Za-z ,\"|]{0,8}", 0..4),
    )
        .prop_map(|(xp, badges, words, stats, themes)| Backup {
            profile: UserProfile {
                xp,
                level: calculate_level(xp),
                unlocked_badges: badges.into_iter().collect(),
            },
            words,
            stats,
            themes,
        })
}

proptest! {
    #[test]
    fn level_never_decreases(a in 0u32..20_000, b in 0u32..20_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calculate_level(low) <= calculate_level(high));
    }

    #[test]
    fn level_is_exact_around_thresholds(index in 1usize..LEVELS.len()) {
        let (level, threshold) = LEVELS[index];
        prop_assert_eq!(calculate_level(threshold), level);
        prop_assert_eq!(calculate_level(threshold - 1), level - 1);
    }

    #[test]
    fn backup_round_trip(backup in arb_backup()) {
        let text = encode(&backup).unwrap();
        let decoded = decode(&text).unwrap();

        prop_assert_eq!(&decoded.profile, &backup.profile);
        prop_assert_eq!(&decoded.words, &backup.words);
        prop_assert_eq!(&decoded.stats, &backup.stats);
        for theme in &backup.themes {
            prop_assert!(decoded.themes.contains(theme));
        }
        for word in &backup.words {
            prop_assert!(decoded.themes.contains(&word.theme));
        }
        prop_assert!(decoded.themes.iter().any(|t| t == "Chung"));
    }
}
