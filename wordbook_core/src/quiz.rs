//! Quiz generation and play state for vocabulary review

use chrono::{SecondsFormat, Utc};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use uuid::Uuid;

use crate::error::{QuizError, ValidationError};
use crate::fuzzy::{check_typed_answer, TypedAnswer};
use crate::model::{QuizResult, WordEntry};

/// Minimum pool size; three distractors plus the target.
pub const MIN_POOL_SIZE: usize = 4;
pub const MAX_QUESTIONS: usize = 10;
pub const DISTRACTOR_COUNT: usize = 3;
pub const XP_PER_CORRECT: u32 = 10;
pub const PERFECT_BONUS_XP: u32 = 50;
pub const BLANK: &str = "_______";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Word shown, pick its meaning
    MultipleChoice,
    /// Example with the word blanked out, pick the word
    FillBlank,
    /// Meaning shown, type the word
    Typing,
}

impl QuestionKind {
    /// Map a uniform draw in `[0, 1)` onto a question type.
    pub fn from_draw(r: f64) -> Self {
        if r > 0.66 {
            Self::Typing
        } else if r > 0.33 {
            Self::FillBlank
        } else {
            Self::MultipleChoice
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "MULTIPLE_CHOICE",
            Self::FillBlank => "FILL_BLANK",
            Self::Typing => "TYPING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: QuestionKind,
    pub word: WordEntry,
    pub question_text: String,
    /// Shuffled choices; empty for typing questions
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o == &self.correct_answer)
    }
}

/// Build up to ten questions from a shuffled copy of `pool`.
///
/// Distractors come from `pool` only, never from the target word itself.
pub fn generate_questions<R: Rng + ?Sized>(
    pool: &[WordEntry],
    rng: &mut R,
) -> Result<Vec<Question>, ValidationError> {
    if pool.len() < MIN_POOL_SIZE {
        return Err(ValidationError::InsufficientPool {
            available: pool.len(),
            required: MIN_POOL_SIZE,
        });
    }

    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(MAX_QUESTIONS.min(pool.len()));

    let questions = shuffled
        .into_iter()
        .map(|word| {
            let kind = QuestionKind::from_draw(rng.gen::<f64>());
            build_question(kind, word, pool, rng)
        })
        .collect();
    Ok(questions)
}

fn build_question<R: Rng + ?Sized>(
    kind: QuestionKind,
    word: WordEntry,
    pool: &[WordEntry],
    rng: &mut R,
) -> Question {
    match kind {
        QuestionKind::MultipleChoice => {
            let options = shuffled_options(&word, pool, rng, |w| w.meaning.clone());
            Question {
                kind,
                question_text: word.word.clone(),
                correct_answer: word.meaning.clone(),
                options,
                word,
            }
        }
        QuestionKind::FillBlank => {
            let options = shuffled_options(&word, pool, rng, |w| w.word.clone());
            Question {
                kind,
                question_text: mask_word(&word.example, &word.word, BLANK),
                correct_answer: word.word.clone(),
                options,
                word,
            }
        }
        QuestionKind::Typing => Question {
            kind,
            question_text: word.meaning.clone(),
            correct_answer: word.word.clone(),
            options: Vec::new(),
            word,
        },
    }
}

/// Three distractors sampled without replacement plus the correct answer,
/// in random order.
fn shuffled_options<R, F>(target: &WordEntry, pool: &[WordEntry], rng: &mut R, field: F) -> Vec<String>
where
    R: Rng + ?Sized,
    F: Fn(&WordEntry) -> String,
{
    let mut options: Vec<String> = pool
        .iter()
        .filter(|w| w.id != target.id)
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .into_iter()
        .map(&field)
        .collect();
    options.push(field(target));
    options.shuffle(rng);
    options
}

/// Replace every case-insensitive occurrence of `word` in `text`.
pub fn mask_word(text: &str, word: &str, placeholder: &str) -> String {
    let needle: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return text.to_string();
    }

    let mut masked = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        match match_len(rest, &needle) {
            Some(len) => {
                masked.push_str(placeholder);
                rest = &rest[len..];
            }
            None => {
                masked.push(first);
                rest = &rest[first.len_utf8()..];
            }
        }
    }
    masked
}

/// Byte length of the prefix of `haystack` equal to `needle` ignoring case.
fn match_len(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut lowered: Vec<char> = Vec::with_capacity(needle.len());
    for (i, c) in haystack.char_indices() {
        lowered.extend(c.to_lowercase());
        if !needle.starts_with(&lowered) {
            return None;
        }
        if lowered.len() == needle.len() {
            return Some(i + c.len_utf8());
        }
    }
    None
}

/// Points for a finished quiz: 10 per correct answer, +50 for a perfect run.
pub fn quiz_xp(score: u32, total_questions: u32) -> u32 {
    let bonus = if score == total_questions { PERFECT_BONUS_XP } else { 0 };
    score * XP_PER_CORRECT + bonus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Setup,
    Playing,
    Result,
}

impl QuizStep {
    fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Playing => "playing",
            Self::Result => "result",
        }
    }
}

/// How an option should be shown once the question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    Correct,
    WrongPick,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
    pub selected: Option<usize>,
    /// Only for typing questions
    pub typed: Option<TypedAnswer>,
}

/// What [`QuizSession::advance`] moved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finished(QuizResult),
}

/// One learner's quiz: SETUP -> PLAYING -> RESULT, with replay
/// (RESULT -> PLAYING) and reconfigure (PLAYING/RESULT -> SETUP).
#[derive(Debug, Clone)]
pub struct QuizSession {
    step: QuizStep,
    /// `None` until the learner changes it: every available theme
    selection: Option<Vec<String>>,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    answer: Option<AnswerOutcome>,
    result: Option<QuizResult>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            step: QuizStep::Setup,
            selection: None,
            questions: Vec::new(),
            current: 0,
            score: 0,
            answer: None,
            result: None,
        }
    }

    pub fn step(&self) -> QuizStep {
        self.step
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.step {
            QuizStep::Playing => self.questions.get(self.current),
            _ => None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn last_answer(&self) -> Option<&AnswerOutcome> {
        self.answer.as_ref()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Themes present in `words`, first-seen order, blank counted as default.
    pub fn available_themes(words: &[WordEntry]) -> Vec<String> {
        let mut themes: Vec<String> = Vec::new();
        for word in words {
            let theme = word.theme_or_default();
            if !themes.iter().any(|t| t == theme) {
                themes.push(theme.to_string());
            }
        }
        themes
    }

    /// Themes the quiz draws from; defaults to every available theme.
    pub fn effective_themes(&self, words: &[WordEntry]) -> Vec<String> {
        match &self.selection {
            Some(selected) => selected.clone(),
            None => Self::available_themes(words),
        }
    }

    pub fn select_themes(&mut self, themes: Vec<String>) {
        self.selection = Some(themes);
    }

    pub fn toggle_theme(&mut self, words: &[WordEntry], theme: &str) {
        let mut selected = self.effective_themes(words);
        if let Some(pos) = selected.iter().position(|t| t == theme) {
            selected.remove(pos);
        } else {
            selected.push(theme.to_string());
        }
        self.selection = Some(selected);
    }

    /// Select every available theme, or clear when all are selected.
    pub fn toggle_all(&mut self, words: &[WordEntry]) {
        let available = Self::available_themes(words);
        let selected = self.effective_themes(words);
        let all_selected = available.iter().all(|t| selected.contains(t));
        self.selection = Some(if all_selected { Vec::new() } else { available });
    }

    pub fn filtered_pool(&self, words: &[WordEntry]) -> Vec<WordEntry> {
        let themes = self.effective_themes(words);
        words
            .iter()
            .filter(|w| themes.iter().any(|t| t == w.theme_or_default()))
            .cloned()
            .collect()
    }

    /// Start (from SETUP) or replay (from RESULT) over the filtered pool.
    pub fn start<R: Rng + ?Sized>(&mut self, words: &[WordEntry], rng: &mut R) -> Result<(), QuizError> {
        if self.step == QuizStep::Playing {
            return Err(QuizError::InvalidTransition {
                from: self.step.name(),
                action: "start",
            });
        }
        let pool = self.filtered_pool(words);
        self.questions = generate_questions(&pool, rng)?;
        self.current = 0;
        self.score = 0;
        self.answer = None;
        self.result = None;
        self.step = QuizStep::Playing;
        Ok(())
    }

    /// Back to SETUP, dropping any quiz in progress.
    pub fn reconfigure(&mut self) -> Result<(), QuizError> {
        if self.step == QuizStep::Setup {
            return Err(QuizError::InvalidTransition {
                from: self.step.name(),
                action: "reconfigure",
            });
        }
        self.step = QuizStep::Setup;
        self.questions.clear();
        self.current = 0;
        self.score = 0;
        self.answer = None;
        self.result = None;
        Ok(())
    }

    fn open_question(&self) -> Result<&Question, QuizError> {
        if self.step != QuizStep::Playing {
            return Err(QuizError::InvalidTransition {
                from: self.step.name(),
                action: "answer",
            });
        }
        if self.answer.is_some() {
            return Err(QuizError::AlreadyAnswered);
        }
        self.questions
            .get(self.current)
            .ok_or(QuizError::InvalidTransition {
                from: self.step.name(),
                action: "answer",
            })
    }

    /// Pick an option of a multiple-choice or fill-in-the-blank question.
    pub fn answer_option(&mut self, index: usize) -> Result<AnswerOutcome, QuizError> {
        let question = self.open_question()?;
        if question.kind == QuestionKind::Typing {
            return Err(QuizError::WrongAnswerMode);
        }
        let picked = question
            .options
            .get(index)
            .ok_or(QuizError::OptionOutOfRange(index))?;
        let outcome = AnswerOutcome {
            is_correct: picked == &question.correct_answer,
            correct_answer: question.correct_answer.clone(),
            selected: Some(index),
            typed: None,
        };
        Ok(self.record(outcome))
    }

    pub fn answer_typed(&mut self, input: &str) -> Result<AnswerOutcome, QuizError> {
        let question = self.open_question()?;
        if question.kind != QuestionKind::Typing {
            return Err(QuizError::WrongAnswerMode);
        }
        let typed = check_typed_answer(input, &question.correct_answer);
        let outcome = AnswerOutcome {
            is_correct: typed.is_correct,
            correct_answer: question.correct_answer.clone(),
            selected: None,
            typed: Some(typed),
        };
        Ok(self.record(outcome))
    }

    fn record(&mut self, outcome: AnswerOutcome) -> AnswerOutcome {
        if outcome.is_correct {
            self.score += 1;
        }
        self.answer = Some(outcome.clone());
        outcome
    }

    /// Frozen option states for the current question; all neutral until
    /// it is answered.
    pub fn option_states(&self) -> Vec<OptionState> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| match &self.answer {
                None => OptionState::Neutral,
                Some(_) if option == &question.correct_answer => OptionState::Correct,
                Some(answer) if answer.selected == Some(i) => OptionState::WrongPick,
                Some(_) => OptionState::Neutral,
            })
            .collect()
    }

    /// Move past an answered question, finishing after the last one.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.step != QuizStep::Playing {
            return Err(QuizError::InvalidTransition {
                from: self.step.name(),
                action: "advance",
            });
        }
        if self.answer.is_none() {
            return Err(QuizError::NotAnswered);
        }
        self.answer = None;
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            return Ok(Advance::Next(self.current));
        }
        Ok(Advance::Finished(self.finalize()))
    }

    fn finalize(&mut self) -> QuizResult {
        let total = self.questions.len() as u32;
        let result = QuizResult {
            id: Uuid::new_v4().to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            score: self.score,
            total_questions: total,
            xp_earned: quiz_xp(self.score, total),
        };
        self.result = Some(result.clone());
        self.step = QuizStep::Result;
        result
    }
}
