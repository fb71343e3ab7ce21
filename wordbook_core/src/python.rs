//! Python bindings

use std::path::PathBuf;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::NotebookConfig;
use crate::error::{LookupError, NotebookError, QuizError};
use crate::logging::init_tracing;
use crate::lookup::parse_lookup_payload;
use crate::model::LookupData;
use crate::notebook::Notebook;
use crate::progress::Notification;
use crate::quiz::{Advance, Question, QuizSession, QuizStep};
use crate::storage::SqliteStore;

fn notebook_err(err: NotebookError) -> PyErr {
    match err {
        NotebookError::Validation(e) => PyValueError::new_err(e.to_string()),
        NotebookError::Import(e) => PyValueError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn quiz_err(err: QuizError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn notices(list: Vec<Notification>) -> Vec<(String, u64)> {
    list.into_iter()
        .map(|n| (n.message, n.delay.as_millis() as u64))
        .collect()
}

/// Quiz question as seen from Python
#[pyclass(name = "Question")]
#[derive(Debug, Clone)]
pub struct PyQuestion {
    #[pyo3(get)]
    pub question_type: String,
    #[pyo3(get)]
    pub question_text: String,
    #[pyo3(get)]
    pub options: Vec<String>,
    #[pyo3(get)]
    pub correct_answer: String,
    #[pyo3(get)]
    pub word_id: String,
}

#[pymethods]
impl PyQuestion {
    fn __repr__(&self) -> String {
        format!(
            "Question(type='{}', question='{}...')",
            self.question_type,
            &self.question_text.chars().take(40).collect::<String>()
        )
    }
}

impl From<&Question> for PyQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question_type: q.kind.as_str().to_string(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer.clone(),
            word_id: q.word.id.clone(),
        }
    }
}

/// Notebook plus the quiz in progress
#[pyclass(unsendable, name = "Wordbook")]
pub struct PyWordbook {
    notebook: Notebook<SqliteStore>,
    quiz: QuizSession,
    rng: StdRng,
}

#[pymethods]
impl PyWordbook {
    #[new]
    #[pyo3(signature = (db_path=None, seed=None))]
    fn new(db_path: Option<&str>, seed: Option<u64>) -> PyResult<Self> {
        let config = NotebookConfig::from_env();
        let path = db_path.map(PathBuf::from).or_else(|| config.db_path.clone());
        let store = match path {
            Some(path) => SqliteStore::open(path),
            None => SqliteStore::open_in_memory(),
        }
        .map_err(|e| notebook_err(e.into()))?;
        let notebook = Notebook::open(store, config).map_err(notebook_err)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            notebook,
            quiz: QuizSession::new(),
            rng,
        })
    }

    fn words_json(&self) -> PyResult<String> {
        serde_json::to_string(self.notebook.words()).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn themes(&self) -> Vec<String> {
        self.notebook.themes().to_vec()
    }

    fn theme_counts(&self) -> Vec<(String, usize)> {
        self.notebook
            .theme_counts()
            .into_iter()
            .map(|t| (t.name, t.word_count))
            .collect()
    }

    /// `lookup(word, theme)` must return the provider's JSON text.
    fn learn_word(&mut self, py: Python<'_>, word: &str, theme: &str, lookup: PyObject) -> PyResult<Vec<(String, u64)>> {
        let provider = |w: &str, t: &str| -> Result<LookupData, LookupError> {
            let text: String = lookup
                .call1(py, (w, t))
                .and_then(|reply| reply.extract(py))
                .map_err(|e| LookupError::Provider(e.to_string()))?;
            parse_lookup_payload(&text)
        };
        self.notebook
            .learn_word(&provider, word, theme)
            .map_err(notebook_err)?;
        Ok(notices(self.notebook.drain_notifications()))
    }

    fn add_theme(&mut self, name: &str) -> PyResult<()> {
        self.notebook.add_theme(name).map_err(notebook_err)
    }

    fn rename_theme(&mut self, old_name: &str, new_name: &str) -> PyResult<usize> {
        self.notebook.rename_theme(old_name, new_name).map_err(notebook_err)
    }

    fn delete_theme(&mut self, name: &str) -> PyResult<usize> {
        self.notebook.delete_theme(name).map_err(notebook_err)
    }

    /// `(xp, level, badges)`
    fn profile(&self) -> (u32, u32, Vec<String>) {
        let p = self.notebook.profile();
        (p.xp, p.level, p.unlocked_badges.clone())
    }

    /// `(xp, next level xp, percent)`
    fn level_progress(&self) -> (u32, u32, f64) {
        let p = self.notebook.level_progress();
        (p.xp, p.next_level_xp, p.percent)
    }

    fn export_backup(&self) -> PyResult<String> {
        self.notebook.export_backup().map_err(notebook_err)
    }

    fn backup_file_name(&self) -> String {
        self.notebook.backup_file_name()
    }

    /// `(words, stats, themes)` imported
    fn import_backup(&mut self, content: &str) -> PyResult<(usize, usize, usize)> {
        let summary = self.notebook.import_backup(content).map_err(notebook_err)?;
        self.quiz = QuizSession::new();
        Ok((summary.words, summary.stats, summary.themes))
    }

    #[pyo3(signature = (themes=None))]
    fn start_quiz(&mut self, themes: Option<Vec<String>>) -> PyResult<usize> {
        if self.quiz.step() != QuizStep::Setup {
            self.quiz.reconfigure().map_err(quiz_err)?;
        }
        if let Some(themes) = themes {
            self.quiz.select_themes(themes);
        }
        self.quiz
            .start(self.notebook.words(), &mut self.rng)
            .map_err(quiz_err)?;
        Ok(self.quiz.questions().len())
    }

    fn current_question(&self) -> Option<PyQuestion> {
        self.quiz.current_question().map(PyQuestion::from)
    }

    fn answer_option(&mut self, index: usize) -> PyResult<bool> {
        let outcome = self.quiz.answer_option(index).map_err(quiz_err)?;
        Ok(outcome.is_correct)
    }

    /// `(is_correct, feedback)`
    fn answer_typed(&mut self, text: &str) -> PyResult<(bool, String)> {
        let outcome = self.quiz.answer_typed(text).map_err(quiz_err)?;
        let feedback = outcome.typed.map(|t| t.feedback).unwrap_or_default();
        Ok((outcome.is_correct, feedback))
    }

    /// Returns the XP earned once the last question is passed.
    fn next_question(&mut self) -> PyResult<Option<u32>> {
        match self.quiz.advance().map_err(quiz_err)? {
            Advance::Next(_) => Ok(None),
            Advance::Finished(result) => {
                let xp = result.xp_earned;
                self.notebook.finish_quiz(result).map_err(notebook_err)?;
                Ok(Some(xp))
            }
        }
    }

    fn drain_notifications(&mut self) -> Vec<(String, u64)> {
        notices(self.notebook.drain_notifications())
    }
}

#[pyfunction]
#[pyo3(name = "init_logging", signature = (level=None))]
pub fn py_init_logging(level: Option<&str>) -> bool {
    let level = level
        .map(str::to_string)
        .unwrap_or_else(|| NotebookConfig::from_env().log_level);
    init_tracing(&level)
}

/// Wordbook Core Python Module
#[pymodule]
fn wordbook_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_init_logging, m)?)?;
    m.add_class::<PyWordbook>()?;
    m.add_class::<PyQuestion>()?;
    Ok(())
}
