//! Question records and the bank they are drawn from.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::QUESTIONS_JSON;
use crate::ledger::ResourceLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Default currency reward for the tier. Campaigns read the tier reward
    /// from [`crate::config::QuizRules`], which defaults to these values.
    #[must_use]
    pub const fn reward(self) -> u32 {
        match self {
            Self::Easy => 10,
            Self::Medium => 20,
            Self::Hard => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub choices: Vec<String>,
    /// Index of the correct entry in `choices`.
    pub answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Exam year the question was taken from, when known.
    #[serde(default)]
    pub year: Option<u32>,
}

impl Question {
    fn matches(&self, subject: Option<&str>, year: Option<u32>) -> bool {
        subject.is_none_or(|subject| self.subject == subject)
            && year.is_none_or(|year| self.year == Some(year))
    }
}

/// Counts of where the player stands against a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BankProgress {
    pub total: usize,
    pub solved: usize,
    pub missed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

impl QuestionBank {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    /// Load questions from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into question data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Sample bank bundled with the engine.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(QUESTIONS_JSON).unwrap_or_else(|err| {
            log::warn!("embedded question bank failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions matching every given criterion, in bank order. `None`
    /// leaves that criterion open.
    #[must_use]
    pub fn filter(&self, subject: Option<&str>, year: Option<u32>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.matches(subject, year))
            .collect()
    }

    /// Draw up to `count` distinct questions from the filtered pool.
    pub fn random<R: Rng + ?Sized>(
        &self,
        count: usize,
        subject: Option<&str>,
        year: Option<u32>,
        rng: &mut R,
    ) -> Vec<&Question> {
        self.filter(subject, year)
            .choose_multiple(rng, count)
            .copied()
            .collect()
    }

    #[must_use]
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.questions.iter().map(|q| q.subject.as_str()).collect()
    }

    /// Questions the ledger has not solved yet.
    #[must_use]
    pub fn unsolved(&self, ledger: &ResourceLedger) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| !ledger.is_solved(&q.id))
            .collect()
    }

    /// Uniform pick among unsolved questions. Solved questions are never
    /// asked again; `None` once the bank is cleared or empty.
    pub fn pick_next<R: Rng + ?Sized>(
        &self,
        ledger: &ResourceLedger,
        rng: &mut R,
    ) -> Option<&Question> {
        self.unsolved(ledger).choose(rng).copied()
    }

    /// Review list: unsolved questions the player has missed, with their
    /// miss counts. Most-missed first; ties keep bank order.
    #[must_use]
    pub fn missed(&self, ledger: &ResourceLedger) -> Vec<(&Question, u32)> {
        let mut pairs: Vec<(&Question, u32)> = self
            .questions
            .iter()
            .filter(|q| !ledger.is_solved(&q.id))
            .filter_map(|q| match ledger.miss_count(&q.id) {
                0 => None,
                count => Some((q, count)),
            })
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }

    #[must_use]
    pub fn progress(&self, ledger: &ResourceLedger) -> BankProgress {
        let total = self.questions.len();
        let solved = self
            .questions
            .iter()
            .filter(|q| ledger.is_solved(&q.id))
            .count();
        let missed = self
            .questions
            .iter()
            .filter(|q| ledger.miss_count(&q.id) > 0)
            .count();
        BankProgress {
            total,
            solved,
            missed,
            remaining: total - solved,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
