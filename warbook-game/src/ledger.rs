//! Mutable economic state of a campaign.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::DEFAULT_STARTING_CURRENCY;

/// Resources, quiz history and progression owned by one player session.
///
/// All counters are unsigned; subtractions either go through a guarded
/// operation that refuses to overdraw or saturate at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    #[serde(default)]
    pub currency: u32,
    #[serde(default)]
    pub troops: u32,
    #[serde(default)]
    pub rations: u32,
    #[serde(default)]
    pub combo_streak: u32,
    #[serde(default)]
    pub morale_buff_active: bool,
    #[serde(default)]
    pub progress_index: u32,
    #[serde(default)]
    pub solved_question_ids: BTreeSet<String>,
    #[serde(default)]
    pub missed_question_counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub owned_officer_ids: BTreeSet<String>,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::with_starting_currency(DEFAULT_STARTING_CURRENCY)
    }
}

impl ResourceLedger {
    /// Fresh ledger holding `currency` and nothing else.
    #[must_use]
    pub const fn with_starting_currency(currency: u32) -> Self {
        Self {
            currency,
            troops: 0,
            rations: 0,
            combo_streak: 0,
            morale_buff_active: false,
            progress_index: 0,
            solved_question_ids: BTreeSet::new(),
            missed_question_counts: BTreeMap::new(),
            owned_officer_ids: BTreeSet::new(),
        }
    }

    // Economy -------------------------------------------------------------

    pub fn add_currency(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Spend `amount` if the balance covers it. Leaves the ledger untouched
    /// and returns `false` otherwise.
    pub fn spend_currency(&mut self, amount: u32) -> bool {
        if self.currency < amount {
            return false;
        }
        self.currency -= amount;
        true
    }

    pub fn add_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_add(amount);
    }

    pub fn add_rations(&mut self, amount: u32) {
        self.rations = self.rations.saturating_add(amount);
    }

    /// Guarded ration consumption; same contract as [`Self::spend_currency`].
    pub fn consume_rations(&mut self, amount: u32) -> bool {
        if self.rations < amount {
            return false;
        }
        self.rations -= amount;
        true
    }

    /// Remove casualties, flooring at zero.
    pub fn lose_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_sub(amount);
    }

    /// Remove rations spent on a campaign, flooring at zero.
    pub fn drain_rations(&mut self, amount: u32) {
        self.rations = self.rations.saturating_sub(amount);
    }

    // Combo and morale ----------------------------------------------------

    pub fn increase_combo(&mut self) {
        self.combo_streak = self.combo_streak.saturating_add(1);
    }

    pub fn reset_combo(&mut self) {
        self.combo_streak = 0;
    }

    pub fn activate_morale_buff(&mut self) {
        self.morale_buff_active = true;
    }

    pub fn clear_morale_buff(&mut self) {
        self.morale_buff_active = false;
    }

    // Question history ----------------------------------------------------

    /// Record a correct answer. The question leaves the missed table.
    pub fn mark_solved(&mut self, question_id: &str) {
        self.missed_question_counts.remove(question_id);
        self.solved_question_ids.insert(question_id.to_string());
    }

    /// Record a wrong answer unless the question was already solved.
    pub fn mark_missed(&mut self, question_id: &str) {
        if self.solved_question_ids.contains(question_id) {
            return;
        }
        let count = self
            .missed_question_counts
            .entry(question_id.to_string())
            .or_insert(0);
        *count = count.saturating_add(1);
    }

    #[must_use]
    pub fn is_solved(&self, question_id: &str) -> bool {
        self.solved_question_ids.contains(question_id)
    }

    #[must_use]
    pub fn miss_count(&self, question_id: &str) -> u32 {
        self.missed_question_counts
            .get(question_id)
            .copied()
            .unwrap_or(0)
    }

    // Officers ------------------------------------------------------------

    pub fn own_officer(&mut self, officer_id: &str) {
        self.owned_officer_ids.insert(officer_id.to_string());
    }

    #[must_use]
    pub fn has_officer(&self, officer_id: &str) -> bool {
        self.owned_officer_ids.contains(officer_id)
    }

    // Progression ---------------------------------------------------------

    /// Move to the next stage unless the current one is the last of
    /// `stage_count`. Returns whether the index moved.
    pub fn advance_progress(&mut self, stage_count: usize) -> bool {
        let next = self.progress_index.saturating_add(1);
        let in_range = usize::try_from(next).is_ok_and(|next| next < stage_count);
        if in_range {
            self.progress_index = next;
        }
        in_range
    }

    /// Wipe all progress back to a fresh ledger with the default starting
    /// currency.
    pub fn reset_all(&mut self) {
        self.reset_all_with(DEFAULT_STARTING_CURRENCY);
    }

    /// Wipe all progress, seeding currency with `starting_currency`.
    pub fn reset_all_with(&mut self, starting_currency: u32) {
        *self = Self::with_starting_currency(starting_currency);
    }
}
