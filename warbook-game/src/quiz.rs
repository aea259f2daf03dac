//! Quiz answer resolution: rewards, combo streak and the morale buff.
use serde::{Deserialize, Serialize};

use crate::config::QuizRules;
use crate::ledger::ResourceLedger;
use crate::questions::Question;

/// What a single answer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub is_correct: bool,
    pub base_reward: u32,
    pub bonus_reward: u32,
    pub total_reward: u32,
    /// Combo streak after this answer.
    pub combo_streak: u32,
    /// The answer switched the morale buff on.
    pub triggered_buff: bool,
}

/// Resolve `chosen_index` against `question` and apply the result to the
/// ledger. A correct answer pays the tier reward plus any combo bonus for the
/// streak it reaches and marks the question solved; a wrong answer resets the
/// streak and records a miss.
pub fn resolve_answer(
    question: &Question,
    chosen_index: usize,
    ledger: &mut ResourceLedger,
    rules: &QuizRules,
) -> AnswerResult {
    let is_correct = chosen_index == question.answer;
    let mut base_reward = 0;
    let mut bonus_reward = 0;
    let mut triggered_buff = false;

    if is_correct {
        base_reward = rules.reward_for(question.difficulty);
        ledger.increase_combo();

        if let Some(bonus) = rules.bonus_at(ledger.combo_streak) {
            bonus_reward = bonus.bonus;
            if bonus.grants_buff {
                ledger.activate_morale_buff();
                triggered_buff = true;
            }
        }

        ledger.add_currency(base_reward.saturating_add(bonus_reward));
        ledger.mark_solved(&question.id);
    } else {
        ledger.reset_combo();
        ledger.mark_missed(&question.id);
    }

    let result = AnswerResult {
        is_correct,
        base_reward,
        bonus_reward,
        total_reward: base_reward.saturating_add(bonus_reward),
        combo_streak: ledger.combo_streak,
        triggered_buff,
    };
    log::debug!(
        "answer {} correct={} reward={} combo={}",
        question.id,
        result.is_correct,
        result.total_reward,
        result.combo_streak
    );
    result
}
