//! Tunable rules for quiz rewards and battle resolution.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_STARTING_CURRENCY, RULES_JSON};
use crate::questions::Difficulty;

/// One-time bonus granted when the combo streak reaches exactly `streak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboBonus {
    pub streak: u32,
    pub bonus: u32,
    #[serde(default)]
    pub grants_buff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRules {
    pub easy_reward: u32,
    pub medium_reward: u32,
    pub hard_reward: u32,
    #[serde(default)]
    pub combo_bonuses: Vec<ComboBonus>,
}

impl QuizRules {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            easy_reward: 10,
            medium_reward: 20,
            hard_reward: 30,
            combo_bonuses: vec![
                ComboBonus {
                    streak: 5,
                    bonus: 50,
                    grants_buff: false,
                },
                ComboBonus {
                    streak: 10,
                    bonus: 150,
                    grants_buff: true,
                },
            ],
        }
    }

    /// Base currency reward for a correctly answered question.
    #[must_use]
    pub const fn reward_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy_reward,
            Difficulty::Medium => self.medium_reward,
            Difficulty::Hard => self.hard_reward,
        }
    }

    /// Bonus for a streak that has just reached `streak`. Thresholds match by
    /// equality only, so a streak of 15 earns nothing under the default table.
    #[must_use]
    pub fn bonus_at(&self, streak: u32) -> Option<ComboBonus> {
        self.combo_bonuses
            .iter()
            .copied()
            .find(|bonus| bonus.streak == streak)
    }
}

/// Constants of the battle formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    pub defender_advantage: f64,
    pub morale_buff_multiplier: f64,
    pub loss_reduction_cap: f64,
    pub victory_loss_factor: f64,
    pub victory_loss_min: f64,
    pub victory_loss_max: f64,
    pub victory_loss_floor: u32,
    pub defeat_loss_factor: f64,
    pub defeat_loss_min: f64,
    pub defeat_loss_max: f64,
    pub defeat_loss_floor: u32,
    pub defeat_halve_factor: f64,
    pub defeat_enemy_loss_rate: f64,
}

impl CombatRules {
    #[must_use]
    pub const fn builtin() -> Self {
        Self {
            defender_advantage: 1.2,
            morale_buff_multiplier: 1.1,
            loss_reduction_cap: 0.8,
            victory_loss_factor: 0.2,
            victory_loss_min: 0.05,
            victory_loss_max: 0.3,
            victory_loss_floor: 10,
            defeat_loss_factor: 0.6,
            defeat_loss_min: 0.4,
            defeat_loss_max: 0.7,
            defeat_loss_floor: 20,
            defeat_halve_factor: 0.5,
            defeat_enemy_loss_rate: 0.1,
        }
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Default for QuizRules {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Complete rule set for a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default = "default_starting_currency")]
    pub starting_currency: u32,
    #[serde(default = "QuizRules::builtin")]
    pub quiz: QuizRules,
    #[serde(default = "CombatRules::builtin")]
    pub combat: CombatRules,
}

const fn default_starting_currency() -> u32 {
    DEFAULT_STARTING_CURRENCY
}

impl Rules {
    /// Parse rules from JSON. Missing sections fall back to the built-in values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self {
            starting_currency: DEFAULT_STARTING_CURRENCY,
            quiz: QuizRules::builtin(),
            combat: CombatRules::builtin(),
        }
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default()
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::from_json(RULES_JSON).unwrap_or_else(|err| {
            log::warn!("embedded rules failed to parse, using built-in values: {err}");
            Self::builtin()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_rules_match_builtin() {
        assert_eq!(Rules::default(), Rules::builtin());
    }

    #[test]
    fn partial_json_fills_missing_sections() {
        let rules = Rules::from_json(r#"{ "starting_currency": 500 }"#).unwrap();
        assert_eq!(rules.starting_currency, 500);
        assert_eq!(rules.quiz, QuizRules::builtin());
        assert_eq!(rules.combat, CombatRules::builtin());
    }

    #[test]
    fn rewards_follow_difficulty_tiers() {
        let quiz = QuizRules::builtin();
        assert_eq!(quiz.reward_for(Difficulty::Easy), 10);
        assert_eq!(quiz.reward_for(Difficulty::Medium), 20);
        assert_eq!(quiz.reward_for(Difficulty::Hard), 30);
    }

    #[test]
    fn combo_bonus_matches_exact_streak_only() {
        let quiz = QuizRules::builtin();
        assert_eq!(quiz.bonus_at(5).map(|b| b.bonus), Some(50));
        let ten = quiz.bonus_at(10).unwrap();
        assert_eq!(ten.bonus, 150);
        assert!(ten.grants_buff);
        assert!(quiz.bonus_at(15).is_none());
        assert!(quiz.bonus_at(20).is_none());
        assert!(quiz.bonus_at(4).is_none());
    }
}
