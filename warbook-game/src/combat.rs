//! Battle resolution: officer aggregation, supply penalty, weighted lottery
//! and casualties.
use rand::Rng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::config::CombatRules;
use crate::ledger::ResourceLedger;
use crate::numbers::{non_negative, round_to_u32, round_to_u64};
use crate::officers::Officer;
use crate::stages::Stage;

/// Source of the victory draw.
pub trait BattleDraw {
    /// Uniform integer in `1..=total_weight`. Callers guarantee
    /// `total_weight >= 1`.
    fn draw(&mut self, total_weight: u64) -> u64;
}

impl BattleDraw for ChaCha20Rng {
    fn draw(&mut self, total_weight: u64) -> u64 {
        self.gen_range(1..=total_weight.max(1))
    }
}

impl BattleDraw for SmallRng {
    fn draw(&mut self, total_weight: u64) -> u64 {
        self.gen_range(1..=total_weight.max(1))
    }
}

/// Always draws the same ticket, clamped into range. Pins the lottery for
/// replays and tests: `FixedDraw(1)` wins whenever own weight is non-zero,
/// `FixedDraw(u64::MAX)` loses whenever enemy weight is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDraw(pub u64);

impl BattleDraw for FixedDraw {
    fn draw(&mut self, total_weight: u64) -> u64 {
        self.0.clamp(1, total_weight.max(1))
    }
}

/// Combined effect of the officers fielded in one battle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficerModifiers {
    pub attack_bonus: f64,
    pub enemy_morale_multiplier: f64,
    pub loss_reduction: f64,
    pub defeat_loss_halve: bool,
}

impl Default for OfficerModifiers {
    fn default() -> Self {
        Self {
            attack_bonus: 0.0,
            enemy_morale_multiplier: 1.0,
            loss_reduction: 0.0,
            defeat_loss_halve: false,
        }
    }
}

impl OfficerModifiers {
    /// Sum attack bonuses, multiply enemy morale, sum loss reduction up to
    /// `loss_reduction_cap`. Order of officers does not matter.
    #[must_use]
    pub fn aggregate(officers: &[&Officer], loss_reduction_cap: f64) -> Self {
        let base = Self::default();
        let mut mods = officers.iter().fold(base, |mut acc, officer| {
            acc.attack_bonus += officer.attack_bonus;
            acc.enemy_morale_multiplier *= officer.enemy_morale_multiplier;
            acc.loss_reduction += officer.loss_reduction;
            acc.defeat_loss_halve |= officer.defeat_loss_halve;
            acc
        });
        mods.loss_reduction = mods.loss_reduction.min(loss_reduction_cap);
        mods
    }
}

/// Troops that actually fight after the supply penalty. Fully supplied
/// armies fight at full strength; each missing ration costs two soldiers.
#[must_use]
pub fn effective_troops(committed_troops: u32, committed_rations: u32) -> u32 {
    if committed_rations >= committed_troops {
        return committed_troops;
    }
    let supplied = u64::from(committed_rations) * 2;
    let effective = supplied.saturating_sub(u64::from(committed_troops));
    u32::try_from(effective).unwrap_or(u32::MAX)
}

/// Result of one battle, produced fresh and not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub victory: bool,
    pub own_losses: u32,
    pub enemy_losses: u32,
    /// Own-power multiplier from the morale buff (1.0 when inactive).
    pub morale_used: f64,
    pub notes: String,
    pub effective_troops: u32,
    pub own_power: f64,
    pub enemy_power: f64,
    pub own_weight: u64,
    pub enemy_weight: u64,
    pub draw: u64,
}

/// Fight `stage` with the committed troops, rations and officers, then apply
/// casualties, ration use and any reward to the ledger.
///
/// Commitments are clamped at zero rather than rejected, and the officer
/// list is taken as given; the caller enforces how many may be fielded. An
/// active morale buff boosts own power for this battle and is consumed.
pub fn resolve_battle(
    stage: &Stage,
    committed_troops: i64,
    committed_rations: i64,
    officers: &[&Officer],
    ledger: &mut ResourceLedger,
    rules: &CombatRules,
    draw: &mut dyn BattleDraw,
) -> BattleOutcome {
    let mods = OfficerModifiers::aggregate(officers, rules.loss_reduction_cap);

    let commit = non_negative(committed_troops);
    let rations = non_negative(committed_rations);
    let effective = effective_troops(commit, rations);

    let morale_used = if ledger.morale_buff_active {
        ledger.clear_morale_buff();
        rules.morale_buff_multiplier
    } else {
        1.0
    };

    let own_power = f64::from(effective) * (1.0 + mods.attack_bonus) * morale_used;
    let enemy_power = f64::from(stage.enemy_troops)
        * stage.terrain_multiplier()
        * rules.defender_advantage
        * mods.enemy_morale_multiplier;

    let own_weight = round_to_u64(own_power);
    let enemy_weight = round_to_u64(enemy_power);
    let total_weight = own_weight.saturating_add(enemy_weight).max(1);
    let ticket = draw.draw(total_weight);
    let victory = ticket <= own_weight;

    let (own_losses, enemy_losses) = if victory {
        let ratio = enemy_power / own_power.max(1.0);
        let rate = (ratio * rules.victory_loss_factor)
            .clamp(rules.victory_loss_min, rules.victory_loss_max)
            * (1.0 - mods.loss_reduction);
        let losses = round_to_u32(f64::from(commit) * rate).max(rules.victory_loss_floor);
        (losses, stage.enemy_troops)
    } else {
        let ratio = own_power / enemy_power.max(1.0);
        let mut rate = ((1.0 - ratio) * rules.defeat_loss_factor)
            .clamp(rules.defeat_loss_min, rules.defeat_loss_max)
            * (1.0 - mods.loss_reduction);
        if mods.defeat_loss_halve {
            rate *= rules.defeat_halve_factor;
        }
        let losses = round_to_u32(f64::from(commit) * rate).max(rules.defeat_loss_floor);
        let enemy = round_to_u32(f64::from(stage.enemy_troops) * rules.defeat_enemy_loss_rate);
        (losses, enemy)
    };
    let own_losses = own_losses.min(commit);

    ledger.lose_troops(own_losses);
    ledger.drain_rations(rations);
    let reward = if victory { stage.reward_currency } else { 0 };
    if reward > 0 {
        ledger.add_currency(reward);
    }

    let notes = battle_notes(victory, officers, morale_used, reward);
    log::debug!(
        "battle '{}': own {own_power:.1} vs enemy {enemy_power:.1}, ticket {ticket}/{total_weight}, victory={victory}, losses {own_losses}/{enemy_losses}",
        stage.name
    );

    BattleOutcome {
        victory,
        own_losses,
        enemy_losses,
        morale_used,
        notes,
        effective_troops: effective,
        own_power,
        enemy_power,
        own_weight,
        enemy_weight,
        draw: ticket,
    }
}

fn battle_notes(victory: bool, officers: &[&Officer], morale_used: f64, reward: u32) -> String {
    let mut notes = String::from(if victory { "Victory!" } else { "Defeat..." });
    if !officers.is_empty() {
        let names: Vec<&str> = officers.iter().map(|o| o.name.as_str()).collect();
        notes.push_str(&format!(" (fielded: {})", names.join(", ")));
    }
    if morale_used > 1.0 {
        notes.push_str(&format!(" Morale x{morale_used:.2}."));
    }
    if reward > 0 {
        notes.push_str(&format!(" Earned {reward} IP."));
    }
    notes
}
