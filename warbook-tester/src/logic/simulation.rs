use std::hash::Hasher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;
use warbook_game::{
    BattleCommand, BattleReport, CampaignSession, Catalogs, DataLoader, EmbeddedData,
    ResourceLedger, Rules,
};

use crate::logic::policy::GameplayStrategy;

/// Immutable data every simulated campaign plays against.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalogs: Catalogs,
    pub rules: Rules,
}

impl TesterAssets {
    /// Load the bundled catalogs and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any bundled asset fails to parse.
    pub fn load_default() -> Result<Self> {
        let loader = EmbeddedData;
        let catalogs = loader
            .load_catalogs()
            .context("failed to load bundled catalogs")?;
        let rules = loader.load_rules().context("failed to load bundled rules")?;
        Ok(Self { catalogs, rules })
    }
}

/// Budget for one simulated campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationLimits {
    pub max_rounds: u32,
    pub max_battles: usize,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            max_rounds: 120,
            max_battles: 40,
        }
    }
}

impl SimulationLimits {
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// Snapshot of one resolved battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub round: u32,
    pub stage_index: usize,
    pub stage_name: String,
    pub committed_troops: u32,
    pub committed_rations: u32,
    pub officers: usize,
    pub victory: bool,
    pub own_losses: u32,
    pub enemy_losses: u32,
    pub own_weight: u64,
    pub enemy_weight: u64,
    pub draw: u64,
}

impl BattleRecord {
    fn new(round: u32, command: &BattleCommand, report: &BattleReport) -> Self {
        Self {
            round,
            stage_index: report.stage_index,
            stage_name: report.stage_name.clone(),
            committed_troops: command.troops,
            committed_rations: command.rations,
            officers: command.officers.len(),
            victory: report.outcome.victory,
            own_losses: report.outcome.own_losses,
            enemy_losses: report.outcome.enemy_losses,
            own_weight: report.outcome.own_weight,
            enemy_weight: report.outcome.enemy_weight,
            draw: report.outcome.draw,
        }
    }
}

/// How a simulated campaign stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignEnd {
    Cleared,
    /// Nothing left to study and no troops to field.
    Stranded,
    RoundLimit,
    BattleLimit,
}

impl CampaignEnd {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cleared => "cleared",
            Self::Stranded => "stranded",
            Self::RoundLimit => "round-limit",
            Self::BattleLimit => "battle-limit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub strategy: String,
    pub seed: u64,
    pub rounds: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub purchases: usize,
    pub battles: Vec<BattleRecord>,
    pub end: CampaignEnd,
    pub final_ledger: ResourceLedger,
    /// XxHash64 of the final ledger's JSON form.
    pub ledger_digest: u64,
    pub invariant_violations: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn victories(&self) -> usize {
        self.battles.iter().filter(|battle| battle.victory).count()
    }

    #[must_use]
    pub const fn cleared(&self) -> bool {
        matches!(self.end, CampaignEnd::Cleared)
    }
}

/// Play one campaign with `strategy` from a fresh ledger.
///
/// Each round studies up to the policy's question count, shops, then attacks
/// the current stage if the policy is willing. Runs until the last stage
/// falls, the player is stranded, or a limit is reached.
///
/// # Errors
///
/// Returns an error if the session rejects an action the policy produced.
pub fn simulate_campaign(
    assets: &TesterAssets,
    strategy: GameplayStrategy,
    seed: u64,
    limits: SimulationLimits,
) -> Result<SimulationSummary> {
    let mut session = CampaignSession::new(seed, assets.catalogs.clone(), assets.rules.clone());
    let mut policy = strategy.create_policy(seed);
    let stage_count = session.catalogs().stages.len();

    let mut rounds = 0;
    let mut questions_answered = 0;
    let mut correct_answers = 0;
    let mut purchases = 0;
    let mut battles = Vec::new();
    let mut invariant_violations = Vec::new();

    let end = loop {
        if rounds >= limits.max_rounds {
            break CampaignEnd::RoundLimit;
        }
        if battles.len() >= limits.max_battles {
            break CampaignEnd::BattleLimit;
        }
        rounds += 1;

        for _ in 0..policy.questions_per_round() {
            let Some(question) = session.next_question().cloned() else {
                break;
            };
            let choice = policy.pick_answer(&question);
            let result = session
                .answer(&question.id, choice)
                .with_context(|| format!("answering {}", question.id))?;
            questions_answered += 1;
            if result.is_correct {
                correct_answers += 1;
            }
        }

        purchases += policy.go_shopping(&mut session).len();

        let bank_exhausted = session
            .catalogs()
            .questions
            .progress(session.ledger())
            .remaining
            == 0;
        let Some(command) = policy.plan_attack(&session, bank_exhausted) else {
            if bank_exhausted {
                break CampaignEnd::Stranded;
            }
            continue;
        };

        let before = session.ledger().clone();
        let report = session
            .attack(&command)
            .with_context(|| format!("round {rounds} attack"))?;
        check_battle_invariants(
            &session,
            &before,
            &command,
            &report,
            stage_count,
            &mut invariant_violations,
        );
        log::debug!(
            "{} seed {seed} round {rounds}: {} victory={} losses={}",
            policy.name(),
            report.stage_name,
            report.outcome.victory,
            report.outcome.own_losses
        );
        battles.push(BattleRecord::new(rounds, &command, &report));
        if report.cleared {
            break CampaignEnd::Cleared;
        }
    };

    let final_ledger = session.into_ledger();
    let ledger_digest = ledger_digest(&final_ledger)?;
    Ok(SimulationSummary {
        strategy: strategy.label().to_string(),
        seed,
        rounds,
        questions_answered,
        correct_answers,
        purchases,
        battles,
        end,
        final_ledger,
        ledger_digest,
        invariant_violations,
    })
}

/// Stable digest of a ledger for replay comparisons.
///
/// # Errors
///
/// Returns an error if the ledger cannot be serialized.
pub fn ledger_digest(ledger: &ResourceLedger) -> Result<u64> {
    let bytes = serde_json::to_vec(ledger).context("serializing ledger")?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    Ok(hasher.finish())
}

fn check_battle_invariants(
    session: &CampaignSession,
    before: &ResourceLedger,
    command: &BattleCommand,
    report: &BattleReport,
    stage_count: usize,
    violations: &mut Vec<String>,
) {
    let after = session.ledger();
    let outcome = &report.outcome;
    let mut fail = |message: String| {
        violations.push(format!("stage {}: {message}", report.stage_index));
    };

    if outcome.own_losses > command.troops {
        fail(format!(
            "lost {} of {} committed troops",
            outcome.own_losses, command.troops
        ));
    }
    if after.troops != before.troops.saturating_sub(outcome.own_losses) {
        fail(format!(
            "troops {} -> {} after losing {}",
            before.troops, after.troops, outcome.own_losses
        ));
    }
    if after.rations != before.rations.saturating_sub(command.rations) {
        fail(format!(
            "rations {} -> {} after committing {}",
            before.rations, after.rations, command.rations
        ));
    }
    let reward = session
        .catalogs()
        .stages
        .get(report.stage_index)
        .filter(|_| outcome.victory)
        .map_or(0, |stage| stage.reward_currency);
    if after.currency != before.currency.saturating_add(reward) {
        fail(format!(
            "currency {} -> {} with reward {reward}",
            before.currency, after.currency
        ));
    }
    if after.morale_buff_active {
        fail("morale buff survived a battle".to_string());
    }
    let expected_progress = before.progress_index + u32::from(report.advanced);
    if after.progress_index != expected_progress {
        fail(format!(
            "progress {} -> {} (advanced={})",
            before.progress_index, after.progress_index, report.advanced
        ));
    }
    if usize::try_from(after.progress_index).map_or(true, |index| index >= stage_count) {
        fail(format!("progress index {} out of range", after.progress_index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> TesterAssets {
        TesterAssets::load_default().unwrap()
    }

    #[test]
    fn same_seed_replays_identically() {
        let assets = assets();
        for strategy in GameplayStrategy::ALL {
            let a = simulate_campaign(&assets, strategy, 77, SimulationLimits::default()).unwrap();
            let b = simulate_campaign(&assets, strategy, 77, SimulationLimits::default()).unwrap();
            assert_eq!(a.ledger_digest, b.ledger_digest, "{strategy}");
            assert_eq!(a.battles, b.battles, "{strategy}");
            assert_eq!(a.end, b.end);
        }
    }

    #[test]
    fn campaigns_keep_ledger_invariants() {
        let assets = assets();
        for seed in [1, 2, 3, 1337] {
            for strategy in GameplayStrategy::ALL {
                let summary =
                    simulate_campaign(&assets, strategy, seed, SimulationLimits::default())
                        .unwrap();
                assert!(
                    summary.invariant_violations.is_empty(),
                    "{strategy} seed {seed}: {:?}",
                    summary.invariant_violations
                );
                assert!(summary.correct_answers <= summary.questions_answered);
            }
        }
    }

    #[test]
    fn round_limit_stops_the_run() {
        let assets = assets();
        let limits = SimulationLimits::default().with_max_rounds(1);
        let summary = simulate_campaign(&assets, GameplayStrategy::Balanced, 5, limits).unwrap();
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.questions_answered, 4);
        assert!(matches!(
            summary.end,
            CampaignEnd::RoundLimit | CampaignEnd::Cleared
        ));
    }

    #[test]
    fn reckless_player_fights_early() {
        let assets = assets();
        let summary = simulate_campaign(
            &assets,
            GameplayStrategy::Reckless,
            11,
            SimulationLimits::default(),
        )
        .unwrap();
        assert!(!summary.battles.is_empty());
        assert_eq!(summary.victories(), summary.battles.iter().filter(|b| b.victory).count());
    }

    #[test]
    fn digest_tracks_ledger_contents() {
        let mut ledger = ResourceLedger::default();
        let empty = ledger_digest(&ledger).unwrap();
        assert_eq!(empty, ledger_digest(&ResourceLedger::default()).unwrap());
        ledger.add_troops(1);
        assert_ne!(empty, ledger_digest(&ledger).unwrap());
    }
}
