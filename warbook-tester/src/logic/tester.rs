use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{
    SimulationLimits, SimulationSummary, TesterAssets, simulate_campaign,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "millis")]
    pub average_duration: Duration,
    #[serde(with = "millis::seq")]
    pub performance_data: Vec<Duration>,
}

/// One simulated campaign, flattened for csv output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub scenario: String,
    pub strategy: String,
    pub seed: u64,
    pub rounds: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub purchases: usize,
    pub battles: usize,
    pub victories: usize,
    pub final_stage: u32,
    pub end: String,
    pub currency: u32,
    pub troops: u32,
    pub rations: u32,
    pub ledger_digest: String,
}

impl CampaignRecord {
    #[must_use]
    pub fn from_summary(scenario: &str, summary: &SimulationSummary) -> Self {
        Self {
            scenario: scenario.to_string(),
            strategy: summary.strategy.clone(),
            seed: summary.seed,
            rounds: summary.rounds,
            questions_answered: summary.questions_answered,
            correct_answers: summary.correct_answers,
            purchases: summary.purchases,
            battles: summary.battles.len(),
            victories: summary.victories(),
            final_stage: summary.final_ledger.progress_index + 1,
            end: summary.end.label().to_string(),
            currency: summary.final_ledger.currency,
            troops: summary.final_ledger.troops,
            rations: summary.final_ledger.rations,
            ledger_digest: format!("{:016x}", summary.ledger_digest),
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub limits: SimulationLimits,
    /// Run every iteration twice and require identical results.
    pub replay: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            limits: SimulationLimits::default(),
            replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: SimulationLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn with_replay(mut self) -> Self {
        self.replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub plans: Vec<SimulationPlan>,
}

const SCENARIO_KEYS: [(&str, &str); 4] = [
    ("smoke", "One short balanced round with sane bookkeeping"),
    (
        "deterministic-replay",
        "Same seed twice yields the same battles and ledger digest",
    ),
    (
        "ledger-invariants",
        "Every battle of every strategy keeps the ledger consistent",
    ),
    (
        "full-campaign",
        "Cautious play runs to a clean ending within the budget",
    ),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIO_KEYS.to_vec()
}

#[must_use]
pub fn scenario_keys() -> Vec<String> {
    SCENARIO_KEYS
        .iter()
        .map(|(key, _)| (*key).to_string())
        .collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let (key, description) = SCENARIO_KEYS
        .into_iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))?;
    let (name, plans) = match key {
        "smoke" => (
            "Smoke",
            vec![
                SimulationPlan::new(GameplayStrategy::Balanced)
                    .with_limits(SimulationLimits::default().with_max_rounds(1))
                    .with_expectation(studied_expectation)
                    .with_expectation(no_violations_expectation),
            ],
        ),
        "deterministic-replay" => (
            "Deterministic Replay",
            GameplayStrategy::ALL
                .into_iter()
                .map(|strategy| SimulationPlan::new(strategy).with_replay())
                .collect(),
        ),
        "ledger-invariants" => (
            "Ledger Invariants",
            GameplayStrategy::ALL
                .into_iter()
                .map(|strategy| {
                    SimulationPlan::new(strategy).with_expectation(no_violations_expectation)
                })
                .collect(),
        ),
        "full-campaign" => (
            "Full Campaign",
            vec![
                SimulationPlan::new(GameplayStrategy::Cautious)
                    .with_expectation(no_violations_expectation)
                    .with_expectation(consistent_ending_expectation),
            ],
        ),
        _ => return None,
    };
    Some(TestScenario {
        key,
        name,
        description,
        plans,
    })
}

fn studied_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.questions_answered > 0,
        "no questions were answered in {} rounds",
        summary.rounds
    );
    anyhow::ensure!(
        summary.final_ledger.solved_question_ids.len()
            == usize::try_from(summary.correct_answers).unwrap_or(usize::MAX),
        "solved {} questions but answered {} correctly",
        summary.final_ledger.solved_question_ids.len(),
        summary.correct_answers
    );
    Ok(())
}

fn no_violations_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.invariant_violations.is_empty(),
        "ledger invariants broken: {}",
        summary.invariant_violations.join("; ")
    );
    Ok(())
}

fn consistent_ending_expectation(summary: &SimulationSummary) -> Result<()> {
    if summary.cleared() {
        let last = summary.battles.last();
        anyhow::ensure!(
            last.is_some_and(|battle| battle.victory),
            "campaign cleared without a final victory"
        );
    }
    let advancing_wins = summary
        .battles
        .iter()
        .filter(|battle| battle.victory)
        .count()
        .saturating_sub(usize::from(summary.cleared()));
    let progress = usize::try_from(summary.final_ledger.progress_index).unwrap_or(usize::MAX);
    anyhow::ensure!(
        progress == advancing_wins,
        "progress index {progress} does not match {advancing_wins} advancing victories"
    );
    Ok(())
}

pub struct LogicTester {
    assets: Arc<TesterAssets>,
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { assets, verbose }
    }

    /// Run `scenario` for every seed; returns one result per seed plus a
    /// record per simulated campaign.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> (Vec<ScenarioResult>, Vec<CampaignRecord>) {
        let mut results = Vec::new();
        let mut records = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} [{}] (seed: {seed}) - {}",
                    scenario.name.bright_white(),
                    scenario.key,
                    scenario.description
                );
            }
            let (result, mut scenario_records) =
                self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
            records.append(&mut scenario_records);
        }

        (results, records)
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> (ScenarioResult, Vec<CampaignRecord>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut records = Vec::new();

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let start_time = Instant::now();
            let mut iteration_failures = Vec::new();

            for plan in &scenario.plans {
                match self.run_plan(plan, iteration_seed) {
                    Ok(summary) => {
                        records.push(CampaignRecord::from_summary(scenario.name, &summary));
                    }
                    Err(err) => iteration_failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {err:#}",
                        i + 1,
                        plan.strategy
                    )),
                }
            }

            if iteration_failures.is_empty() {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if self.verbose {
                    println!("  ✅ Iteration {}/{iterations} passed ({duration:?})", i + 1);
                }
            } else {
                if self.verbose {
                    for failure in &iteration_failures {
                        println!("  ❌ {}", failure.clone().red());
                    }
                }
                failures.append(&mut iteration_failures);
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        let result = ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        };
        (result, records)
    }

    fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let summary = simulate_campaign(&self.assets, plan.strategy, seed, plan.limits)?;

        if plan.replay {
            let replay = simulate_campaign(&self.assets, plan.strategy, seed, plan.limits)?;
            anyhow::ensure!(
                replay.ledger_digest == summary.ledger_digest,
                "replay digest {:016x} differs from {:016x}",
                replay.ledger_digest,
                summary.ledger_digest
            );
            anyhow::ensure!(
                replay.battles == summary.battles,
                "replay fought {} battles instead of {}",
                replay.battles.len(),
                summary.battles.len()
            );
        }

        for expectation in &plan.expectations {
            expectation.evaluate(&summary)?;
        }
        Ok(summary)
    }
}

/// Durations travel as whole milliseconds in reports.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    fn to_millis(duration: &Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(to_millis(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }

    pub mod seq {
        use super::{Deserialize, Deserializer, Duration, Serializer, to_millis};

        pub fn serialize<S: Serializer>(durations: &[Duration], s: S) -> Result<S::Ok, S::Error> {
            s.collect_seq(durations.iter().map(to_millis))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
            let raw = Vec::<u64>::deserialize(d)?;
            Ok(raw.into_iter().map(Duration::from_millis).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> LogicTester {
        LogicTester::new(Arc::new(TesterAssets::load_default().unwrap()), false)
    }

    #[test]
    fn every_listed_scenario_resolves() {
        for key in scenario_keys() {
            let scenario = get_scenario(&key).unwrap();
            assert_eq!(scenario.key, key);
            assert!(!scenario.plans.is_empty());
        }
        assert!(get_scenario("vehicle-system").is_none());
        assert!(get_scenario("SMOKE").is_some());
    }

    #[test]
    fn builtin_scenarios_pass() {
        let tester = tester();
        for key in scenario_keys() {
            let scenario = get_scenario(&key).unwrap();
            let (results, records) = tester.run_scenario(&scenario, &[1337, 42], 2);
            assert_eq!(results.len(), 2);
            for result in &results {
                assert!(result.passed, "{key}: {:?}", result.failures);
                assert_eq!(result.successful_iterations, 2);
            }
            assert_eq!(records.len(), 2 * 2 * scenario.plans.len());
        }
    }

    fn always_fails(_: &SimulationSummary) -> Result<()> {
        anyhow::bail!("nope")
    }

    #[test]
    fn failing_expectation_is_reported() {
        let tester = tester();
        let scenario = TestScenario {
            key: "impossible",
            name: "Impossible",
            description: "never passes",
            plans: vec![
                SimulationPlan::new(GameplayStrategy::Balanced)
                    .with_limits(SimulationLimits::default().with_max_rounds(1))
                    .with_expectation(always_fails),
            ],
        };
        let (results, records) = tester.run_scenario(&scenario, &[7], 3);
        assert!(!results[0].passed);
        assert_eq!(results[0].failures.len(), 3);
        assert!(results[0].failures[0].contains("nope"));
        assert!(records.is_empty());
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
    }
}
