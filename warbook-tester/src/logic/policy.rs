use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use warbook_game::numbers::round_to_u32;
use warbook_game::{
    BattleCommand, CampaignSession, MAX_OFFICERS, Officer, OfficerModifiers, Question,
    effective_troops,
};

/// RNG stream for simulated answers, kept apart from the session's own streams.
const ANSWER_STREAM: u64 = 2;

/// Upper bound on shop purchases in one visit.
const MAX_PURCHASES_PER_ROUND: usize = 64;

/// Knobs that distinguish the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyProfile {
    /// Probability of picking the right answer.
    pub accuracy: f64,
    pub questions_per_round: usize,
    /// Share of available troops sent into each battle.
    pub commit_share: f64,
    /// Rations carried per committed soldier.
    pub ration_cover: f64,
    pub recruits_officers: bool,
    /// Estimated own/enemy power needed before attacking voluntarily.
    pub min_odds: f64,
}

/// Policy interface for automated play.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    fn questions_per_round(&self) -> usize;

    /// Pick an answer index for `question`.
    fn pick_answer(&mut self, question: &Question) -> usize;

    /// Spend currency in the shop; returns the ids bought.
    fn go_shopping(&mut self, session: &mut CampaignSession) -> Vec<String>;

    /// Decide whether to attack the current stage. `forced` is set when
    /// studying can no longer earn anything.
    fn plan_attack(&self, session: &CampaignSession, forced: bool) -> Option<BattleCommand>;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Cautious,
    Balanced,
    Reckless,
}

impl GameplayStrategy {
    pub const ALL: [Self; 3] = [Self::Cautious, Self::Balanced, Self::Reckless];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Balanced => "Balanced",
            Self::Reckless => "Reckless",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(label))
    }

    #[must_use]
    pub const fn profile(self) -> PolicyProfile {
        match self {
            Self::Cautious => PolicyProfile {
                accuracy: 0.9,
                questions_per_round: 5,
                commit_share: 1.0,
                ration_cover: 1.0,
                recruits_officers: true,
                min_odds: 1.2,
            },
            Self::Balanced => PolicyProfile {
                accuracy: 0.75,
                questions_per_round: 4,
                commit_share: 0.8,
                ration_cover: 1.0,
                recruits_officers: true,
                min_odds: 0.8,
            },
            Self::Reckless => PolicyProfile {
                accuracy: 0.6,
                questions_per_round: 3,
                commit_share: 1.0,
                ration_cover: 0.5,
                recruits_officers: false,
                min_odds: 0.0,
            },
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        Box::new(ProfiledPolicy::new(self, seed))
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ProfiledPolicy {
    strategy: GameplayStrategy,
    profile: PolicyProfile,
    rng: ChaCha20Rng,
}

impl ProfiledPolicy {
    fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(ANSWER_STREAM);
        Self {
            strategy,
            profile: strategy.profile(),
            rng,
        }
    }
}

/// Recruit the strongest officer the ledger can pay for.
fn recruit_best_affordable(session: &mut CampaignSession) -> Option<String> {
    let ledger = session.ledger();
    let candidate = session
        .catalogs()
        .officers
        .iter()
        .filter(|officer| !ledger.has_officer(&officer.id) && officer.price <= ledger.currency)
        .max_by(|a, b| a.attack_bonus.total_cmp(&b.attack_bonus))
        .map(|officer| officer.id.clone())?;
    session.recruit(&candidate).ok()?;
    Some(candidate)
}

impl PlayerPolicy for ProfiledPolicy {
    fn name(&self) -> &'static str {
        self.strategy.label()
    }

    fn questions_per_round(&self) -> usize {
        self.profile.questions_per_round
    }

    fn pick_answer(&mut self, question: &Question) -> usize {
        let choices = question.choices.len();
        if choices <= 1 || self.rng.gen_bool(self.profile.accuracy.clamp(0.0, 1.0)) {
            return question.answer;
        }
        let offset = self.rng.gen_range(1..choices);
        (question.answer % choices + offset) % choices
    }

    fn go_shopping(&mut self, session: &mut CampaignSession) -> Vec<String> {
        let mut bought = Vec::new();
        if self.profile.recruits_officers
            && let Some(officer_id) = recruit_best_affordable(session)
        {
            bought.push(officer_id);
        }

        while bought.len() < MAX_PURCHASES_PER_ROUND {
            let ledger = session.ledger();
            let wanted_rations = f64::from(ledger.troops) * self.profile.ration_cover;
            let shop = &session.catalogs().shop;
            let offer = if f64::from(ledger.rations) < wanted_rations {
                shop.cheapest_rations()
            } else {
                shop.cheapest_troops()
            };
            // Free offers would never exhaust the purse.
            let Some(offer_id) = offer
                .filter(|offer| offer.price > 0)
                .map(|offer| offer.id.clone())
            else {
                break;
            };
            if session.buy(&offer_id).is_err() {
                break;
            }
            bought.push(offer_id);
        }
        bought
    }

    fn plan_attack(&self, session: &CampaignSession, forced: bool) -> Option<BattleCommand> {
        let stage = session.current_stage()?;
        let ledger = session.ledger();
        if ledger.troops == 0 {
            return None;
        }

        let troops = round_to_u32(f64::from(ledger.troops) * self.profile.commit_share)
            .clamp(1, ledger.troops);
        let rations =
            round_to_u32(f64::from(troops) * self.profile.ration_cover).min(ledger.rations);

        let mut fielded: Vec<&Officer> = session.catalogs().officers.owned(ledger).collect();
        fielded.sort_by(|a, b| b.attack_bonus.total_cmp(&a.attack_bonus));
        fielded.truncate(MAX_OFFICERS);

        let combat = &session.rules().combat;
        let mods = OfficerModifiers::aggregate(&fielded, combat.loss_reduction_cap);
        let own_power = f64::from(effective_troops(troops, rations)) * (1.0 + mods.attack_bonus);
        let enemy_power = f64::from(stage.enemy_troops)
            * stage.terrain_multiplier()
            * combat.defender_advantage
            * mods.enemy_morale_multiplier;
        if !forced && own_power < enemy_power * self.profile.min_odds {
            return None;
        }

        Some(
            fielded
                .iter()
                .fold(BattleCommand::new(troops, rations), |command, officer| {
                    command.with_officer(officer.id.clone())
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbook_game::{Catalogs, Rules, Shop};

    fn session() -> CampaignSession {
        CampaignSession::new(9, Catalogs::load_from_static(), Rules::default())
    }

    #[test]
    fn labels_round_trip() {
        for strategy in GameplayStrategy::ALL {
            assert_eq!(GameplayStrategy::from_label(strategy.label()), Some(strategy));
        }
        assert_eq!(
            GameplayStrategy::from_label("reckless"),
            Some(GameplayStrategy::Reckless)
        );
        assert!(GameplayStrategy::from_label("monte-carlo").is_none());
    }

    #[test]
    fn perfect_accuracy_always_answers_correctly() {
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Cautious, 3);
        policy.profile.accuracy = 1.0;
        let bank = Catalogs::load_from_static().questions;
        for question in bank.all() {
            assert_eq!(policy.pick_answer(question), question.answer);
        }
    }

    #[test]
    fn zero_accuracy_never_answers_correctly() {
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Reckless, 3);
        policy.profile.accuracy = 0.0;
        let bank = Catalogs::load_from_static().questions;
        for question in bank.all() {
            let pick = policy.pick_answer(question);
            assert_ne!(pick, question.answer);
            assert!(pick < question.choices.len());
        }
    }

    #[test]
    fn shopping_keeps_rations_in_step_with_troops() {
        let mut session = session();
        session.with_ledger_mut(|ledger| ledger.add_currency(1_000));
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Balanced, 1);
        let bought = policy.go_shopping(&mut session);
        assert!(!bought.is_empty());
        let ledger = session.ledger();
        assert!(ledger.currency < 100);
        assert!(ledger.troops > 0);
        assert!(ledger.rations + 100 >= ledger.troops);
    }

    #[test]
    fn cautious_waits_for_odds_unless_forced() {
        let mut session = session();
        session.with_ledger_mut(|ledger| {
            ledger.add_troops(100);
            ledger.add_rations(100);
        });
        let policy = ProfiledPolicy::new(GameplayStrategy::Cautious, 1);
        assert!(policy.plan_attack(&session, false).is_none());
        let command = policy.plan_attack(&session, true).unwrap();
        assert_eq!((command.troops, command.rations), (100, 100));
    }

    #[test]
    fn attack_plan_fields_best_owned_officers() {
        let mut session = session();
        session.with_ledger_mut(|ledger| {
            ledger.add_troops(1_000);
            ledger.add_rations(1_000);
            for id in ["jiang-wei", "guan-yu", "ma-chao", "huang-zhong"] {
                ledger.own_officer(id);
            }
        });
        let policy = ProfiledPolicy::new(GameplayStrategy::Balanced, 1);
        let command = policy.plan_attack(&session, false).unwrap();
        assert_eq!(command.troops, 800);
        assert_eq!(command.officers.as_slice(), ["guan-yu", "ma-chao", "huang-zhong"]);
        assert!(session.validate(&command).is_ok());
    }

    #[test]
    fn no_troops_means_no_attack() {
        let session = session();
        let policy = ProfiledPolicy::new(GameplayStrategy::Reckless, 1);
        assert!(policy.plan_attack(&session, true).is_none());
    }

    #[test]
    fn wrong_pick_stays_in_range_for_out_of_range_answer() {
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Reckless, 5);
        policy.profile.accuracy = 0.0;
        let mut question = Catalogs::load_from_static().questions.all()[0].clone();
        question.answer = usize::MAX;
        let choices = question.choices.len();
        for _ in 0..50 {
            let pick = policy.pick_answer(&question);
            assert!(pick < choices);
            assert_ne!(pick, usize::MAX % choices);
        }
    }

    #[test]
    fn free_offers_do_not_trap_the_shopper() {
        let shop = Shop::from_json(
            r#"{ "offers": [
                { "id": "free-levy", "name": "Free levy", "price": 0, "troops": 10 },
                { "id": "free-grain", "name": "Free grain", "price": 0, "rations": 10 }
            ] }"#,
        )
        .unwrap();
        let catalogs = Catalogs {
            shop,
            ..Catalogs::load_from_static()
        };
        let mut session = CampaignSession::new(4, catalogs, Rules::default());
        session.with_ledger_mut(|ledger| ledger.add_currency(500));
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Reckless, 1);
        let bought = policy.go_shopping(&mut session);
        assert!(bought.is_empty());
        assert_eq!(session.ledger().currency, 500);
    }

    #[test]
    fn shopping_stops_at_the_per_round_cap() {
        let shop = Shop::from_json(
            r#"{ "offers": [
                { "id": "penny-levy", "name": "Penny levy", "price": 1, "troops": 1 },
                { "id": "penny-grain", "name": "Penny grain", "price": 1, "rations": 1 }
            ] }"#,
        )
        .unwrap();
        let catalogs = Catalogs {
            shop,
            ..Catalogs::load_from_static()
        };
        let mut session = CampaignSession::new(4, catalogs, Rules::default());
        session.with_ledger_mut(|ledger| ledger.add_currency(10_000));
        let mut policy = ProfiledPolicy::new(GameplayStrategy::Reckless, 1);
        let bought = policy.go_shopping(&mut session);
        assert_eq!(bought.len(), MAX_PURCHASES_PER_ROUND);
        assert_eq!(
            session.ledger().currency,
            10_000 - u32::try_from(MAX_PURCHASES_PER_ROUND).unwrap()
        );
    }
}
