//! Campaign session: the context object binding a ledger to catalogs, rules
//! and seeded randomness.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::combat::{BattleDraw, BattleOutcome, resolve_battle};
use crate::config::Rules;
use crate::constants::{MAX_OFFICERS, OFFICERS_JSON, QUESTIONS_JSON, SHOP_JSON, STAGES_JSON};
use crate::ledger::ResourceLedger;
use crate::officers::{Officer, OfficerCatalog};
use crate::questions::{Question, QuestionBank};
use crate::quiz::{AnswerResult, resolve_answer};
use crate::shop::{Shop, ShopError, purchase_offer, recruit_officer};
use crate::stages::{Stage, StageCatalog};

const QUIZ_STREAM: u64 = 0;
const BATTLE_STREAM: u64 = 1;

/// Reasons a battle command is refused before any resolution happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no stage to attack")]
    NoStage,
    #[error("at least one soldier must be committed")]
    NoTroopsCommitted,
    #[error("committed {requested} troops but only {available} are available")]
    NotEnoughTroops { requested: u32, available: u32 },
    #[error("committed {requested} rations but only {available} are available")]
    NotEnoughRations { requested: u32, available: u32 },
    #[error("at most {max} officers may take the field, got {0}", max = MAX_OFFICERS)]
    TooManyOfficers(usize),
    #[error("officer '{0}' selected twice")]
    DuplicateOfficer(String),
    #[error("unknown officer '{0}'")]
    UnknownOfficer(String),
    #[error("officer '{0}' has not been recruited")]
    OfficerNotOwned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown question '{0}'")]
    UnknownQuestion(String),
    #[error("question '{0}' has already been solved")]
    AlreadySolved(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Shop(#[from] ShopError),
}

/// Static data a session plays against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalogs {
    pub officers: OfficerCatalog,
    pub stages: StageCatalog,
    pub questions: QuestionBank,
    pub shop: Shop,
}

impl Catalogs {
    /// Parse every bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns the first parse error encountered.
    pub fn from_embedded() -> Result<Self, serde_json::Error> {
        Ok(Self {
            officers: OfficerCatalog::from_json(OFFICERS_JSON)?,
            stages: StageCatalog::from_json(STAGES_JSON)?,
            questions: QuestionBank::from_json(QUESTIONS_JSON)?,
            shop: Shop::from_json(SHOP_JSON)?,
        })
    }

    /// Bundled catalogs, each falling back to empty if it fails to parse.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self {
            officers: OfficerCatalog::load_from_static(),
            stages: StageCatalog::load_from_static(),
            questions: QuestionBank::load_from_static(),
            shop: Shop::load_from_static(),
        }
    }
}

/// Troops, rations and officers committed to an attack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleCommand {
    pub troops: u32,
    pub rations: u32,
    pub officers: SmallVec<[String; MAX_OFFICERS]>,
}

impl BattleCommand {
    #[must_use]
    pub fn new(troops: u32, rations: u32) -> Self {
        Self {
            troops,
            rations,
            officers: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_officer(mut self, officer_id: impl Into<String>) -> Self {
        self.officers.push(officer_id.into());
        self
    }
}

/// Outcome of [`CampaignSession::attack`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub stage_index: usize,
    pub stage_name: String,
    pub outcome: BattleOutcome,
    /// The victory moved the campaign to the next stage.
    pub advanced: bool,
    /// The victory was on the final stage.
    pub cleared: bool,
}

/// A player's campaign: ledger, catalogs, rules and two seeded RNG streams
/// (question picks and battle draws) so a replay with the same seed and the
/// same actions reproduces the same ledger.
#[derive(Debug, Clone)]
pub struct CampaignSession {
    seed: u64,
    ledger: ResourceLedger,
    catalogs: Catalogs,
    rules: Rules,
    quiz_rng: ChaCha20Rng,
    battle_rng: ChaCha20Rng,
}

impl CampaignSession {
    /// Fresh campaign with the configured starting currency.
    #[must_use]
    pub fn new(seed: u64, catalogs: Catalogs, rules: Rules) -> Self {
        let ledger = ResourceLedger::with_starting_currency(rules.starting_currency);
        Self::from_ledger(ledger, seed, catalogs, rules)
    }

    /// Resume a campaign from a saved ledger.
    #[must_use]
    pub fn from_ledger(ledger: ResourceLedger, seed: u64, catalogs: Catalogs, rules: Rules) -> Self {
        let (quiz_rng, battle_rng) = Self::streams(seed);
        Self {
            seed,
            ledger,
            catalogs,
            rules,
            quiz_rng,
            battle_rng,
        }
    }

    fn streams(seed: u64) -> (ChaCha20Rng, ChaCha20Rng) {
        let mut quiz = ChaCha20Rng::seed_from_u64(seed);
        quiz.set_stream(QUIZ_STREAM);
        let mut battle = ChaCha20Rng::seed_from_u64(seed);
        battle.set_stream(BATTLE_STREAM);
        (quiz, battle)
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Apply a closure to the mutable ledger.
    pub fn with_ledger_mut<R>(&mut self, f: impl FnOnce(&mut ResourceLedger) -> R) -> R {
        f(&mut self.ledger)
    }

    #[must_use]
    pub const fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Deterministically reseed both RNG streams.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        (self.quiz_rng, self.battle_rng) = Self::streams(seed);
    }

    // Quiz ----------------------------------------------------------------

    /// Draw the next unsolved question, if any remain.
    pub fn next_question(&mut self) -> Option<&Question> {
        self.catalogs
            .questions
            .pick_next(&self.ledger, &mut self.quiz_rng)
    }

    /// Answer a question from the bank.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownQuestion`] for ids not in the bank and
    /// [`SessionError::AlreadySolved`] for questions that are never re-asked.
    pub fn answer(
        &mut self,
        question_id: &str,
        chosen_index: usize,
    ) -> Result<AnswerResult, SessionError> {
        let question = self
            .catalogs
            .questions
            .get(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;
        if self.ledger.is_solved(question_id) {
            return Err(SessionError::AlreadySolved(question_id.to_string()));
        }
        Ok(resolve_answer(
            question,
            chosen_index,
            &mut self.ledger,
            &self.rules.quiz,
        ))
    }

    // Shop ----------------------------------------------------------------

    /// Buy a troop or ration offer.
    ///
    /// # Errors
    ///
    /// Returns a [`ShopError`] if the offer is unknown or unaffordable.
    pub fn buy(&mut self, offer_id: &str) -> Result<(), SessionError> {
        let offer = self
            .catalogs
            .shop
            .find_offer(offer_id)
            .ok_or_else(|| ShopError::UnknownOffer(offer_id.to_string()))?;
        purchase_offer(&mut self.ledger, offer)?;
        Ok(())
    }

    /// Recruit an officer from the roster.
    ///
    /// # Errors
    ///
    /// Returns a [`ShopError`] if the officer is unknown, owned or unaffordable.
    pub fn recruit(&mut self, officer_id: &str) -> Result<(), SessionError> {
        let officer = self
            .catalogs
            .officers
            .get(officer_id)
            .ok_or_else(|| ShopError::UnknownOfficer(officer_id.to_string()))?;
        recruit_officer(&mut self.ledger, officer)?;
        Ok(())
    }

    // Battle --------------------------------------------------------------

    #[must_use]
    pub fn current_stage(&self) -> Option<&Stage> {
        self.catalogs.stages.current(&self.ledger)
    }

    /// Check a command against the ledger and roster.
    ///
    /// # Errors
    ///
    /// Returns the first [`CommandError`] the command violates.
    pub fn validate(&self, command: &BattleCommand) -> Result<Vec<&Officer>, CommandError> {
        if self.current_stage().is_none() {
            return Err(CommandError::NoStage);
        }
        if command.troops == 0 {
            return Err(CommandError::NoTroopsCommitted);
        }
        if command.troops > self.ledger.troops {
            return Err(CommandError::NotEnoughTroops {
                requested: command.troops,
                available: self.ledger.troops,
            });
        }
        if command.rations > self.ledger.rations {
            return Err(CommandError::NotEnoughRations {
                requested: command.rations,
                available: self.ledger.rations,
            });
        }
        if command.officers.len() > MAX_OFFICERS {
            return Err(CommandError::TooManyOfficers(command.officers.len()));
        }

        let mut fielded: Vec<&Officer> = Vec::with_capacity(command.officers.len());
        for id in &command.officers {
            if fielded.iter().any(|officer| &officer.id == id) {
                return Err(CommandError::DuplicateOfficer(id.clone()));
            }
            let officer = self
                .catalogs
                .officers
                .get(id)
                .ok_or_else(|| CommandError::UnknownOfficer(id.clone()))?;
            if !self.ledger.has_officer(id) {
                return Err(CommandError::OfficerNotOwned(id.clone()));
            }
            fielded.push(officer);
        }
        Ok(fielded)
    }

    /// Attack the current stage using the session's battle stream.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the command is invalid; the ledger is
    /// untouched in that case.
    pub fn attack(&mut self, command: &BattleCommand) -> Result<BattleReport, SessionError> {
        let mut rng = self.battle_rng.clone();
        let report = self.attack_with(command, &mut rng)?;
        self.battle_rng = rng;
        Ok(report)
    }

    /// Attack the current stage with an injected draw source.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the command is invalid.
    pub fn attack_with(
        &mut self,
        command: &BattleCommand,
        draw: &mut dyn BattleDraw,
    ) -> Result<BattleReport, SessionError> {
        let officers = self.validate(command)?;
        let stage_index = usize::try_from(self.ledger.progress_index).unwrap_or(usize::MAX);
        let Some(stage) = self.catalogs.stages.get(stage_index) else {
            return Err(CommandError::NoStage.into());
        };

        let mut ledger = self.ledger.clone();
        let outcome = resolve_battle(
            stage,
            i64::from(command.troops),
            i64::from(command.rations),
            &officers,
            &mut ledger,
            &self.rules.combat,
            draw,
        );

        let stage_count = self.catalogs.stages.len();
        let advanced = outcome.victory && ledger.advance_progress(stage_count);
        let cleared = outcome.victory && self.catalogs.stages.is_last(stage_index);
        if advanced {
            log::info!("campaign advanced to stage {}", ledger.progress_index + 1);
        }
        let report = BattleReport {
            stage_index,
            stage_name: stage.name.clone(),
            outcome,
            advanced,
            cleared,
        };
        self.ledger = ledger;
        Ok(report)
    }

    // Lifecycle -----------------------------------------------------------

    /// Irreversibly wipe progress back to the configured starting state.
    pub fn reset_progress(&mut self) {
        log::info!("resetting campaign progress");
        self.ledger.reset_all_with(self.rules.starting_currency);
    }

    /// Consume the session, returning the ledger for persistence.
    #[must_use]
    pub fn into_ledger(self) -> ResourceLedger {
        self.ledger
    }
}
