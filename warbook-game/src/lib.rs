//! Warbook Game Engine
//!
//! Platform-agnostic core logic for Warbook: quiz answers earn currency,
//! currency buys troops, rations and officers, and those are committed to
//! battles resolved by a weighted lottery against a fixed campaign.
//! This crate has no UI or platform-specific dependencies.

pub mod combat;
pub mod config;
pub mod constants;
pub mod ledger;
pub mod numbers;
pub mod officers;
pub mod questions;
pub mod quiz;
pub mod session;
pub mod shop;
pub mod stages;

// Re-export commonly used types
pub use combat::{
    BattleDraw, BattleOutcome, FixedDraw, OfficerModifiers, effective_troops, resolve_battle,
};
pub use config::{ComboBonus, CombatRules, QuizRules, Rules};
pub use constants::MAX_OFFICERS;
pub use ledger::ResourceLedger;
pub use officers::{Officer, OfficerCatalog, OfficerKind};
pub use questions::{BankProgress, Difficulty, Question, QuestionBank};
pub use quiz::{AnswerResult, resolve_answer};
pub use session::{
    BattleCommand, BattleReport, CampaignSession, Catalogs, CommandError, SessionError,
};
pub use shop::{Shop, ShopError, ShopOffer, purchase_offer, recruit_officer};
pub use stages::{Stage, StageCatalog, Terrain};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the officer roster, campaign, question bank and shop
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog cannot be loaded.
    fn load_catalogs(&self) -> Result<Catalogs, Self::Error>;

    /// Load the rule set
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded or parsed.
    fn load_rules(&self) -> Result<Rules, Self::Error>;
}

/// Loader serving the data bundled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedData;

impl DataLoader for EmbeddedData {
    type Error = serde_json::Error;

    fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
        Catalogs::from_embedded()
    }

    fn load_rules(&self) -> Result<Rules, Self::Error> {
        Rules::from_json(constants::RULES_JSON)
    }
}

/// Trait for abstracting ledger snapshot persistence
/// Platform-specific implementations choose the encoding
pub trait LedgerStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a ledger snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_ledger(&self, save_name: &str, ledger: &ResourceLedger) -> Result<(), Self::Error>;

    /// Load a ledger snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_ledger(&self, save_name: &str) -> Result<Option<ResourceLedger>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine for creating and resuming campaign sessions
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: LedgerStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: LedgerStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Start a fresh campaign seeded with `seed`
    ///
    /// # Errors
    ///
    /// Returns an error if catalogs or rules cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<CampaignSession, L::Error> {
        let catalogs = self.data_loader.load_catalogs()?;
        let rules = self.data_loader.load_rules()?;
        Ok(CampaignSession::new(seed, catalogs, rules))
    }

    /// Save the session's ledger under `save_name`
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &CampaignSession) -> Result<(), S::Error> {
        self.storage.save_ledger(save_name, session.ledger())
    }

    /// Resume a saved campaign with fresh catalogs and rules
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot or the data cannot be loaded.
    pub fn resume_session(
        &self,
        save_name: &str,
        seed: u64,
    ) -> Result<Option<CampaignSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(ledger) = self.storage.load_ledger(save_name).map_err(Into::into)? else {
            return Ok(None);
        };
        let catalogs = self.data_loader.load_catalogs().map_err(Into::into)?;
        let rules = self.data_loader.load_rules().map_err(Into::into)?;
        Ok(Some(CampaignSession::from_ledger(
            ledger, seed, catalogs, rules,
        )))
    }

    /// Delete a saved campaign
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
            Ok(Catalogs::default())
        }

        fn load_rules(&self) -> Result<Rules, Self::Error> {
            Ok(Rules {
                starting_currency: 120,
                ..Rules::builtin()
            })
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, ResourceLedger>>>,
    }

    impl LedgerStorage for MemoryStorage {
        type Error = Infallible;

        fn save_ledger(&self, save_name: &str, ledger: &ResourceLedger) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), ledger.clone());
            Ok(())
        }

        fn load_ledger(&self, save_name: &str) -> Result<Option<ResourceLedger>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_ledger() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::default());
        let mut session = engine.create_session(0xABCD).unwrap();
        assert_eq!(session.ledger().currency, 120);
        session.with_ledger_mut(|ledger| {
            ledger.add_troops(250);
            ledger.mark_solved("q-001");
        });
        engine.save_session("slot-one", &session).unwrap();

        let loaded = engine
            .resume_session("slot-one", 0xABCD)
            .unwrap()
            .expect("save exists");
        assert_eq!(loaded.ledger().troops, 250);
        assert!(loaded.ledger().is_solved("q-001"));
        assert!(engine.resume_session("missing-slot", 1).unwrap().is_none());

        engine.delete_session("slot-one").unwrap();
        assert!(engine.resume_session("slot-one", 1).unwrap().is_none());
    }

    #[test]
    fn embedded_loader_serves_bundled_data() {
        let catalogs = EmbeddedData.load_catalogs().unwrap();
        assert_eq!(catalogs.officers.len(), 7);
        assert!(!catalogs.stages.is_empty());
        assert_eq!(EmbeddedData.load_rules().unwrap(), Rules::builtin());
    }
}
