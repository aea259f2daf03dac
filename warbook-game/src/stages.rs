//! Ordered campaign stages.
use serde::{Deserialize, Serialize};

use crate::constants::{STAGES_JSON, TERRAIN_PASS_MULTIPLIER, TERRAIN_PLAIN_MULTIPLIER};
use crate::ledger::ResourceLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    /// Open ground.
    Plain,
    /// Mountain pass, fortification or river crossing.
    Pass,
}

impl Terrain {
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Plain => TERRAIN_PLAIN_MULTIPLIER,
            Self::Pass => TERRAIN_PASS_MULTIPLIER,
        }
    }
}

impl std::fmt::Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain (x{:.1})", self.multiplier()),
            Self::Pass => write!(f, "pass (x{:.1})", self.multiplier()),
        }
    }
}

/// A fixed battle encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub order: u32,
    pub name: String,
    #[serde(default)]
    pub enemy_general: String,
    pub enemy_troops: u32,
    /// Suggested ration commitment; shown to the player, not enforced.
    #[serde(default)]
    pub required_rations: u32,
    pub terrain: Terrain,
    #[serde(default)]
    pub reward_currency: u32,
    #[serde(default)]
    pub note: Option<String>,
}

impl Stage {
    #[must_use]
    pub const fn terrain_multiplier(&self) -> f64 {
        self.terrain.multiplier()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StageCatalog {
    pub stages: Vec<Stage>,
}

impl StageCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Load stages from JSON. Stages are sorted by `order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into stage data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.stages.sort_by_key(|stage| stage.order);
        Ok(catalog)
    }

    /// Campaign bundled with the engine.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(STAGES_JSON).unwrap_or_else(|err| {
            log::warn!("embedded campaign failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Stage the ledger is currently positioned on.
    #[must_use]
    pub fn current(&self, ledger: &ResourceLedger) -> Option<&Stage> {
        usize::try_from(ledger.progress_index)
            .ok()
            .and_then(|index| self.get(index))
    }

    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.stages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_stage_matches_tutorial() {
        let catalog = StageCatalog::load_from_static();
        assert!(catalog.len() >= 2);
        let first = catalog.get(0).unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(first.enemy_troops, 500);
        assert_eq!(first.required_rations, 100);
        assert_eq!(first.terrain, Terrain::Plain);
        assert_eq!(first.reward_currency, 0);
    }

    #[test]
    fn stages_sorted_by_order() {
        let json = r#"{ "stages": [
            { "order": 2, "name": "B", "enemy_troops": 10, "terrain": "pass" },
            { "order": 1, "name": "A", "enemy_troops": 5, "terrain": "plain" }
        ] }"#;
        let catalog = StageCatalog::from_json(json).unwrap();
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(catalog.is_last(1));
        assert!(!catalog.is_last(0));
    }

    #[test]
    fn terrain_multipliers() {
        assert!((Terrain::Plain.multiplier() - 1.0).abs() < f64::EPSILON);
        assert!((Terrain::Pass.multiplier() - 1.2).abs() < f64::EPSILON);
        assert_eq!(Terrain::Pass.to_string(), "pass (x1.2)");
    }

    #[test]
    fn current_follows_progress_index() {
        let catalog = StageCatalog::load_from_static();
        let mut ledger = ResourceLedger::default();
        assert_eq!(catalog.current(&ledger).map(|s| s.order), Some(1));
        ledger.progress_index = 1;
        assert_eq!(catalog.current(&ledger).map(|s| s.order), Some(2));
        ledger.progress_index = 99;
        assert!(catalog.current(&ledger).is_none());
    }
}
