//! Officer roster and battle modifiers.
use serde::{Deserialize, Serialize};

use crate::constants::OFFICERS_JSON;
use crate::ledger::ResourceLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficerKind {
    /// Raises own combat power.
    Warrior,
    /// Supports through enemy debuffs and casualty reduction.
    Strategist,
}

/// A permanently owned unit that modifies battles it is fielded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    pub id: String,
    pub name: String,
    pub kind: OfficerKind,
    /// One-time recruitment cost in currency.
    pub price: u32,
    /// Additive bonus to own power: power is multiplied by `1 + sum`.
    #[serde(default)]
    pub attack_bonus: f64,
    /// Multiplies enemy power; below 1.0 weakens the defenders.
    #[serde(default = "identity_multiplier")]
    pub enemy_morale_multiplier: f64,
    /// Fraction of casualties avoided. Capped in aggregate by the rules.
    #[serde(default)]
    pub loss_reduction: f64,
    /// Halves casualties on defeat.
    #[serde(default)]
    pub defeat_loss_halve: bool,
}

const fn identity_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OfficerCatalog {
    pub officers: Vec<Officer>,
}

impl OfficerCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            officers: Vec::new(),
        }
    }

    /// Load the roster from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into officer data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Roster bundled with the engine.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(OFFICERS_JSON).unwrap_or_else(|err| {
            log::warn!("embedded officer roster failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Officer> {
        self.officers.iter().find(|officer| officer.id == id)
    }

    /// Officers the ledger owns, in roster order.
    pub fn owned<'a>(&'a self, ledger: &'a ResourceLedger) -> impl Iterator<Item = &'a Officer> {
        self.officers
            .iter()
            .filter(move |officer| ledger.has_officer(&officer.id))
    }

    /// Resolve ids to officers, skipping unknown ids.
    #[must_use]
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Officer> {
        ids.iter().filter_map(|id| self.get(id.as_ref())).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Officer> {
        self.officers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.officers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.officers.is_empty()
    }
}

impl<'a> IntoIterator for &'a OfficerCatalog {
    type Item = &'a Officer;
    type IntoIter = std::slice::Iter<'a, Officer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
