//! Fixed gameplay limits that are not part of the tunable rules.
//!
//! Tunable numbers (rewards, loss rates, multipliers) live in
//! [`crate::config::Rules`]; the values here are structural.

/// Maximum number of officers that may take the field in one battle.
pub const MAX_OFFICERS: usize = 3;

/// Currency a fresh ledger starts with when no rules override it.
pub const DEFAULT_STARTING_CURRENCY: u32 = 0;

/// Terrain multiplier for open ground.
pub const TERRAIN_PLAIN_MULTIPLIER: f64 = 1.0;
/// Terrain multiplier for passes, fortifications and river crossings.
pub const TERRAIN_PASS_MULTIPLIER: f64 = 1.2;

// Embedded data ------------------------------------------------------------
pub(crate) const OFFICERS_JSON: &str = include_str!("../assets/data/officers.json");
pub(crate) const STAGES_JSON: &str = include_str!("../assets/data/stages.json");
pub(crate) const SHOP_JSON: &str = include_str!("../assets/data/shop.json");
pub(crate) const QUESTIONS_JSON: &str = include_str!("../assets/data/questions.json");
pub(crate) const RULES_JSON: &str = include_str!("../assets/data/rules.json");
