use anyhow::{Result, bail};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;

/// A seed requested on the command line, with the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub token: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, token: None }
    }

    #[must_use]
    pub fn from_token(seed: u64, token: &str) -> Self {
        Self {
            seed,
            token: Some(token.to_string()),
        }
    }
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates are dropped, keeping first-seen order; an
/// empty list falls back to [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let Some(seed) = parse_seed(token) else {
            bail!("Unrecognized seed token: {token}");
        };
        if seen.insert(seed) {
            resolved.push(SeedInfo::from_token(seed, token));
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }
    Ok(resolved)
}

fn parse_seed(token: &str) -> Option<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(&hex.replace('_', ""), 16).ok();
    }
    if let Ok(value) = token.parse::<u64>() {
        return Some(value);
    }
    token.parse::<i64>().ok().map(i64::unsigned_abs)
}
