//! Shop offers for troops and rations, and officer recruitment.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::SHOP_JSON;
use crate::ledger::ResourceLedger;
use crate::officers::Officer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("unknown shop offer '{0}'")]
    UnknownOffer(String),
    #[error("unknown officer '{0}'")]
    UnknownOfficer(String),
    #[error("officer '{0}' already serves under you")]
    AlreadyOwned(String),
    #[error("insufficient currency: need {needed}, have {available}")]
    InsufficientCurrency { needed: u32, available: u32 },
}

/// A repeatable purchase that converts currency into troops and/or rations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopOffer {
    pub id: String,
    pub name: String,
    pub price: u32,
    #[serde(default)]
    pub troops: u32,
    #[serde(default)]
    pub rations: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Shop {
    pub offers: Vec<ShopOffer>,
}

impl Shop {
    /// Load offers from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into shop data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(SHOP_JSON).unwrap_or_else(|err| {
            log::warn!("embedded shop failed to parse: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn find_offer(&self, offer_id: &str) -> Option<&ShopOffer> {
        self.offers.iter().find(|offer| offer.id == offer_id)
    }

    /// Cheapest offer that grants troops.
    #[must_use]
    pub fn cheapest_troops(&self) -> Option<&ShopOffer> {
        self.offers
            .iter()
            .filter(|offer| offer.troops > 0)
            .min_by_key(|offer| offer.price)
    }

    /// Cheapest offer that grants rations.
    #[must_use]
    pub fn cheapest_rations(&self) -> Option<&ShopOffer> {
        self.offers
            .iter()
            .filter(|offer| offer.rations > 0)
            .min_by_key(|offer| offer.price)
    }

    /// Whether the ledger can currently afford `offer`.
    #[must_use]
    pub const fn can_afford(ledger: &ResourceLedger, offer: &ShopOffer) -> bool {
        ledger.currency >= offer.price
    }
}

/// Spend the offer's price and grant its goods.
///
/// # Errors
///
/// Returns [`ShopError::InsufficientCurrency`] without touching the ledger if
/// the balance does not cover the price.
pub fn purchase_offer(ledger: &mut ResourceLedger, offer: &ShopOffer) -> Result<(), ShopError> {
    if !ledger.spend_currency(offer.price) {
        return Err(ShopError::InsufficientCurrency {
            needed: offer.price,
            available: ledger.currency,
        });
    }
    ledger.add_troops(offer.troops);
    ledger.add_rations(offer.rations);
    log::info!(
        "purchased '{}' for {} (+{} troops, +{} rations)",
        offer.id,
        offer.price,
        offer.troops,
        offer.rations
    );
    Ok(())
}

/// Recruit `officer` permanently.
///
/// # Errors
///
/// Returns [`ShopError::AlreadyOwned`] if the officer already serves, or
/// [`ShopError::InsufficientCurrency`] if the price is not covered. The
/// ledger is unchanged on error.
pub fn recruit_officer(ledger: &mut ResourceLedger, officer: &Officer) -> Result<(), ShopError> {
    if ledger.has_officer(&officer.id) {
        return Err(ShopError::AlreadyOwned(officer.id.clone()));
    }
    if !ledger.spend_currency(officer.price) {
        return Err(ShopError::InsufficientCurrency {
            needed: officer.price,
            available: ledger.currency,
        });
    }
    ledger.own_officer(&officer.id);
    log::info!("recruited officer '{}' for {}", officer.id, officer.price);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::officers::OfficerCatalog;

    #[test]
    fn static_offers_match_price_list() {
        let shop = Shop::load_from_static();
        let levy = shop.find_offer("levy").unwrap();
        assert_eq!((levy.price, levy.troops, levy.rations), (50, 100, 0));
        let granary = shop.find_offer("large-granary").unwrap();
        assert_eq!((granary.price, granary.rations), (300, 300));
        assert_eq!(shop.cheapest_troops().map(|o| o.id.as_str()), Some("levy"));
        assert_eq!(
            shop.cheapest_rations().map(|o| o.id.as_str()),
            Some("small-granary")
        );
    }

    #[test]
    fn purchase_spends_and_grants() {
        let shop = Shop::load_from_static();
        let mut ledger = ResourceLedger::with_starting_currency(500);
        purchase_offer(&mut ledger, shop.find_offer("veterans").unwrap()).unwrap();
        assert_eq!(ledger.currency, 50);
        assert_eq!(ledger.troops, 1_000);

        let err = purchase_offer(&mut ledger, shop.find_offer("small-granary").unwrap());
        assert_eq!(
            err,
            Err(ShopError::InsufficientCurrency {
                needed: 100,
                available: 50
            })
        );
        assert_eq!(ledger.currency, 50);
        assert_eq!(ledger.rations, 0);
        assert!(Shop::can_afford(&ledger, shop.find_offer("levy").unwrap()));
    }

    #[test]
    fn officers_are_recruited_once() {
        let catalog = OfficerCatalog::load_from_static();
        let jiang = catalog.get("jiang-wei").unwrap();
        let mut ledger = ResourceLedger::with_starting_currency(8_000);

        recruit_officer(&mut ledger, jiang).unwrap();
        assert!(ledger.has_officer("jiang-wei"));
        assert_eq!(ledger.currency, 4_200);

        assert_eq!(
            recruit_officer(&mut ledger, jiang),
            Err(ShopError::AlreadyOwned("jiang-wei".to_string()))
        );
        assert_eq!(ledger.currency, 4_200);

        let zhuge = catalog.get("zhuge-liang").unwrap();
        let err = recruit_officer(&mut ledger, zhuge).unwrap_err();
        assert_eq!(err.to_string(), "insufficient currency: need 10000, have 4200");
        assert!(!ledger.has_officer("zhuge-liang"));
    }
}
