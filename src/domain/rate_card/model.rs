//! Rate card domain entity

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::types::DomainError;

/// How prices were expressed in the uploaded sheet.
///
/// Stored prices are always base prices; this is provenance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateType {
    /// Price for the whole bracket weight
    #[default]
    #[serde(rename = "base")]
    Base,
    /// Price per kg, multiplied by the bracket weight on ingestion
    #[serde(rename = "perKg")]
    PerKg,
}

impl std::fmt::Display for RateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::PerKg => write!(f, "perKg"),
        }
    }
}

impl FromStr for RateType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "base" | "Base" => Ok(Self::Base),
            "perKg" | "perkg" | "per-kg" | "PerKg" => Ok(Self::PerKg),
            other => Err(DomainError::Validation(format!(
                "unknown rate type '{}', expected 'base' or 'perKg'",
                other
            ))),
        }
    }
}

/// One weight breakpoint: `{ kg, "<zone column>": price, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBracket {
    pub kg: f64,
    #[serde(flatten)]
    pub prices: BTreeMap<String, f64>,
}

impl WeightBracket {
    pub fn price(&self, zone: &str) -> Option<f64> {
        self.prices.get(zone).copied()
    }
}

/// Destination bucket sharing one price column and one set of extra charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone: String,
    pub countries: Vec<String>,
    #[serde(default)]
    pub extra_charges: BTreeMap<String, f64>,
}

impl Zone {
    pub fn contains(&self, country: &str) -> bool {
        let needle = country.trim();
        self.countries.iter().any(|c| c.eq_ignore_ascii_case(needle))
    }

    pub fn extra_charge_total(&self) -> f64 {
        self.extra_charges.values().sum()
    }
}

/// Normalized carrier rate card. Immutable once stored; a re-upload
/// produces a new card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    #[serde(rename = "type")]
    pub card_type: String,
    pub service: String,
    pub original_name: String,
    #[serde(default)]
    pub covid_charges: f64,
    /// Fuel surcharge in percent
    #[serde(default)]
    pub fuel_charges: f64,
    #[serde(default, alias = "uploadedRateType")]
    pub rate_type: RateType,
    #[serde(default, alias = "rates")]
    pub brackets: Vec<WeightBracket>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// Price of one bracket cell resolved for a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePrice {
    pub zone: String,
    pub bracket_kg: f64,
    pub price: f64,
    pub extra_charges: f64,
}

impl RateCard {
    /// First zone listing the country wins.
    pub fn zone_for_country(&self, country: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(country))
    }

    /// Smallest bracket that covers `weight`; `None` above the top bracket.
    pub fn bracket_for_weight(&self, weight: f64) -> Option<&WeightBracket> {
        self.brackets
            .iter()
            .filter(|b| b.kg >= weight)
            .min_by(|a, b| a.kg.total_cmp(&b.kg))
    }

    /// Look up the stored base price for a shipment weight and destination.
    pub fn price_for(&self, weight: f64, country: &str) -> Option<ZonePrice> {
        let zone = self.zone_for_country(country)?;
        let bracket = self.bracket_for_weight(weight)?;
        let price = bracket.price(&zone.zone)?;
        Some(ZonePrice {
            zone: zone.zone.clone(),
            bracket_kg: bracket.kg,
            price,
            extra_charges: zone.extra_charge_total(),
        })
    }

    /// Lookup key used by the rate store.
    pub fn key(&self) -> String {
        format!("{}/{}", self.original_name, self.service)
    }
}

/// Body of `POST /rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCardPayload {
    #[serde(rename = "type")]
    pub card_type: String,
    pub service: String,
    pub original_name: String,
    pub covid_charges: f64,
    pub fuel_charges: f64,
    pub rates: Vec<WeightBracket>,
    pub zones: Vec<Zone>,
    pub uploaded_rate_type: RateType,
}

impl From<&RateCard> for RateCardPayload {
    fn from(card: &RateCard) -> Self {
        Self {
            card_type: card.card_type.clone(),
            service: card.service.clone(),
            original_name: card.original_name.clone(),
            covid_charges: card.covid_charges,
            fuel_charges: card.fuel_charges,
            rates: card.brackets.clone(),
            zones: card.zones.clone(),
            uploaded_rate_type: card.rate_type,
        }
    }
}

impl From<RateCardPayload> for RateCard {
    fn from(p: RateCardPayload) -> Self {
        Self {
            card_type: p.card_type,
            service: p.service,
            original_name: p.original_name,
            covid_charges: p.covid_charges,
            fuel_charges: p.fuel_charges,
            rate_type: p.uploaded_rate_type,
            brackets: p.rates,
            zones: p.zones,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket(kg: f64, prices: &[(&str, f64)]) -> WeightBracket {
        WeightBracket {
            kg,
            prices: prices.iter().map(|(z, p)| (z.to_string(), *p)).collect(),
        }
    }

    fn sample_card() -> RateCard {
        RateCard {
            card_type: "Express".into(),
            service: "DHL".into(),
            original_name: "dhl-2024.xlsx".into(),
            covid_charges: 0.0,
            fuel_charges: 22.5,
            rate_type: RateType::Base,
            brackets: vec![
                bracket(0.5, &[("1", 900.0), ("2", 1100.0)]),
                bracket(1.0, &[("1", 1315.0), ("2", 1491.0)]),
                bracket(2.0, &[("1", 1800.0)]),
            ],
            zones: vec![
                Zone {
                    zone: "1".into(),
                    countries: vec!["United Kingdom".into(), "France".into()],
                    extra_charges: BTreeMap::from([("Remote".to_string(), 50.0), ("Handling".to_string(), 25.0)]),
                },
                Zone {
                    zone: "2".into(),
                    countries: vec!["Germany".into(), "France".into()],
                    extra_charges: BTreeMap::new(),
                },
            ],
        }
    }

    #[test]
    fn zone_lookup_is_case_insensitive_and_first_wins() {
        let card = sample_card();
        assert_eq!(card.zone_for_country(" united kingdom ").unwrap().zone, "1");
        assert_eq!(card.zone_for_country("France").unwrap().zone, "1");
        assert!(card.zone_for_country("Japan").is_none());
    }

    #[test]
    fn bracket_lookup_picks_smallest_covering_bracket() {
        let card = sample_card();
        assert_eq!(card.bracket_for_weight(0.3).unwrap().kg, 0.5);
        assert_eq!(card.bracket_for_weight(1.0).unwrap().kg, 1.0);
        assert_eq!(card.bracket_for_weight(1.2).unwrap().kg, 2.0);
        assert!(card.bracket_for_weight(2.5).is_none());
    }

    #[test]
    fn price_for_combines_zone_and_bracket() {
        let card = sample_card();
        let p = card.price_for(0.8, "United Kingdom").unwrap();
        assert_eq!(p.zone, "1");
        assert_eq!(p.price, 1315.0);
        assert_eq!(p.extra_charges, 75.0);
        // zone 2 has no 2 kg price
        assert!(card.price_for(1.5, "Germany").is_none());
    }

    #[test]
    fn bracket_serializes_flat() {
        let b = bracket(1.0, &[("1", 1315.0), ("3", 1491.0)]);
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json, serde_json::json!({"kg": 1.0, "1": 1315.0, "3": 1491.0}));
        let back: WeightBracket = serde_json::from_value(json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let payload = RateCardPayload::from(&sample_card());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Express");
        assert_eq!(json["originalName"], "dhl-2024.xlsx");
        assert_eq!(json["uploadedRateType"], "base");
        assert_eq!(json["rates"].as_array().unwrap().len(), 3);
        assert_eq!(json["zones"][0]["extraCharges"]["Remote"], 50.0);
    }

    #[test]
    fn rate_type_parsing() {
        assert_eq!("perKg".parse::<RateType>().unwrap(), RateType::PerKg);
        assert_eq!("base".parse::<RateType>().unwrap(), RateType::Base);
        assert!("weekly".parse::<RateType>().is_err());
        assert_eq!(RateType::PerKg.to_string(), "perKg");
    }
}
