//! Rate sheet ingestion
//!
//! Validates weight-bracket and zone sheets row by row and normalizes them
//! into a [`RateCard`]. A bad row is reported and skipped; it never aborts
//! the batch.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::cell::{is_blank_row, Cell};
use super::report::{BracketIngestion, IngestionReport, SheetKind, ZoneIngestion};
use crate::domain::rate_card::{RateCard, RateType, WeightBracket, Zone};
use crate::shared::types::{round2, DomainError, DomainResult};
use crate::shared::validations::validate_input;

/// Column where `(chargeName, chargeValue)` pairs start in the zone sheet.
const EXTRA_CHARGE_START: usize = 2;

/// Descriptive fields entered alongside an upload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RateCardMeta {
    #[validate(length(min = 1, message = "rate type name is required"))]
    #[serde(rename = "type")]
    pub card_type: String,
    #[validate(length(min = 1, message = "service is required"))]
    pub service: String,
    #[validate(length(min = 1, message = "original name is required"))]
    pub original_name: String,
    #[validate(range(min = 0.0, message = "covid charges must be non-negative"))]
    pub covid_charges: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "fuel charges must be a percentage"))]
    pub fuel_charges: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateCardIngestor {
    rate_type: RateType,
}

impl RateCardIngestor {
    pub fn new(rate_type: RateType) -> Self {
        Self { rate_type }
    }

    pub fn rate_type(&self) -> RateType {
        self.rate_type
    }

    /// Parse a bracket sheet: `[kg, price_zone1, price_zone2, ...]`.
    ///
    /// Zone keys are the positional column index of the price cell. Per-kg
    /// prices are converted to base prices (`round2(price * kg)`).
    pub fn ingest_brackets(&self, rows: &[Vec<Cell>]) -> BracketIngestion {
        let mut out = BracketIngestion::default();
        let mut seen_kg: Vec<f64> = Vec::new();

        for (idx, row) in rows.iter().enumerate().skip(1) {
            let row_no = idx + 1;
            if is_blank_row(row) {
                continue;
            }

            let kg = match row.first().and_then(Cell::as_number) {
                Some(kg) if kg > 0.0 => kg,
                Some(_) => {
                    debug!(row = row_no, "Bracket rejected: non-positive weight");
                    out.report
                        .reject(SheetKind::Brackets, row_no, "weight must be greater than 0");
                    continue;
                }
                None => {
                    debug!(row = row_no, "Bracket rejected: missing weight");
                    out.report
                        .reject(SheetKind::Brackets, row_no, "missing or non-numeric weight");
                    continue;
                }
            };

            let prices: BTreeMap<String, f64> = row
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(col, cell)| {
                    let price = cell.as_number().map(|p| self.normalize(p, kg))?;
                    (price > 0.0).then(|| (col.to_string(), price))
                })
                .collect();

            if prices.is_empty() {
                debug!(row = row_no, kg, "Bracket rejected: no zone rates");
                out.report
                    .reject(SheetKind::Brackets, row_no, "no valid zone rates found");
                continue;
            }

            if seen_kg.contains(&kg) {
                out.warnings.push(format!(
                    "row {}: weight {} kg already defined by an earlier row, which takes precedence",
                    row_no, kg
                ));
            }
            seen_kg.push(kg);

            out.report.accept(
                SheetKind::Brackets,
                row_no,
                format!("{} kg: {} zone rate(s)", kg, prices.len()),
            );
            out.rates.push(WeightBracket { kg, prices });
        }

        out
    }

    /// Parse a zone sheet: `[zoneId, "c1,c2,...", name1, value1, ...]`.
    pub fn ingest_zones(&self, rows: &[Vec<Cell>]) -> ZoneIngestion {
        let mut out = ZoneIngestion::default();
        let mut country_owner: HashMap<String, String> = HashMap::new();
        let mut zone_ids: BTreeSet<String> = BTreeSet::new();

        for (idx, row) in rows.iter().enumerate().skip(1) {
            let row_no = idx + 1;
            if is_blank_row(row) {
                continue;
            }

            let zone = row.first().map(Cell::as_text).unwrap_or_default();
            if zone.is_empty() {
                out.report.reject(SheetKind::Zones, row_no, "missing zone id");
                continue;
            }

            let raw_countries = row.get(1).map(Cell::as_text).unwrap_or_default();
            if raw_countries.is_empty() {
                out.report
                    .reject(SheetKind::Zones, row_no, format!("zone {}: missing country list", zone));
                continue;
            }

            let countries: Vec<String> = raw_countries
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if countries.is_empty() {
                out.report.reject(
                    SheetKind::Zones,
                    row_no,
                    format!("zone {}: country list has no entries", zone),
                );
                continue;
            }

            let extra_charges: BTreeMap<String, f64> = row
                .get(EXTRA_CHARGE_START..)
                .unwrap_or_default()
                .chunks(2)
                .filter_map(|pair| {
                    let name = pair.first().map(Cell::as_text).unwrap_or_default();
                    if name.is_empty() {
                        return None;
                    }
                    let value = pair.get(1).and_then(Cell::as_number).unwrap_or(0.0);
                    Some((name, round2(value)))
                })
                .collect();

            if !zone_ids.insert(zone.clone()) {
                out.warnings
                    .push(format!("row {}: zone {} is defined more than once", row_no, zone));
            }

            for country in &countries {
                let key = country.to_lowercase();
                match country_owner.get(&key) {
                    Some(owner) if owner != &zone => out.warnings.push(format!(
                        "row {}: {} is already listed in zone {}; zone {} takes precedence",
                        row_no, country, owner, owner
                    )),
                    Some(_) => {}
                    None => {
                        country_owner.insert(key, zone.clone());
                    }
                }
            }

            out.report.accept(
                SheetKind::Zones,
                row_no,
                format!(
                    "zone {}: {} countr{}, {} extra charge(s)",
                    zone,
                    countries.len(),
                    if countries.len() == 1 { "y" } else { "ies" },
                    extra_charges.len()
                ),
            );
            out.zones.push(Zone {
                zone,
                countries,
                extra_charges,
            });
        }

        out
    }

    /// Ingest both sheets and cross-check zone ids against price columns.
    pub fn ingest(&self, bracket_rows: &[Vec<Cell>], zone_rows: &[Vec<Cell>]) -> IngestionReport {
        let brackets = self.ingest_brackets(bracket_rows);
        let zones = self.ingest_zones(zone_rows);

        let price_columns: BTreeSet<&str> = brackets
            .rates
            .iter()
            .flat_map(|b| b.prices.keys().map(String::as_str))
            .collect();
        let zone_ids: BTreeSet<&str> = zones.zones.iter().map(|z| z.zone.as_str()).collect();

        let mut warnings = brackets.warnings;
        warnings.extend(zones.warnings);
        warnings.extend(
            zone_ids
                .difference(&price_columns)
                .map(|z| format!("zone {} has no price column", z)),
        );
        warnings.extend(
            price_columns
                .difference(&zone_ids)
                .map(|c| format!("price column {} has no zone definition", c)),
        );

        let mut accepted = brackets.report.accepted;
        accepted.extend(zones.report.accepted);
        let mut rejected = brackets.report.rejected;
        rejected.extend(zones.report.rejected);

        info!(
            rate_type = %self.rate_type,
            brackets = brackets.rates.len(),
            zones = zones.zones.len(),
            accepted = accepted.len(),
            rejected = rejected.len(),
            warnings = warnings.len(),
            "Rate sheets ingested"
        );

        IngestionReport {
            rates: brackets.rates,
            zones: zones.zones,
            accepted,
            rejected,
            warnings,
        }
    }

    /// Assemble a [`RateCard`] from an ingestion result.
    pub fn build_card(&self, meta: &RateCardMeta, report: &IngestionReport) -> DomainResult<RateCard> {
        validate_input(meta)?;
        if report.rates.is_empty() {
            return Err(DomainError::Precondition(
                "no valid weight brackets in upload".to_string(),
            ));
        }
        if report.zones.is_empty() {
            return Err(DomainError::Precondition("no valid zones in upload".to_string()));
        }

        Ok(RateCard {
            card_type: meta.card_type.trim().to_string(),
            service: meta.service.trim().to_string(),
            original_name: meta.original_name.trim().to_string(),
            covid_charges: meta.covid_charges,
            fuel_charges: meta.fuel_charges,
            rate_type: self.rate_type,
            brackets: report.rates.clone(),
            zones: report.zones.clone(),
        })
    }

    fn normalize(&self, price: f64, kg: f64) -> f64 {
        match self.rate_type {
            RateType::Base => round2(price),
            RateType::PerKg => round2(price * kg),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
