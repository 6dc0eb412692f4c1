//! Shipment list filtering

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::shipment::Shipment;

/// Active filter predicates. Every set predicate must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentFilter {
    pub ref_code: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring of the tracking number
    pub tracking_number: Option<String>,
    /// Case-insensitive substring of the destination country
    pub country: Option<String>,
    pub hide_billed: bool,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

impl ShipmentFilter {
    /// Inclusive lower bound: start of `date_from` (UTC).
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.date_from.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Inclusive upper bound: `date_to` at 23:59:59.999 (UTC).
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| dt.and_utc())
    }

    pub fn matches(&self, shipment: &Shipment) -> bool {
        if self.hide_billed && shipment.is_billed {
            return false;
        }
        if let Some(ref_code) = self.ref_code.as_deref().filter(|r| !r.trim().is_empty()) {
            if shipment.ref_code.trim() != ref_code.trim() {
                return false;
            }
        }
        if let Some(start) = self.start_bound() {
            if shipment.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_bound() {
            if shipment.date > end {
                return false;
            }
        }
        contains_ci(&shipment.tracking_number, &self.tracking_number)
            && contains_ci(shipment.country(), &self.country)
    }

    /// Shipments passing the filter, in source order.
    pub fn apply<'a>(&self, shipments: &'a [Shipment]) -> Vec<&'a Shipment> {
        shipments
            .iter()
            .filter(|s| !(self.hide_billed && s.is_billed))
            .filter(|s| self.matches(s))
            .collect()
    }
}
