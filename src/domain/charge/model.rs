//! Per-shipment charge breakdown

use serde::{Deserialize, Serialize};

use crate::domain::ports::ResolvedRate;
use crate::domain::tax::TaxSettings;
use crate::shared::types::{coerce_number, round2, DomainError, DomainResult};

/// Manually editable columns of a locally priced charge row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeField {
    BaseCharge,
    FuelSurcharge,
    /// Combined "other + profit" column; editing it clears profit.
    OtherCharges,
}

impl std::fmt::Display for ChargeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseCharge => write!(f, "baseCharge"),
            Self::FuelSurcharge => write!(f, "fuelSurcharge"),
            Self::OtherCharges => write!(f, "otherCharges"),
        }
    }
}

/// Pre-tax components of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChargeComponents {
    pub base_charge: f64,
    pub fuel_surcharge: f64,
    pub other_charges: f64,
    pub profit_charges: f64,
}

impl ChargeComponents {
    pub fn gross(&self) -> f64 {
        self.base_charge + self.fuel_surcharge + self.other_charges + self.profit_charges
    }
}

/// Priced row for one shipment.
///
/// Rows priced locally are always fully derived from their components and
/// the current [`TaxSettings`]; rows from the rate service keep the GST the
/// service computed and only re-split it across heads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedCharge {
    pub shipment_id: String,
    pub weight: f64,
    pub service: String,
    pub base_charge: f64,
    pub fuel_surcharge: f64,
    pub other_charges: f64,
    pub profit_charges: f64,
    pub subtotal: f64,
    pub gst_amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub total: f64,
    pub is_from_external_resolution: bool,
    pub billed: bool,
}

impl ComputedCharge {
    /// Price a row from its own components.
    pub fn local(
        shipment_id: impl Into<String>,
        weight: f64,
        service: impl Into<String>,
        components: ChargeComponents,
        tax: &TaxSettings,
    ) -> Self {
        let mut charge = Self {
            shipment_id: shipment_id.into(),
            weight,
            service: service.into(),
            base_charge: components.base_charge,
            fuel_surcharge: components.fuel_surcharge,
            other_charges: components.other_charges,
            profit_charges: components.profit_charges,
            subtotal: 0.0,
            gst_amount: 0.0,
            cgst_amount: 0.0,
            sgst_amount: 0.0,
            igst_amount: 0.0,
            total: 0.0,
            is_from_external_resolution: false,
            billed: false,
        };
        charge.recompute(tax);
        charge
    }

    /// Adopt the rate service breakdown verbatim.
    pub fn resolved(
        shipment_id: impl Into<String>,
        fallback_weight: f64,
        rate: &ResolvedRate,
        tax: &TaxSettings,
    ) -> Self {
        let weight = if rate.calculated_weight > 0.0 {
            rate.calculated_weight
        } else {
            fallback_weight
        };
        let mut charge = Self {
            shipment_id: shipment_id.into(),
            weight,
            service: rate.service.clone(),
            base_charge: rate.base_rate,
            fuel_surcharge: rate.fuel_charges,
            other_charges: rate.extra_charge_total,
            profit_charges: rate.profit_charges,
            subtotal: rate.subtotal_before_gst,
            gst_amount: rate.gst_amount,
            cgst_amount: 0.0,
            sgst_amount: 0.0,
            igst_amount: 0.0,
            total: rate.total,
            is_from_external_resolution: true,
            billed: false,
        };
        charge.recompute(tax);
        charge
    }

    pub fn components(&self) -> ChargeComponents {
        ChargeComponents {
            base_charge: self.base_charge,
            fuel_surcharge: self.fuel_surcharge,
            other_charges: self.other_charges,
            profit_charges: self.profit_charges,
        }
    }

    pub fn is_editable(&self) -> bool {
        !self.is_from_external_resolution
    }

    /// Refresh derived amounts for the given tax settings.
    pub fn recompute(&mut self, tax: &TaxSettings) {
        if !self.is_from_external_resolution {
            let computed = tax.apply(self.components().gross());
            self.subtotal = computed.taxable_value;
            self.gst_amount = computed.gst_amount;
            self.total = computed.total;
        }
        let split = tax.split(self.gst_amount);
        self.cgst_amount = split.cgst_amount;
        self.sgst_amount = split.sgst_amount;
        self.igst_amount = split.igst_amount;
    }

    /// Apply a manual edit; malformed input reads as zero.
    pub fn apply_edit(&mut self, field: ChargeField, raw: &str, tax: &TaxSettings) -> DomainResult<()> {
        if !self.is_editable() {
            return Err(DomainError::ReadOnly(self.shipment_id.clone()));
        }
        let value = round2(coerce_number(raw));
        match field {
            ChargeField::BaseCharge => self.base_charge = value,
            ChargeField::FuelSurcharge => self.fuel_surcharge = value,
            ChargeField::OtherCharges => {
                self.other_charges = value;
                self.profit_charges = 0.0;
            }
        }
        self.recompute(tax);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(base: f64, fuel: f64, other: f64) -> ChargeComponents {
        ChargeComponents {
            base_charge: base,
            fuel_surcharge: fuel,
            other_charges: other,
            profit_charges: 0.0,
        }
    }

    fn resolved_rate() -> ResolvedRate {
        ResolvedRate {
            calculated_weight: 2.5,
            service: "FedEx IP".into(),
            base_rate: 2000.0,
            fuel_charges: 300.0,
            extra_charge_total: 100.0,
            profit_charges: 240.0,
            subtotal_before_gst: 2640.0,
            gst_amount: 475.2,
            total: 3115.2,
        }
    }

    #[test]
    fn local_row_derives_subtotal_and_gst() {
        let tax = TaxSettings::intra_state(9.0, 9.0);
        let c = ComputedCharge::local("a", 2.0, "DHL", components(800.0, 150.0, 50.0), &tax);
        assert_eq!(c.subtotal, 1000.0);
        assert_eq!(c.gst_amount, 180.0);
        assert_eq!(c.cgst_amount, 90.0);
        assert_eq!(c.sgst_amount, 90.0);
        assert_eq!(c.igst_amount, 0.0);
        assert_eq!(c.total, 1180.0);
        assert!(!c.is_from_external_resolution);
    }

    #[test]
    fn edit_triggers_full_recompute() {
        let tax = TaxSettings::inter_state(18.0);
        let mut c = ComputedCharge::local("a", 2.0, "DHL", components(800.0, 150.0, 50.0), &tax);
        c.apply_edit(ChargeField::BaseCharge, "1800", &tax).unwrap();
        assert_eq!(c.subtotal, 2000.0);
        assert_eq!(c.igst_amount, 360.0);
        assert_eq!(c.total, 2360.0);
    }

    #[test]
    fn malformed_edit_reads_as_zero() {
        let tax = TaxSettings::default();
        let mut c = ComputedCharge::local("a", 1.0, "DHL", components(100.0, 10.0, 5.0), &tax);
        c.apply_edit(ChargeField::FuelSurcharge, "ten", &tax).unwrap();
        assert_eq!(c.fuel_surcharge, 0.0);
        assert_eq!(c.total, 105.0);
    }

    #[test]
    fn other_charges_edit_clears_profit() {
        let tax = TaxSettings::default();
        let mut parts = components(100.0, 0.0, 5.0);
        parts.profit_charges = 20.0;
        let mut c = ComputedCharge::local("a", 1.0, "DHL", parts, &tax);
        assert_eq!(c.subtotal, 125.0);
        c.apply_edit(ChargeField::OtherCharges, "30", &tax).unwrap();
        assert_eq!(c.profit_charges, 0.0);
        assert_eq!(c.subtotal, 130.0);
    }

    #[test]
    fn resolved_rows_are_read_only_and_keep_service_gst() {
        let rate = resolved_rate();
        let mut c = ComputedCharge::resolved("a", 1.0, &rate, &TaxSettings::intra_state(9.0, 9.0));
        assert_eq!(c.weight, 2.5);
        assert_eq!(c.gst_amount, 475.2);
        assert_eq!(c.cgst_amount + c.sgst_amount, 475.2);

        let err = c.apply_edit(ChargeField::BaseCharge, "1", &TaxSettings::default()).unwrap_err();
        assert!(matches!(err, DomainError::ReadOnly(_)));

        // tax change re-splits but does not re-derive
        c.recompute(&TaxSettings::inter_state(5.0));
        assert_eq!(c.gst_amount, 475.2);
        assert_eq!(c.igst_amount, 475.2);
        assert_eq!(c.total, 3115.2);
    }

    #[test]
    fn inclusive_mode_for_local_rows() {
        let tax = TaxSettings::inter_state(18.0).with_include_gst(true);
        let c = ComputedCharge::local("a", 1.0, "DHL", components(1180.0, 0.0, 0.0), &tax);
        assert_eq!(c.subtotal, 1000.0);
        assert_eq!(c.gst_amount, 180.0);
        assert_eq!(c.total, 1180.0);
    }
}
