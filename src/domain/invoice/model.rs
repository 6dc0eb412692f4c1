//! Invoice totals and the persisted bill payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::charge::ComputedCharge;
use crate::domain::party::BillingParty;
use crate::domain::shipment::Shipment;
use crate::domain::tax::TaxSettings;
use crate::shared::types::round2;

/// Totals over the currently selected charge rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub gst_amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub total: f64,
    pub paid: f64,
    pub balance: f64,
}

impl InvoiceTotals {
    /// Recompute from scratch. Pure: the same inputs always give the same
    /// totals, however often it runs.
    pub fn compute<'a>(
        selected: impl IntoIterator<Item = &'a ComputedCharge>,
        tax: &TaxSettings,
        paid: f64,
    ) -> Self {
        let (subtotal, gst_amount, total) = selected
            .into_iter()
            .fold((0.0, 0.0, 0.0), |(s, g, t), c| (s + c.subtotal, g + c.gst_amount, t + c.total));
        let gst_amount = round2(gst_amount);
        let split = tax.split(gst_amount);
        let total = round2(total);
        Self {
            subtotal: round2(subtotal),
            gst_amount,
            cgst_amount: split.cgst_amount,
            sgst_amount: split.sgst_amount,
            igst_amount: split.igst_amount,
            total,
            paid,
            balance: round2(total - paid),
        }
    }
}

/// `billingInfo` block of the invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct BillingInfo {
    #[validate(length(min = 1, message = "billing name is required"))]
    pub name: String,
    pub address: String,
    pub gst: String,
}

impl From<&BillingParty> for BillingInfo {
    fn from(party: &BillingParty) -> Self {
        Self {
            name: party.name.clone(),
            address: party.address.clone(),
            gst: party.gst_number.clone(),
        }
    }
}

/// One AWB line on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub awb_id: String,
    pub date: DateTime<Utc>,
    pub tracking_number: String,
    pub consignee_name: String,
    pub weight: f64,
    pub country: String,
    pub service: String,
    pub base_charge: f64,
    pub fuel_surcharge: f64,
    pub other_charges: f64,
    pub subtotal: f64,
}

impl InvoiceLine {
    /// Other and profit charges are billed as one column.
    pub fn new(shipment: &Shipment, charge: &ComputedCharge) -> Self {
        Self {
            awb_id: shipment.id.clone(),
            date: shipment.date,
            tracking_number: shipment.tracking_number.clone(),
            consignee_name: shipment.consignee_name().to_string(),
            weight: charge.weight,
            country: shipment.country().to_string(),
            service: charge.service.clone(),
            base_charge: charge.base_charge,
            fuel_surcharge: charge.fuel_surcharge,
            other_charges: round2(charge.other_charges + charge.profit_charges),
            subtotal: charge.subtotal,
        }
    }
}

/// Body of `POST /billing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub billing_info: BillingInfo,
    pub awbs: Vec<InvoiceLine>,
    pub subtotal: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub total: f64,
    pub paid: f64,
    pub balance: f64,
}

impl InvoicePayload {
    pub fn new(billing_info: BillingInfo, awbs: Vec<InvoiceLine>, totals: &InvoiceTotals, tax: &TaxSettings) -> Self {
        Self {
            billing_info,
            awbs,
            subtotal: totals.subtotal,
            cgst: tax.cgst(),
            sgst: tax.sgst(),
            igst: tax.igst(),
            cgst_amount: totals.cgst_amount,
            sgst_amount: totals.sgst_amount,
            igst_amount: totals.igst_amount,
            total: totals.total,
            paid: totals.paid,
            balance: totals.balance,
        }
    }

    pub fn awb_ids(&self) -> impl Iterator<Item = &str> {
        self.awbs.iter().map(|l| l.awb_id.as_str())
    }
}

/// Bill created by the invoice store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReceipt {
    pub bill_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charge::ChargeComponents;

    fn row(id: &str, base: f64, tax: &TaxSettings) -> ComputedCharge {
        ComputedCharge::local(
            id,
            1.0,
            "DHL",
            ChargeComponents {
                base_charge: base,
                ..Default::default()
            },
            tax,
        )
    }

    #[test]
    fn totals_split_intra_state() {
        let tax = TaxSettings::intra_state(9.0, 9.0);
        let rows = [row("a", 600.0, &tax), row("b", 400.0, &tax)];
        let t = InvoiceTotals::compute(&rows, &tax, 180.0);
        assert_eq!(t.subtotal, 1000.0);
        assert_eq!(t.gst_amount, 180.0);
        assert_eq!((t.cgst_amount, t.sgst_amount, t.igst_amount), (90.0, 90.0, 0.0));
        assert_eq!(t.total, 1180.0);
        assert_eq!(t.balance, 1000.0);
    }

    #[test]
    fn totals_split_inter_state() {
        let tax = TaxSettings::inter_state(18.0);
        let rows = [row("a", 1000.0, &tax)];
        let t = InvoiceTotals::compute(&rows, &tax, 0.0);
        assert_eq!((t.cgst_amount, t.sgst_amount, t.igst_amount), (0.0, 0.0, 180.0));
        assert_eq!(t.total, 1180.0);
        assert_eq!(t.balance, 1180.0);
    }

    #[test]
    fn totals_are_idempotent_and_heads_add_up() {
        let tax = TaxSettings::intra_state(2.5, 2.5);
        let rows: Vec<_> = [333.33, 10.01, 0.07, 1234.56]
            .iter()
            .enumerate()
            .map(|(i, b)| row(&i.to_string(), *b, &tax))
            .collect();
        let first = InvoiceTotals::compute(&rows, &tax, 12.5);
        let second = InvoiceTotals::compute(&rows, &tax, 12.5);
        assert_eq!(first, second);
        let heads = first.cgst_amount + first.sgst_amount + first.igst_amount;
        assert!((heads - first.gst_amount).abs() < 1e-6);
    }

    #[test]
    fn empty_selection_has_zero_totals() {
        let t = InvoiceTotals::compute(std::iter::empty(), &TaxSettings::default(), 0.0);
        assert_eq!(t, InvoiceTotals::default());
    }

    #[test]
    fn payload_wire_format() {
        let tax = TaxSettings::intra_state(9.0, 9.0);
        let totals = InvoiceTotals::compute(std::iter::empty(), &tax, 0.0);
        let info = BillingInfo {
            name: "Acme".into(),
            address: "Pune".into(),
            gst: "27AAA".into(),
        };
        let json = serde_json::to_value(InvoicePayload::new(info, vec![], &totals, &tax)).unwrap();
        assert_eq!(json["billingInfo"]["name"], "Acme");
        assert_eq!(json["cgst"], 9.0);
        assert!(json.get("cgstAmount").is_some());
        assert!(json.get("awbs").unwrap().as_array().unwrap().is_empty());
    }
}
