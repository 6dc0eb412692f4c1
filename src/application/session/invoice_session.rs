//! Invoicing session
//!
//! Owns everything one billing screen works on: the shipment list, filters,
//! selection, tax settings, charge rows and totals. Every mutation runs the
//! same pipeline (filtered list → charge rows → totals) to completion before
//! returning, so readers never observe a half-updated state.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use super::filter::ShipmentFilter;
use crate::application::services::{ChargeBatch, ChargeCalculator, RateSource};
use crate::domain::charge::{ChargeField, ComputedCharge};
use crate::domain::invoice::{BillingInfo, InvoiceLine, InvoicePayload, InvoiceTotals};
use crate::domain::party::BillingParty;
use crate::domain::shipment::Shipment;
use crate::domain::tax::TaxSettings;
use crate::shared::types::{coerce_number, round2, DomainError, DomainResult};
use crate::shared::validations::validate_input;

/// Snapshot handed to a rate-service batch. The batch result can only be
/// applied while the session is still at `epoch`.
#[derive(Debug, Clone)]
pub struct ResolutionTicket {
    pub epoch: u64,
    pub shipments: Vec<Shipment>,
    pub source: RateSource,
    pub tax: TaxSettings,
}

#[derive(Debug, Clone)]
pub struct InvoiceSession {
    shipments: Vec<Shipment>,
    filter: ShipmentFilter,
    party: Option<BillingParty>,
    billing_info: BillingInfo,
    tax: TaxSettings,
    rate_source: RateSource,
    selection: BTreeSet<String>,
    select_all: bool,
    paid: f64,
    epoch: u64,

    // derived
    filtered: Vec<String>,
    charges: HashMap<String, ComputedCharge>,
    warnings: Vec<String>,
    totals: InvoiceTotals,
}

impl InvoiceSession {
    pub fn new(shipments: Vec<Shipment>, tax: TaxSettings) -> Self {
        let mut session = Self {
            shipments,
            filter: ShipmentFilter::default(),
            party: None,
            billing_info: BillingInfo::default(),
            tax,
            rate_source: RateSource::Embedded,
            selection: BTreeSet::new(),
            select_all: false,
            paid: 0.0,
            epoch: 0,
            filtered: Vec::new(),
            charges: HashMap::new(),
            warnings: Vec::new(),
            totals: InvoiceTotals::default(),
        };
        session.refresh();
        session
    }

    // ── Read side ──────────────────────────────────────────────

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    pub fn filter(&self) -> &ShipmentFilter {
        &self.filter
    }

    pub fn party(&self) -> Option<&BillingParty> {
        self.party.as_ref()
    }

    pub fn billing_info(&self) -> &BillingInfo {
        &self.billing_info
    }

    pub fn tax(&self) -> &TaxSettings {
        &self.tax
    }

    pub fn rate_source(&self) -> &RateSource {
        &self.rate_source
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, shipment_id: &str) -> bool {
        self.selection.contains(shipment_id)
    }

    /// Ids passing the current filter, in list order.
    pub fn filtered_ids(&self) -> &[String] {
        &self.filtered
    }

    pub fn filtered_shipments(&self) -> Vec<&Shipment> {
        self.filtered
            .iter()
            .filter_map(|id| self.shipment(id))
            .collect()
    }

    pub fn shipment(&self, shipment_id: &str) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.id == shipment_id)
    }

    pub fn charge(&self, shipment_id: &str) -> Option<&ComputedCharge> {
        self.charges.get(shipment_id)
    }

    /// Charge rows for the filtered list, in list order.
    pub fn charges(&self) -> Vec<&ComputedCharge> {
        self.filtered
            .iter()
            .filter_map(|id| self.charges.get(id))
            .collect()
    }

    /// Filtered shipments that still wait for a rate-service price.
    pub fn pending_ids(&self) -> Vec<&str> {
        self.filtered
            .iter()
            .filter(|id| !self.charges.contains_key(*id))
            .map(String::as_str)
            .collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    // ── Inputs ─────────────────────────────────────────────────

    /// Replace the shipment list (e.g. after a reload).
    pub fn set_shipments(&mut self, shipments: Vec<Shipment>) {
        self.shipments = shipments;
        self.charges.clear();
        self.warnings.clear();
        self.bump_epoch();
        self.refresh();
    }

    /// Replace the filter. The selection is pruned to the new filtered set
    /// and "select all" is cleared.
    pub fn set_filter(&mut self, filter: ShipmentFilter) {
        self.filter = filter;
        self.select_all = false;
        self.bump_epoch();
        self.refresh();
    }

    pub fn update_filter(&mut self, update: impl FnOnce(&mut ShipmentFilter)) {
        let mut filter = self.filter.clone();
        update(&mut filter);
        self.set_filter(filter);
    }

    /// Select the client or franchise to bill. Filters the list to its
    /// shipments and fills the billing info from its record.
    pub fn select_party(&mut self, party: Option<BillingParty>) {
        self.billing_info = party.as_ref().map(BillingInfo::from).unwrap_or_default();
        let ref_code = party.as_ref().map(|p| p.ref_code.clone());
        self.party = party;
        self.update_filter(|f| f.ref_code = ref_code);
    }

    pub fn set_billing_info(&mut self, billing_info: BillingInfo) {
        self.billing_info = billing_info;
    }

    pub fn set_tax(&mut self, tax: TaxSettings) {
        if tax.profit_percent() != self.tax.profit_percent() && self.rate_source.is_external() {
            // profit is part of every rate-service query; priced rows are
            // stale until the next batch
            self.charges.retain(|_, charge| charge.billed);
            self.warnings.clear();
            self.bump_epoch();
        }
        self.tax = tax;
        self.refresh();
    }

    pub fn update_tax(&mut self, update: impl FnOnce(&mut TaxSettings)) {
        let mut tax = self.tax;
        update(&mut tax);
        self.set_tax(tax);
    }

    /// Switch the rate source. All charge rows are discarded; embedded rows
    /// are rebuilt immediately, rate-service rows wait for a batch.
    pub fn set_rate_source(&mut self, source: RateSource) {
        self.rate_source = source;
        self.charges.clear();
        self.warnings.clear();
        self.bump_epoch();
        self.refresh();
    }

    /// Toggle one shipment. Ids outside the filtered list are ignored.
    pub fn select(&mut self, shipment_id: &str, selected: bool) {
        if !self.filtered.iter().any(|id| id == shipment_id) {
            debug!(shipment_id, "Ignoring selection of filtered-out shipment");
            return;
        }
        if selected {
            self.selection.insert(shipment_id.to_string());
            self.select_all = self.selection.len() == self.filtered.len();
        } else {
            self.selection.remove(shipment_id);
            self.select_all = false;
        }
        self.refresh();
    }

    /// "Select all" selects exactly the filtered list; clearing it empties
    /// the selection.
    pub fn set_select_all(&mut self, select_all: bool) {
        self.select_all = select_all;
        self.selection = if select_all {
            self.filtered.iter().cloned().collect()
        } else {
            BTreeSet::new()
        };
        self.refresh();
    }

    /// Amount already paid; kept across recomputes. Malformed input reads
    /// as zero.
    pub fn set_paid(&mut self, raw: &str) {
        self.paid = round2(coerce_number(raw).max(0.0));
        self.refresh();
    }

    /// Manual edit of a locally priced row.
    pub fn edit_charge(&mut self, shipment_id: &str, field: ChargeField, raw: &str) -> DomainResult<()> {
        let charge = self
            .charges
            .get_mut(shipment_id)
            .ok_or_else(|| DomainError::NotFound {
                entity: "Charge",
                field: "shipment_id",
                value: shipment_id.to_string(),
            })?;
        charge.apply_edit(field, raw, &self.tax)?;
        debug!(shipment_id, %field, value = raw, "Charge edited");
        self.refresh();
        Ok(())
    }

    // ── Rate-service batches ───────────────────────────────────

    /// Start a rate-service batch for the filtered list. Any earlier batch
    /// becomes stale.
    pub fn begin_resolution(&mut self) -> DomainResult<ResolutionTicket> {
        match &self.rate_source {
            RateSource::RateMaster { rate_type } if !rate_type.trim().is_empty() => {}
            RateSource::RateMaster { .. } => {
                return Err(DomainError::Precondition("no rate type selected".to_string()))
            }
            RateSource::Embedded => {
                return Err(DomainError::Precondition(
                    "rate source is not the rate master".to_string(),
                ))
            }
        }
        self.bump_epoch();
        Ok(ResolutionTicket {
            epoch: self.epoch,
            shipments: self.filtered_shipments().into_iter().cloned().collect(),
            source: self.rate_source.clone(),
            tax: self.tax,
        })
    }

    /// Apply a finished batch. A batch started before the latest input
    /// change is discarded and the session is left untouched.
    pub fn apply_resolution(&mut self, ticket_epoch: u64, batch: ChargeBatch) -> DomainResult<()> {
        if ticket_epoch != self.epoch {
            info!(batch = ticket_epoch, current = self.epoch, "Discarding stale rate batch");
            return Err(DomainError::StaleBatch {
                batch: ticket_epoch,
                current: self.epoch,
            });
        }
        for charge in batch.charges {
            self.charges.insert(charge.shipment_id.clone(), charge);
        }
        self.warnings = batch.warnings;
        self.refresh();
        Ok(())
    }

    // ── Invoice emission ───────────────────────────────────────

    /// Build the bill for the current selection.
    pub fn build_invoice(&self) -> DomainResult<InvoicePayload> {
        if self.party.is_none() {
            return Err(DomainError::Precondition(
                "no client or franchise selected".to_string(),
            ));
        }
        if self.selection.is_empty() {
            return Err(DomainError::Precondition("no shipments selected".to_string()));
        }
        validate_input(&self.billing_info)?;

        let mut lines = Vec::with_capacity(self.selection.len());
        let mut unpriced = Vec::new();
        for id in self.filtered.iter().filter(|id| self.selection.contains(*id)) {
            match (self.shipment(id), self.charges.get(id)) {
                (Some(shipment), Some(charge)) => lines.push(InvoiceLine::new(shipment, charge)),
                _ => unpriced.push(id.as_str()),
            }
        }
        if !unpriced.is_empty() {
            return Err(DomainError::Precondition(format!(
                "rates pending for {} selected shipment(s): {}",
                unpriced.len(),
                unpriced.join(", ")
            )));
        }

        Ok(InvoicePayload::new(
            self.billing_info.clone(),
            lines,
            &self.totals,
            &self.tax,
        ))
    }

    /// Record a persisted bill: mark its shipments billed and reset the
    /// selection, payment and billing info.
    pub fn complete_invoice<'a>(&mut self, awb_ids: impl IntoIterator<Item = &'a str>) {
        let billed: BTreeSet<&str> = awb_ids.into_iter().collect();
        for shipment in self.shipments.iter_mut().filter(|s| billed.contains(s.id.as_str())) {
            shipment.is_billed = true;
        }
        for charge in self.charges.values_mut().filter(|c| billed.contains(c.shipment_id.as_str())) {
            charge.billed = true;
        }

        self.selection.clear();
        self.select_all = false;
        self.paid = 0.0;
        self.party = None;
        self.billing_info = BillingInfo::default();
        self.filter.ref_code = None;
        self.bump_epoch();
        self.refresh();
    }

    // ── Pipeline ───────────────────────────────────────────────

    fn bump_epoch(&mut self) {
        self.epoch += 1;
    }

    /// filtered list → charge rows → totals.
    fn refresh(&mut self) {
        self.filtered = self
            .filter
            .apply(&self.shipments)
            .into_iter()
            .map(|s| s.id.clone())
            .collect();

        let visible: BTreeSet<&str> = self.filtered.iter().map(String::as_str).collect();
        self.selection.retain(|id| visible.contains(id.as_str()));
        if self.select_all && self.selection.len() != self.filtered.len() {
            self.select_all = false;
        }

        if !self.rate_source.is_external() {
            for shipment in self.shipments.iter().filter(|s| visible.contains(s.id.as_str())) {
                self.charges
                    .entry(shipment.id.clone())
                    .or_insert_with(|| ChargeCalculator::embedded_charge(shipment, &self.tax));
            }
        }
        for charge in self.charges.values_mut() {
            charge.recompute(&self.tax);
        }

        self.totals = compute_totals(&self.selection, &self.charges, &self.tax, self.paid);
    }
}

/// Totals over the selected rows.
fn compute_totals(
    selection: &BTreeSet<String>,
    charges: &HashMap<String, ComputedCharge>,
    tax: &TaxSettings,
    paid: f64,
) -> InvoiceTotals {
    InvoiceTotals::compute(
        selection.iter().filter_map(|id| charges.get(id)),
        tax,
        paid,
    )
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::party::PartyKind;
    use crate::domain::ports::ResolvedRate;
    use crate::domain::shipment::{RateInfo, Receiver};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn shipment(id: &str, ref_code: &str, day: u32, base: f64) -> Shipment {
        Shipment {
            id: id.into(),
            tracking_number: format!("AWB{id}"),
            date: Utc.with_ymd_and_hms(2024, 3, day, 10, 0, 0).unwrap(),
            receiver: Receiver {
                name: Some(format!("Consignee {id}")),
                country: Some("Germany".into()),
            },
            boxes: vec![],
            our_boxes: vec![],
            vendor_boxes: vec![],
            ref_code: ref_code.into(),
            rate_info: Some(RateInfo {
                weight: 2.0,
                courier: Some("DHL".into()),
                service: None,
                base_charge: base,
                fuel_surcharge: 0.0,
                other_charges: 0.0,
            }),
            is_billed: false,
        }
    }

    fn session() -> InvoiceSession {
        InvoiceSession::new(
            vec![
                shipment("1", "CL1", 1, 1000.0),
                shipment("2", "CL1", 5, 500.0),
                shipment("3", "CL2", 9, 200.0),
            ],
            TaxSettings::intra_state(9.0, 9.0),
        )
    }

    fn acme() -> BillingParty {
        let mut party = BillingParty::new(PartyKind::Client, "CL1", "Acme Exports");
        party.address = "Pune".into();
        party
    }

    fn resolved(total: f64) -> ResolvedRate {
        ResolvedRate {
            calculated_weight: 3.0,
            service: "Express".into(),
            base_rate: total,
            fuel_charges: 0.0,
            extra_charge_total: 0.0,
            profit_charges: 0.0,
            subtotal_before_gst: total,
            gst_amount: 0.0,
            total,
        }
    }

    #[test]
    fn embedded_rows_exist_for_every_filtered_shipment() {
        let s = session();
        assert_eq!(s.filtered_ids(), ["1", "2", "3"]);
        assert_eq!(s.charges().len(), 3);
        assert!(s.pending_ids().is_empty());
        assert_eq!(s.totals().total, 0.0);
    }

    #[test]
    fn totals_follow_selection_and_tax() {
        let mut s = session();
        s.select("1", true);
        s.select("2", true);
        assert_eq!(s.totals().subtotal, 1500.0);
        assert_eq!(s.totals().gst_amount, 270.0);
        assert_eq!(s.totals().cgst_amount, 135.0);
        assert_eq!(s.totals().total, 1770.0);
        assert!(!s.is_select_all());

        s.update_tax(|t| t.set_igst(18.0));
        assert_eq!(s.totals().igst_amount, 270.0);
        assert_eq!(s.totals().cgst_amount, 0.0);
        assert_eq!(s.totals().total, 1770.0);

        s.set_paid("1000");
        assert_eq!(s.totals().balance, 770.0);
        s.set_paid("lots");
        assert_eq!(s.totals().balance, 1770.0);
    }

    #[test]
    fn select_all_covers_exactly_the_filtered_list() {
        let mut s = session();
        s.select_party(Some(acme()));
        s.set_select_all(true);
        assert_eq!(s.selection().len(), 2);
        assert!(s.is_select_all());

        s.select("2", false);
        assert!(!s.is_select_all());
        assert!(s.is_selected("1"));

        s.set_select_all(false);
        assert!(s.selection().is_empty());
    }

    #[test]
    fn filter_change_prunes_selection() {
        let mut s = session();
        s.set_select_all(true);
        s.update_filter(|f| f.date_from = NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(s.filtered_ids(), ["2", "3"]);
        assert!(!s.is_selected("1"));
        assert!(!s.is_select_all());
        assert_eq!(s.totals().subtotal, 700.0);
    }

    #[test]
    fn selecting_a_filtered_out_shipment_is_ignored() {
        let mut s = session();
        s.select_party(Some(acme()));
        s.select("3", true);
        assert!(s.selection().is_empty());
    }

    #[test]
    fn party_selection_fills_billing_info() {
        let mut s = session();
        s.select_party(Some(acme()));
        assert_eq!(s.billing_info().name, "Acme Exports");
        assert_eq!(s.billing_info().address, "Pune");
        assert_eq!(s.filtered_ids(), ["1", "2"]);

        s.select_party(None);
        assert_eq!(s.billing_info(), &BillingInfo::default());
        assert_eq!(s.filtered_ids().len(), 3);
    }

    #[test]
    fn edits_recompute_row_and_totals() {
        let mut s = session();
        s.select("2", true);
        s.edit_charge("2", ChargeField::FuelSurcharge, "100").unwrap();
        assert_eq!(s.charge("2").unwrap().subtotal, 600.0);
        assert_eq!(s.totals().total, 708.0);

        let err = s.edit_charge("missing", ChargeField::BaseCharge, "1").unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn rate_master_rows_wait_for_a_batch() {
        let mut s = session();
        s.set_rate_source(RateSource::rate_master("Express"));
        assert_eq!(s.pending_ids().len(), 3);

        let ticket = s.begin_resolution().unwrap();
        assert_eq!(ticket.shipments.len(), 3);
        let batch = ChargeBatch {
            charges: ticket
                .shipments
                .iter()
                .map(|sh| ComputedCharge::resolved(sh.id.clone(), 2.0, &resolved(1180.0), &ticket.tax))
                .collect(),
            warnings: vec![],
        };
        s.apply_resolution(ticket.epoch, batch).unwrap();
        assert!(s.pending_ids().is_empty());
        assert!(s.charge("1").unwrap().is_from_external_resolution);

        let err = s.edit_charge("1", ChargeField::BaseCharge, "5").unwrap_err();
        assert!(matches!(err, DomainError::ReadOnly(_)));
    }

    #[test]
    fn batch_started_before_a_filter_change_is_discarded() {
        let mut s = session();
        s.set_rate_source(RateSource::rate_master("Express"));
        let ticket = s.begin_resolution().unwrap();

        s.update_filter(|f| f.ref_code = Some("CL2".into()));
        let batch = ChargeBatch {
            charges: vec![ComputedCharge::resolved("1", 2.0, &resolved(999.0), &ticket.tax)],
            warnings: vec!["late".into()],
        };
        let err = s.apply_resolution(ticket.epoch, batch).unwrap_err();
        assert!(matches!(err, DomainError::StaleBatch { .. }));
        assert!(s.charge("1").is_none());
        assert!(s.warnings().is_empty());
    }

    #[test]
    fn profit_change_on_rate_master_returns_rows_to_pending() {
        let mut s = session();
        s.select_party(Some(acme()));
        s.update_tax(|t| t.set_profit_percent(10.0));
        s.set_rate_source(RateSource::rate_master("Express"));
        let ticket = s.begin_resolution().unwrap();
        let batch = ChargeBatch {
            charges: ticket
                .shipments
                .iter()
                .map(|sh| ComputedCharge::resolved(sh.id.clone(), 2.0, &resolved(1298.0), &ticket.tax))
                .collect(),
            warnings: vec!["fallback for T-9".into()],
        };
        s.apply_resolution(ticket.epoch, batch).unwrap();
        s.select("1", true);
        assert!(s.build_invoice().is_ok());

        s.update_tax(|t| t.set_profit_percent(50.0));
        assert!(s.charge("1").is_none());
        assert!(s.pending_ids().contains(&"1"));
        assert!(s.warnings().is_empty());
        assert_eq!(s.totals().total, 0.0);
        let err = s.build_invoice().unwrap_err();
        assert!(err.to_string().contains("rates pending"));

        let late = ChargeBatch {
            charges: vec![ComputedCharge::resolved("1", 2.0, &resolved(1298.0), &ticket.tax)],
            warnings: vec![],
        };
        assert!(matches!(
            s.apply_resolution(ticket.epoch, late),
            Err(DomainError::StaleBatch { .. })
        ));
    }

    #[test]
    fn profit_change_keeps_embedded_rows() {
        let mut s = session();
        s.update_tax(|t| t.set_profit_percent(25.0));
        assert!(s.pending_ids().is_empty());
        assert!(s.charge("1").is_some());
    }

    #[test]
    fn newer_batch_supersedes_older_one() {
        let mut s = session();
        s.set_rate_source(RateSource::rate_master("Express"));
        let first = s.begin_resolution().unwrap();
        let second = s.begin_resolution().unwrap();
        assert!(s.apply_resolution(first.epoch, ChargeBatch::default()).is_err());
        assert!(s.apply_resolution(second.epoch, ChargeBatch::default()).is_ok());
    }

    #[test]
    fn resolution_needs_a_rate_type() {
        let mut s = session();
        assert!(matches!(s.begin_resolution(), Err(DomainError::Precondition(_))));
        s.set_rate_source(RateSource::rate_master(""));
        assert!(matches!(s.begin_resolution(), Err(DomainError::Precondition(_))));
    }

    #[test]
    fn build_invoice_checks_preconditions() {
        let mut s = session();
        let err = s.build_invoice().unwrap_err();
        assert!(err.to_string().contains("no client or franchise"));

        s.select_party(Some(acme()));
        let err = s.build_invoice().unwrap_err();
        assert!(err.to_string().contains("no shipments selected"));

        s.select("1", true);
        s.set_billing_info(BillingInfo::default());
        assert!(matches!(s.build_invoice(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn build_invoice_refuses_pending_rows() {
        let mut s = session();
        s.select_party(Some(acme()));
        s.set_rate_source(RateSource::rate_master("Express"));
        s.select("1", true);
        let err = s.build_invoice().unwrap_err();
        assert!(err.to_string().contains("rates pending"));
    }

    #[test]
    fn invoice_carries_lines_and_totals() {
        let mut s = session();
        s.select_party(Some(acme()));
        s.set_select_all(true);
        s.set_paid("500");
        let invoice = s.build_invoice().unwrap();
        assert_eq!(invoice.awbs.len(), 2);
        assert_eq!(invoice.billing_info.name, "Acme Exports");
        assert_eq!(invoice.subtotal, 1500.0);
        assert_eq!(invoice.total, 1770.0);
        assert_eq!(invoice.balance, 1270.0);
        assert_eq!(invoice.awb_ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn completing_an_invoice_marks_billed_and_resets() {
        let mut s = session();
        s.update_filter(|f| f.hide_billed = true);
        s.select_party(Some(acme()));
        s.set_select_all(true);
        s.set_paid("10");
        s.complete_invoice(["1", "2"]);

        assert!(s.shipment("1").unwrap().is_billed);
        assert!(s.selection().is_empty());
        assert!(s.party().is_none());
        assert_eq!(s.totals().paid, 0.0);
        assert_eq!(s.filtered_ids(), ["3"]);
    }
}
