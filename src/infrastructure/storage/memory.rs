//! In-memory back office

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    BackOfficeSource, BillingParty, DomainError, DomainResult, InvoicePayload, InvoiceReceipt,
    InvoiceStore, PartyKind, RateCard, RateCardPayload, RateCardStore, Shipment,
};

/// In-memory storage for offline runs and testing
pub struct InMemoryStorage {
    shipments: DashMap<String, Shipment>,
    parties: DashMap<String, BillingParty>,
    rate_cards: DashMap<Uuid, (u64, RateCard)>,
    invoices: DashMap<String, InvoicePayload>,
    upload_counter: AtomicU64,
    bill_counter: AtomicU64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            shipments: DashMap::new(),
            parties: DashMap::new(),
            rate_cards: DashMap::new(),
            invoices: DashMap::new(),
            upload_counter: AtomicU64::new(1),
            bill_counter: AtomicU64::new(1),
        }
    }

    pub fn with_shipments(self, shipments: impl IntoIterator<Item = Shipment>) -> Self {
        for shipment in shipments {
            self.shipments.insert(shipment.id.clone(), shipment);
        }
        self
    }

    pub fn with_parties(self, parties: impl IntoIterator<Item = BillingParty>) -> Self {
        for party in parties {
            self.parties.insert(party.ref_code.clone(), party);
        }
        self
    }

    pub fn invoice(&self, bill_number: &str) -> Option<InvoicePayload> {
        self.invoices.get(bill_number).map(|i| i.clone())
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    fn parties_of(&self, kind: PartyKind) -> Vec<BillingParty> {
        let mut parties: Vec<_> = self
            .parties
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.clone())
            .collect();
        parties.sort_by(|a, b| a.ref_code.cmp(&b.ref_code));
        parties
    }

    /// Cards in upload order.
    fn cards_in_order(&self) -> Vec<(u64, RateCard)> {
        let mut cards: Vec<_> = self.rate_cards.iter().map(|e| e.value().clone()).collect();
        cards.sort_by_key(|(seq, _)| *seq);
        cards
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackOfficeSource for InMemoryStorage {
    async fn fetch_shipments(&self) -> DomainResult<Vec<Shipment>> {
        let mut shipments: Vec<_> = self.shipments.iter().map(|s| s.clone()).collect();
        shipments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(shipments)
    }

    async fn fetch_clients(&self) -> DomainResult<Vec<BillingParty>> {
        Ok(self.parties_of(PartyKind::Client))
    }

    async fn fetch_franchises(&self) -> DomainResult<Vec<BillingParty>> {
        Ok(self.parties_of(PartyKind::Franchise))
    }
}

#[async_trait]
impl RateCardStore for InMemoryStorage {
    async fn save(&self, payload: &RateCardPayload) -> DomainResult<()> {
        if payload.original_name.trim().is_empty() {
            return Err(DomainError::Validation("originalName is required".to_string()));
        }
        let seq = self.upload_counter.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4();
        debug!(%id, original_name = %payload.original_name, "Rate card stored");
        self.rate_cards.insert(id, (seq, RateCard::from(payload.clone())));
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<RateCard>> {
        Ok(self.cards_in_order().into_iter().map(|(_, card)| card).collect())
    }

    /// Latest upload with that original name.
    async fn find_by_name(&self, original_name: &str) -> DomainResult<Option<RateCard>> {
        Ok(self
            .cards_in_order()
            .into_iter()
            .rev()
            .find(|(_, card)| card.original_name == original_name)
            .map(|(_, card)| card))
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStorage {
    async fn create(&self, payload: &InvoicePayload) -> DomainResult<InvoiceReceipt> {
        let already_billed: Vec<&str> = payload
            .awb_ids()
            .filter(|id| self.shipments.get(*id).is_some_and(|s| s.is_billed))
            .collect();
        if !already_billed.is_empty() {
            return Err(DomainError::Precondition(format!(
                "already billed: {}",
                already_billed.join(", ")
            )));
        }

        let bill_number = format!("INV-{:05}", self.bill_counter.fetch_add(1, Ordering::SeqCst));
        for id in payload.awb_ids() {
            if let Some(mut shipment) = self.shipments.get_mut(id) {
                shipment.is_billed = true;
            }
        }
        self.invoices.insert(bill_number.clone(), payload.clone());
        Ok(InvoiceReceipt { bill_number })
    }
}

// ── Tests ──────────────────────────────────────────────────────
