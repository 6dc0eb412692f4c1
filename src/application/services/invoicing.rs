//! Invoice workflow: rate refresh and bill submission for a session

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::session::{InvoiceSession, ResolutionTicket};
use crate::domain::invoice::{InvoiceReceipt, InvoiceStore};
use crate::shared::types::DomainResult;

use super::charge_calculator::{ChargeBatch, ChargeCalculator};

pub struct InvoiceService {
    calculator: ChargeCalculator,
    invoices: Arc<dyn InvoiceStore>,
}

impl InvoiceService {
    pub fn new(calculator: ChargeCalculator, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self {
            calculator,
            invoices,
        }
    }

    /// Price a ticket's shipments. Does not touch the session, so callers
    /// may keep editing it while the batch runs.
    pub async fn resolve(&self, ticket: &ResolutionTicket) -> DomainResult<ChargeBatch> {
        self.calculator
            .compute(&ticket.shipments, &ticket.source, &ticket.tax)
            .await
    }

    /// Fetch rate-service prices for the filtered list and apply them.
    /// Returns the number of shipments that fell back to their own rate.
    /// Sessions on the embedded source have nothing to fetch.
    pub async fn refresh_rates(&self, session: &mut InvoiceSession) -> DomainResult<usize> {
        if !session.rate_source().is_external() {
            return Ok(0);
        }
        let ticket = session.begin_resolution()?;
        let batch = self.resolve(&ticket).await?;
        let fallbacks = batch.warnings.len();
        session.apply_resolution(ticket.epoch, batch)?;
        Ok(fallbacks)
    }

    /// Persist the bill for the current selection.
    ///
    /// On success the billed shipments are marked in the session and its
    /// selection is reset. On failure the session is left as it was.
    pub async fn submit(&self, session: &mut InvoiceSession) -> DomainResult<InvoiceReceipt> {
        let payload = session.build_invoice()?;

        let receipt = match self.invoices.create(&payload).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(awbs = payload.awbs.len(), error = %e, "Invoice submission failed");
                return Err(e);
            }
        };

        info!(
            bill_number = %receipt.bill_number,
            customer = %payload.billing_info.name,
            awbs = payload.awbs.len(),
            total = payload.total,
            "Invoice created"
        );
        session.complete_invoice(payload.awb_ids());
        Ok(receipt)
    }
}

// ── Tests ──────────────────────────────────────────────────────
