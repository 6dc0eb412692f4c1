use async_trait::async_trait;

use crate::domain::party::BillingParty;
use crate::domain::shipment::Shipment;
use crate::shared::types::DomainResult;

/// Read side of the back office used to seed an invoicing session.
#[async_trait]
pub trait BackOfficeSource: Send + Sync {
    async fn fetch_shipments(&self) -> DomainResult<Vec<Shipment>>;
    async fn fetch_clients(&self) -> DomainResult<Vec<BillingParty>>;
    async fn fetch_franchises(&self) -> DomainResult<Vec<BillingParty>>;
}
