//! Invoice store interface

use async_trait::async_trait;

use super::model::{InvoicePayload, InvoiceReceipt};
use crate::shared::types::DomainResult;

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a bill; the store assigns the bill number.
    async fn create(&self, payload: &InvoicePayload) -> DomainResult<InvoiceReceipt>;
}
