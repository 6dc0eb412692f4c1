//! Rate card store interface

use async_trait::async_trait;

use super::model::{RateCard, RateCardPayload};
use crate::shared::types::DomainResult;

#[async_trait]
pub trait RateCardStore: Send + Sync {
    async fn save(&self, payload: &RateCardPayload) -> DomainResult<()>;
    async fn list(&self) -> DomainResult<Vec<RateCard>>;
    async fn find_by_name(&self, original_name: &str) -> DomainResult<Option<RateCard>>;
}
