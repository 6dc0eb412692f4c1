//! Initial workspace load

use tracing::info;

use crate::application::session::InvoiceSession;
use crate::domain::party::BillingParty;
use crate::domain::ports::BackOfficeSource;
use crate::domain::rate_card::{RateCard, RateCardStore};
use crate::domain::shipment::Shipment;
use crate::domain::tax::TaxSettings;
use crate::shared::types::DomainResult;

/// Everything an invoicing screen needs up front.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    pub shipments: Vec<Shipment>,
    pub clients: Vec<BillingParty>,
    pub franchises: Vec<BillingParty>,
    pub rate_cards: Vec<RateCard>,
}

impl WorkspaceSnapshot {
    /// Fetch all four collections concurrently. Any failure fails the load.
    pub async fn load(source: &dyn BackOfficeSource, rate_cards: &dyn RateCardStore) -> DomainResult<Self> {
        let (shipments, clients, franchises, rate_cards) = tokio::try_join!(
            source.fetch_shipments(),
            source.fetch_clients(),
            source.fetch_franchises(),
            rate_cards.list(),
        )?;

        info!(
            shipments = shipments.len(),
            clients = clients.len(),
            franchises = franchises.len(),
            rate_cards = rate_cards.len(),
            "Workspace loaded"
        );
        Ok(Self {
            shipments,
            clients,
            franchises,
            rate_cards,
        })
    }

    pub fn parties(&self) -> impl Iterator<Item = &BillingParty> {
        self.clients.iter().chain(self.franchises.iter())
    }

    /// Client or franchise by reference code (exact match).
    pub fn find_party(&self, ref_code: &str) -> Option<&BillingParty> {
        self.parties().find(|p| p.ref_code == ref_code)
    }

    pub fn into_session(self, tax: TaxSettings) -> InvoiceSession {
        InvoiceSession::new(self.shipments, tax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::party::PartyKind;
    use crate::infrastructure::InMemoryStorage;
    use crate::shared::types::DomainError;
    use async_trait::async_trait;

    struct Source {
        fail_franchises: bool,
    }

    #[async_trait]
    impl BackOfficeSource for Source {
        async fn fetch_shipments(&self) -> DomainResult<Vec<Shipment>> {
            Ok(vec![])
        }

        async fn fetch_clients(&self) -> DomainResult<Vec<BillingParty>> {
            Ok(vec![BillingParty::new(PartyKind::Client, "CL1", "Acme")])
        }

        async fn fetch_franchises(&self) -> DomainResult<Vec<BillingParty>> {
            if self.fail_franchises {
                return Err(DomainError::Persistence("franchises unavailable".into()));
            }
            Ok(vec![BillingParty::new(PartyKind::Franchise, "FR1", "North Hub")])
        }
    }

    #[tokio::test]
    async fn loads_and_finds_parties_of_both_kinds() {
        let storage = InMemoryStorage::new();
        let snapshot = WorkspaceSnapshot::load(&Source { fail_franchises: false }, &storage)
            .await
            .unwrap();
        assert_eq!(snapshot.find_party("FR1").unwrap().kind, PartyKind::Franchise);
        assert_eq!(snapshot.find_party("CL1").unwrap().name, "Acme");
        assert!(snapshot.find_party("XX").is_none());
    }

    #[tokio::test]
    async fn any_failed_fetch_fails_the_load() {
        let storage = InMemoryStorage::new();
        let err = WorkspaceSnapshot::load(&Source { fail_franchises: true }, &storage)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("franchises unavailable"));
    }
}
