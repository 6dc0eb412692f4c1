//! Rate card upload and lookup

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ingest::{Cell, IngestionReport, RateCardIngestor, RateCardMeta};
use crate::domain::rate_card::{RateCard, RateCardPayload, RateCardStore, RateType};
use crate::shared::types::{DomainError, DomainResult};

/// A stored upload together with the row-level report it came from.
#[derive(Debug, Clone)]
pub struct RateCardUpload {
    pub card: RateCard,
    pub report: IngestionReport,
}

/// Service for rate card operations
pub struct RateCardService {
    store: Arc<dyn RateCardStore>,
}

impl RateCardService {
    pub fn new(store: Arc<dyn RateCardStore>) -> Self {
        Self { store }
    }

    /// Ingest both sheets without storing anything.
    pub fn preview(&self, rate_type: RateType, bracket_rows: &[Vec<Cell>], zone_rows: &[Vec<Cell>]) -> IngestionReport {
        RateCardIngestor::new(rate_type).ingest(bracket_rows, zone_rows)
    }

    /// Ingest, build and persist a rate card.
    ///
    /// Fails before contacting the store when the metadata is incomplete
    /// or either sheet yields nothing usable. A store failure carries the
    /// back office's message.
    pub async fn upload(
        &self,
        meta: &RateCardMeta,
        rate_type: RateType,
        bracket_rows: &[Vec<Cell>],
        zone_rows: &[Vec<Cell>],
    ) -> DomainResult<RateCardUpload> {
        let ingestor = RateCardIngestor::new(rate_type);
        let report = ingestor.ingest(bracket_rows, zone_rows);
        let card = ingestor.build_card(meta, &report)?;

        let payload = RateCardPayload::from(&card);
        if let Err(e) = self.store.save(&payload).await {
            warn!(rate_card = %card.key(), error = %e, "Rate card upload rejected");
            return Err(e);
        }

        info!(
            rate_card = %card.key(),
            rate_type = %rate_type,
            brackets = card.brackets.len(),
            zones = card.zones.len(),
            rejected = report.rejected.len(),
            "Rate card uploaded"
        );
        Ok(RateCardUpload { card, report })
    }

    pub async fn list(&self) -> DomainResult<Vec<RateCard>> {
        self.store.list().await
    }

    /// Distinct rate type names, used to pick a rate-master source.
    pub async fn rate_types(&self) -> DomainResult<Vec<String>> {
        let cards = self.store.list().await?;
        let names: BTreeSet<String> = cards
            .into_iter()
            .map(|c| c.card_type)
            .filter(|t| !t.trim().is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn get(&self, original_name: &str) -> DomainResult<RateCard> {
        self.store
            .find_by_name(original_name)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "RateCard",
                field: "original_name",
                value: original_name.to_string(),
            })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStorage;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<Cell>> {
        cells
            .iter()
            .map(|r| r.iter().map(|c| Cell::from(*c)).collect())
            .collect()
    }

    fn brackets() -> Vec<Vec<Cell>> {
        rows(&[&["kg", "z1", "z2"], &["0.5", "1000", "1200"], &["1", "1500", "1800"], &["x", "1", "2"]])
    }

    fn zones() -> Vec<Vec<Cell>> {
        rows(&[&["zone", "countries"], &["1", "France, Germany"], &["2", "Japan"]])
    }

    fn meta() -> RateCardMeta {
        RateCardMeta {
            card_type: "Express".into(),
            service: "DHL".into(),
            original_name: "dhl-2024.xlsx".into(),
            covid_charges: 0.0,
            fuel_charges: 12.0,
        }
    }

    #[tokio::test]
    async fn upload_stores_card_and_reports_rejections() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = RateCardService::new(storage.clone());

        let upload = service
            .upload(&meta(), RateType::Base, &brackets(), &zones())
            .await
            .unwrap();
        assert_eq!(upload.card.brackets.len(), 2);
        assert_eq!(upload.report.rejected.len(), 1);

        let stored = service.get("dhl-2024.xlsx").await.unwrap();
        assert_eq!(stored.zones.len(), 2);
        assert_eq!(service.rate_types().await.unwrap(), vec!["Express".to_string()]);
    }

    #[tokio::test]
    async fn incomplete_metadata_never_reaches_the_store() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = RateCardService::new(storage.clone());
        let mut m = meta();
        m.service = String::new();

        let err = service
            .upload(&m, RateType::Base, &brackets(), &zones())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_zone_sheet_is_a_precondition_failure() {
        let service = RateCardService::new(Arc::new(InMemoryStorage::new()));
        let err = service
            .upload(&meta(), RateType::Base, &brackets(), &rows(&[&["zone", "countries"]]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Precondition(_)));
    }

    #[tokio::test]
    async fn unknown_card_is_not_found() {
        let service = RateCardService::new(Arc::new(InMemoryStorage::new()));
        assert!(matches!(service.get("nope").await, Err(DomainError::NotFound { .. })));
    }
}
