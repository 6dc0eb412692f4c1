//! Back-office REST client
//!
//! Implements every outbound port over one `reqwest::Client`:
//!
//! | Port               | Endpoint                               |
//! |--------------------|----------------------------------------|
//! | `RateResolver`     | `GET /rate`                            |
//! | `RateCardStore`    | `POST /rates`, `GET /rates`            |
//! | `InvoiceStore`     | `POST /billing`                        |
//! | `BackOfficeSource` | `GET /awb`, `GET /clients`, `GET /franchises` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::domain::{
    BackOfficeSource, BillingParty, InvoicePayload, InvoiceReceipt, InvoiceStore, PartyKind,
    RateCard, RateCardPayload, RateCardStore, RateQuery, RateResolver, ResolvedRate, Shipment,
};
use crate::shared::types::{DomainResult, InfraError};

/// List endpoints answer either a bare array or `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

#[derive(Deserialize)]
struct BillResponse {
    bill: CreatedBill,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedBill {
    bill_number: serde_json::Value,
}

impl From<CreatedBill> for InvoiceReceipt {
    fn from(bill: CreatedBill) -> Self {
        let bill_number = match bill.bill_number {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        InvoiceReceipt { bill_number }
    }
}

#[derive(Clone)]
pub struct BackOfficeClient {
    http: Client,
    base_url: String,
}

impl BackOfficeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InfraError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, InfraError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, InfraError> {
        let response = self.http.get(self.url(path)).send().await?;
        let listing: Listing<T> = read_json(path, response).await?;
        Ok(listing.into_vec())
    }

    async fn fetch_parties(&self, path: &str, kind: PartyKind) -> DomainResult<Vec<BillingParty>> {
        let mut parties: Vec<BillingParty> = self.get_list(path).await?;
        for party in &mut parties {
            party.kind = kind;
        }
        Ok(parties)
    }
}

/// Decode a 2xx body, or turn any other status into [`InfraError::Status`]
/// carrying the back office's own message.
async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, InfraError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        warn!(endpoint, status = status.as_u16(), %message, "Back office request failed");
        return Err(InfraError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// `message` or `error` field of a JSON error body, else the trimmed body.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[async_trait]
impl RateResolver for BackOfficeClient {
    async fn resolve(&self, query: &RateQuery) -> DomainResult<ResolvedRate> {
        debug!(rate_type = %query.rate_type, weight = query.weight, country = %query.country, "GET /rate");
        let response = self
            .http
            .get(self.url("/rate"))
            .query(query)
            .send()
            .await
            .map_err(InfraError::from)?;
        Ok(read_json("/rate", response).await?)
    }
}

#[async_trait]
impl RateCardStore for BackOfficeClient {
    async fn save(&self, payload: &RateCardPayload) -> DomainResult<()> {
        let response = self
            .http
            .post(self.url("/rates"))
            .json(payload)
            .send()
            .await
            .map_err(InfraError::from)?;
        let _: serde_json::Value = read_json("/rates", response).await.or_else(|e| match e {
            // 2xx with an empty or non-JSON body still counts as stored
            InfraError::Serialization(_) => Ok(serde_json::Value::Null),
            other => Err(other),
        })?;
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<RateCard>> {
        Ok(self.get_list("/rates").await?)
    }

    async fn find_by_name(&self, original_name: &str) -> DomainResult<Option<RateCard>> {
        let cards = self.list().await?;
        Ok(cards.into_iter().rev().find(|c| c.original_name == original_name))
    }
}

#[async_trait]
impl InvoiceStore for BackOfficeClient {
    async fn create(&self, payload: &InvoicePayload) -> DomainResult<InvoiceReceipt> {
        let response = self
            .http
            .post(self.url("/billing"))
            .json(payload)
            .send()
            .await
            .map_err(InfraError::from)?;
        let created: BillResponse = read_json("/billing", response).await?;
        Ok(created.bill.into())
    }
}

#[async_trait]
impl BackOfficeSource for BackOfficeClient {
    async fn fetch_shipments(&self) -> DomainResult<Vec<Shipment>> {
        Ok(self.get_list("/awb").await?)
    }

    async fn fetch_clients(&self) -> DomainResult<Vec<BillingParty>> {
        self.fetch_parties("/clients", PartyKind::Client).await
    }

    async fn fetch_franchises(&self) -> DomainResult<Vec<BillingParty>> {
        self.fetch_parties("/franchises", PartyKind::Franchise).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Duplicate rate card"}"#).unwrap(), "Duplicate rate card");
        assert_eq!(error_message(r#"{"error":"bad zone"}"#).unwrap(), "bad zone");
        assert_eq!(error_message("  gateway down \n").unwrap(), "gateway down");
        assert_eq!(error_message(r#"{"status":500}"#).unwrap(), r#"{"status":500}"#);
        assert!(error_message("   ").is_none());
    }

    #[test]
    fn listing_accepts_bare_and_wrapped_arrays() {
        let bare: Listing<u32> = serde_json::from_str("[1,2]").unwrap();
        let wrapped: Listing<u32> = serde_json::from_str(r#"{"data":[3]}"#).unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);
        assert_eq!(wrapped.into_vec(), vec![3]);
    }

    #[test]
    fn numeric_bill_numbers_are_accepted() {
        let created: BillResponse = serde_json::from_str(r#"{"bill":{"billNumber":1042}}"#).unwrap();
        assert_eq!(InvoiceReceipt::from(created.bill).bill_number, "1042");
    }

    #[test]
    fn base_url_is_normalised() {
        let client = BackOfficeClient::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/rate"), "http://localhost:5000/api/rate");
    }
}
