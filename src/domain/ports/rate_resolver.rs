use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::types::{lenient_f64, DomainResult};

/// Query for `GET /rate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuery {
    #[serde(rename = "type")]
    pub rate_type: String,
    pub weight: f64,
    pub country: String,
    pub profit_percent: f64,
}

/// Successful rate service response; GST is already applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calculated_weight: f64,
    #[serde(default)]
    pub service: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fuel_charges: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub extra_charge_total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit_charges: f64,
    #[serde(rename = "subtotalBeforeGST", default, deserialize_with = "lenient_f64")]
    pub subtotal_before_gst: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gst_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
}

/// Server-side rate lookup. Any error is treated as a per-shipment
/// resolution failure by the caller.
#[async_trait]
pub trait RateResolver: Send + Sync {
    async fn resolve(&self, query: &RateQuery) -> DomainResult<ResolvedRate>;
}
