//! Per-shipment charge calculation
//!
//! Prices each shipment either from the rate snapshot embedded in the AWB
//! or through the rate service. Rate service lookups fan out concurrently;
//! a failed lookup falls back to the embedded rate for that shipment only.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::domain::charge::{ChargeComponents, ComputedCharge};
use crate::domain::ports::{RateQuery, RateResolver, ResolvedRate};
use crate::domain::shipment::Shipment;
use crate::domain::tax::TaxSettings;
use crate::shared::types::{round2, DomainError, DomainResult};
use crate::shared::utills::{retry_with_backoff, RetryConfig};

type ResolvedRateResult = DomainResult<ResolvedRate>;

/// Where per-shipment prices come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RateSource {
    /// The rate snapshot stored on each AWB
    #[default]
    Embedded,
    /// The rate service, for the named rate type
    RateMaster { rate_type: String },
}

impl RateSource {
    pub fn rate_master(rate_type: impl Into<String>) -> Self {
        Self::RateMaster {
            rate_type: rate_type.into(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::RateMaster { .. })
    }
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::RateMaster { rate_type } => write!(f, "rate master ({})", rate_type),
        }
    }
}

/// One charge row per input shipment, in input order, plus the warnings
/// collected while pricing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChargeBatch {
    pub charges: Vec<ComputedCharge>,
    pub warnings: Vec<String>,
}

impl ChargeBatch {
    pub fn resolved_count(&self) -> usize {
        self.charges.iter().filter(|c| c.is_from_external_resolution).count()
    }
}

pub struct ChargeCalculator {
    resolver: Arc<dyn RateResolver>,
    max_concurrency: usize,
    retry: RetryConfig,
}

impl ChargeCalculator {
    pub fn new(resolver: Arc<dyn RateResolver>) -> Self {
        Self {
            resolver,
            max_concurrency: 8,
            retry: RetryConfig::with_attempts(1),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Price a shipment from its embedded rate snapshot.
    ///
    /// Weight is the snapshot weight when positive, otherwise the computed
    /// chargeable weight. Profit is never applied to embedded rates.
    pub fn embedded_charge(shipment: &Shipment, tax: &TaxSettings) -> ComputedCharge {
        let rate = shipment.rate_info.clone().unwrap_or_default();
        let weight = if rate.weight > 0.0 {
            rate.weight
        } else {
            round2(shipment.total_weight())
        };
        ComputedCharge::local(
            shipment.id.clone(),
            weight,
            rate.service_label(),
            ChargeComponents {
                base_charge: rate.base_charge,
                fuel_surcharge: rate.fuel_surcharge,
                other_charges: rate.other_charges,
                profit_charges: 0.0,
            },
            tax,
        )
    }

    /// Price every shipment under `source`.
    ///
    /// Every shipment gets a row regardless of how many lookups fail. The
    /// only hard failure is a rate-master source without a rate type.
    pub async fn compute(
        &self,
        shipments: &[Shipment],
        source: &RateSource,
        tax: &TaxSettings,
    ) -> DomainResult<ChargeBatch> {
        match source {
            RateSource::Embedded => Ok(ChargeBatch {
                charges: shipments
                    .iter()
                    .map(|s| Self::embedded_charge(s, tax))
                    .collect(),
                warnings: Vec::new(),
            }),
            RateSource::RateMaster { rate_type } => {
                let rate_type = rate_type.trim();
                if rate_type.is_empty() {
                    return Err(DomainError::Precondition("no rate type selected".to_string()));
                }
                Ok(self.resolve_batch(shipments, rate_type, tax).await)
            }
        }
    }

    async fn resolve_batch(&self, shipments: &[Shipment], rate_type: &str, tax: &TaxSettings) -> ChargeBatch {
        let results: Vec<ResolvedRateResult> = stream::iter(shipments)
            .map(|shipment| {
                let query = RateQuery {
                    rate_type: rate_type.to_string(),
                    weight: round2(shipment.total_weight()),
                    country: shipment.country().to_string(),
                    profit_percent: tax.profit_percent(),
                };
                async move { self.resolve_one(&query).await }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut batch = ChargeBatch::default();
        for (shipment, result) in shipments.iter().zip(results) {
            match result {
                Ok(rate) => batch
                    .charges
                    .push(ComputedCharge::resolved(shipment.id.clone(), round2(shipment.total_weight()), &rate, tax)),
                Err(err) => {
                    let label = shipment_label(shipment);
                    warn!(shipment_id = %shipment.id, error = %err, "Rate lookup failed, using embedded rate");
                    batch
                        .warnings
                        .push(format!("Rate lookup failed for AWB {}: {}; using its own rate", label, err));
                    batch.charges.push(Self::embedded_charge(shipment, tax));
                }
            }
        }

        info!(
            rate_type,
            shipments = shipments.len(),
            resolved = batch.resolved_count(),
            fallbacks = batch.warnings.len(),
            "Rate batch priced"
        );
        batch
    }

    async fn resolve_one(&self, query: &RateQuery) -> ResolvedRateResult {
        retry_with_backoff(
            &self.retry,
            move || self.resolver.resolve(query),
            DomainError::is_transient,
            "resolve_rate",
        )
        .await
    }
}

fn shipment_label(shipment: &Shipment) -> &str {
    if shipment.tracking_number.trim().is_empty() {
        &shipment.id
    } else {
        &shipment.tracking_number
    }
}
