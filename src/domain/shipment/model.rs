//! Shipment (AWB) entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::types::lenient_f64;

/// Volumetric divisor for dimensional weight (cm³ per kg).
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Country used when the receiver record has none.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// One physical box of a shipment (cm, cm, cm, kg).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentBox {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub length: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub breadth: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub actual_weight: f64,
}

impl ShipmentBox {
    pub fn new(length: f64, breadth: f64, height: f64, actual_weight: f64) -> Self {
        Self {
            length,
            breadth,
            height,
            actual_weight,
        }
    }

    /// `L*B*H / 5000`. Negative dimensions count as zero.
    pub fn dimensional_weight(&self) -> f64 {
        self.length.max(0.0) * self.breadth.max(0.0) * self.height.max(0.0) / VOLUMETRIC_DIVISOR
    }

    /// Billing weight: the greater of actual and dimensional weight.
    pub fn chargeable_weight(&self) -> f64 {
        self.actual_weight.max(0.0).max(self.dimensional_weight())
    }
}

/// Sum of chargeable weight over one box set.
pub fn box_set_weight(boxes: &[ShipmentBox]) -> f64 {
    boxes.iter().map(ShipmentBox::chargeable_weight).sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Rate snapshot stored on the AWB when it was booked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateInfo {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: f64,
    #[serde(default)]
    pub courier: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base_charge: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fuel_surcharge: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub other_charges: f64,
}

impl RateInfo {
    /// Service label, falling back to the courier name.
    pub fn service_label(&self) -> String {
        [&self.service, &self.courier]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Air waybill record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub tracking_number: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub receiver: Receiver,
    #[serde(default)]
    pub boxes: Vec<ShipmentBox>,
    #[serde(default)]
    pub our_boxes: Vec<ShipmentBox>,
    #[serde(default)]
    pub vendor_boxes: Vec<ShipmentBox>,
    #[serde(default)]
    pub ref_code: String,
    #[serde(default)]
    pub rate_info: Option<RateInfo>,
    #[serde(default)]
    pub is_billed: bool,
}

impl Shipment {
    /// Total chargeable weight.
    ///
    /// `boxes`, `our_boxes` and `vendor_boxes` are measurements of the same
    /// consignment taken by different parties, so the heaviest set is billed
    /// rather than the sum of all three.
    pub fn total_weight(&self) -> f64 {
        [&self.boxes, &self.our_boxes, &self.vendor_boxes]
            .into_iter()
            .map(|set| box_set_weight(set))
            .fold(0.0, f64::max)
    }

    /// Destination country, `"Unknown"` when missing or blank.
    pub fn country(&self) -> &str {
        self.receiver
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY)
    }

    pub fn consignee_name(&self) -> &str {
        self.receiver.name.as_deref().unwrap_or_default()
    }
}
