//! GST settings and tax arithmetic

use serde::{Deserialize, Serialize};

use crate::shared::types::round2;

/// Whether charges are quoted before tax or already include it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxMode {
    /// GST is added on top of the subtotal
    Exclusive,
    /// The quoted amount already contains GST
    Inclusive,
}

/// Active tax configuration for an invoice.
///
/// IGST and CGST+SGST are mutually exclusive: every setter that makes one
/// side positive zeroes the other, so at most one filing mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawTaxSettings")]
pub struct TaxSettings {
    cgst: f64,
    sgst: f64,
    igst: f64,
    profit_percent: f64,
    #[serde(rename = "includeGST")]
    include_gst: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaxSettings {
    #[serde(default)]
    cgst: f64,
    #[serde(default)]
    sgst: f64,
    #[serde(default)]
    igst: f64,
    #[serde(default)]
    profit_percent: f64,
    #[serde(default, rename = "includeGST")]
    include_gst: bool,
}

impl From<RawTaxSettings> for TaxSettings {
    fn from(raw: RawTaxSettings) -> Self {
        Self::from_rates(raw.cgst, raw.sgst, raw.igst)
            .with_profit_percent(raw.profit_percent)
            .with_include_gst(raw.include_gst)
    }
}

fn sanitize(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

impl TaxSettings {
    /// Intra-state filing: CGST + SGST.
    pub fn intra_state(cgst: f64, sgst: f64) -> Self {
        let mut t = Self::default();
        t.set_cgst(cgst);
        t.set_sgst(sgst);
        t
    }

    /// Inter-state / export filing: IGST only.
    pub fn inter_state(igst: f64) -> Self {
        let mut t = Self::default();
        t.set_igst(igst);
        t
    }

    /// Build from possibly conflicting rates; a positive IGST wins.
    pub fn from_rates(cgst: f64, sgst: f64, igst: f64) -> Self {
        if sanitize(igst) > 0.0 {
            Self::inter_state(igst)
        } else {
            Self::intra_state(cgst, sgst)
        }
    }

    pub fn with_profit_percent(mut self, profit_percent: f64) -> Self {
        self.set_profit_percent(profit_percent);
        self
    }

    pub fn with_include_gst(mut self, include_gst: bool) -> Self {
        self.include_gst = include_gst;
        self
    }

    pub fn set_cgst(&mut self, rate: f64) {
        self.cgst = sanitize(rate);
        if self.cgst > 0.0 {
            self.igst = 0.0;
        }
    }

    pub fn set_sgst(&mut self, rate: f64) {
        self.sgst = sanitize(rate);
        if self.sgst > 0.0 {
            self.igst = 0.0;
        }
    }

    pub fn set_igst(&mut self, rate: f64) {
        self.igst = sanitize(rate);
        if self.igst > 0.0 {
            self.cgst = 0.0;
            self.sgst = 0.0;
        }
    }

    pub fn set_profit_percent(&mut self, percent: f64) {
        self.profit_percent = sanitize(percent);
    }

    pub fn set_include_gst(&mut self, include_gst: bool) {
        self.include_gst = include_gst;
    }

    pub fn cgst(&self) -> f64 {
        self.cgst
    }

    pub fn sgst(&self) -> f64 {
        self.sgst
    }

    pub fn igst(&self) -> f64 {
        self.igst
    }

    pub fn profit_percent(&self) -> f64 {
        self.profit_percent
    }

    pub fn include_gst(&self) -> bool {
        self.include_gst
    }

    pub fn mode(&self) -> TaxMode {
        if self.include_gst {
            TaxMode::Inclusive
        } else {
            TaxMode::Exclusive
        }
    }

    pub fn is_inter_state(&self) -> bool {
        self.igst > 0.0
    }

    /// `igst` when positive, otherwise `cgst + sgst`.
    pub fn effective_rate(&self) -> f64 {
        if self.igst > 0.0 {
            self.igst
        } else {
            self.cgst + self.sgst
        }
    }

    /// Apply the configured mode to an amount.
    pub fn apply(&self, amount: f64) -> TaxComputation {
        match self.mode() {
            TaxMode::Exclusive => TaxComputation::exclusive(amount, self.effective_rate()),
            TaxMode::Inclusive => TaxComputation::inclusive(amount, self.effective_rate()),
        }
    }

    /// Split a GST amount across the active heads.
    ///
    /// Intra-state splits evenly, with SGST absorbing the odd cent so the
    /// parts always add back up to `gst_amount`.
    pub fn split(&self, gst_amount: f64) -> TaxSplit {
        if self.is_inter_state() {
            TaxSplit {
                cgst_amount: 0.0,
                sgst_amount: 0.0,
                igst_amount: gst_amount,
            }
        } else {
            let cgst_amount = round2(gst_amount / 2.0);
            TaxSplit {
                cgst_amount,
                sgst_amount: round2(gst_amount - cgst_amount),
                igst_amount: 0.0,
            }
        }
    }
}

/// Result of applying a GST rate to an amount. All fields are rounded to
/// two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxComputation {
    pub taxable_value: f64,
    pub gst_amount: f64,
    pub total: f64,
}

impl TaxComputation {
    /// Rate added on top: `gst = subtotal * rate / 100`.
    pub fn exclusive(subtotal: f64, rate: f64) -> Self {
        let taxable_value = round2(subtotal);
        let gst_amount = round2(subtotal * rate / 100.0);
        Self {
            taxable_value,
            gst_amount,
            total: round2(taxable_value + gst_amount),
        }
    }

    /// Rate contained in the gross: `taxable = gross / (1 + rate / 100)`.
    pub fn inclusive(gross: f64, rate: f64) -> Self {
        let total = round2(gross);
        let taxable_value = round2(gross / (1.0 + rate / 100.0));
        Self {
            taxable_value,
            gst_amount: round2(total - taxable_value),
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaxSplit {
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
}

impl TaxSplit {
    pub fn sum(&self) -> f64 {
        self.cgst_amount + self.sgst_amount + self.igst_amount
    }
}
