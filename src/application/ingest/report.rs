//! Per-row ingestion reports

use serde::Serialize;

use crate::domain::rate_card::{WeightBracket, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Brackets,
    Zones,
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brackets => write!(f, "brackets"),
            Self::Zones => write!(f, "zones"),
        }
    }
}

/// Outcome of one source row. `row` is the 1-based spreadsheet row
/// number, header included, so the first data row is row 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    pub sheet: SheetKind,
    pub row: usize,
    pub message: String,
}

/// Accepted and rejected rows of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetReport {
    pub accepted: Vec<RowReport>,
    pub rejected: Vec<RowReport>,
}

impl SheetReport {
    pub fn processed(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub(crate) fn accept(&mut self, sheet: SheetKind, row: usize, message: String) {
        self.accepted.push(RowReport { sheet, row, message });
    }

    pub(crate) fn reject(&mut self, sheet: SheetKind, row: usize, message: impl Into<String>) {
        self.rejected.push(RowReport {
            sheet,
            row,
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BracketIngestion {
    pub rates: Vec<WeightBracket>,
    pub report: SheetReport,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneIngestion {
    pub zones: Vec<Zone>,
    pub report: SheetReport,
    pub warnings: Vec<String>,
}

/// Combined result for a bracket sheet and a zone sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    pub rates: Vec<WeightBracket>,
    pub zones: Vec<Zone>,
    pub accepted: Vec<RowReport>,
    pub rejected: Vec<RowReport>,
    pub warnings: Vec<String>,
}

impl IngestionReport {
    pub fn accepted_in(&self, sheet: SheetKind) -> usize {
        self.accepted.iter().filter(|r| r.sheet == sheet).count()
    }

    pub fn rejected_in(&self, sheet: SheetKind) -> usize {
        self.rejected.iter().filter(|r| r.sheet == sheet).count()
    }

    pub fn is_usable(&self) -> bool {
        !self.rates.is_empty() && !self.zones.is_empty()
    }
}
