//! Rate sheet ingestion: raw cells in, validated [`RateCard`](crate::domain::RateCard) out.

mod cell;
mod ingestor;
mod report;

pub use cell::{is_blank_row, Cell, SheetRows};
pub use ingestor::{RateCardIngestor, RateCardMeta};
pub use report::{BracketIngestion, IngestionReport, RowReport, SheetKind, SheetReport, ZoneIngestion};
