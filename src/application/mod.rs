pub mod ingest;
pub mod services;
pub mod session;

// Re-export key types for convenience
pub use ingest::{Cell, IngestionReport, RateCardIngestor, RateCardMeta, SheetKind, SheetRows};
pub use services::{
    ChargeBatch, ChargeCalculator, InvoiceService, RateCardService, RateCardUpload, RateSource,
    WorkspaceSnapshot,
};
pub use session::{InvoiceSession, ResolutionTicket, ShipmentFilter};
