//! # Courier Billing
//!
//! Rate ingestion and billing computation engine for a courier back office.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Shipments, rate cards, tax math, charges, invoices and the
//!   ports to the back office
//! - **application**: Rate sheet ingestion, per-shipment charge calculation,
//!   the invoicing session and workflow services
//! - **infrastructure**: HTTP back-office client, in-memory storage,
//!   spreadsheet and JSON readers
//! - **shared**: Errors, numeric coercion, retry, validation helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, init_tracing, AppConfig};

pub use application::{
    ChargeCalculator, InvoiceService, InvoiceSession, RateCardIngestor, RateCardService, RateSource,
    ShipmentFilter, WorkspaceSnapshot,
};
pub use infrastructure::{BackOfficeClient, InMemoryStorage};
pub use shared::types::{AppError, DomainError, DomainResult, InfraError};
