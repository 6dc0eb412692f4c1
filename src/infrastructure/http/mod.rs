//! HTTP adapters for the back office

mod client;

pub use client::BackOfficeClient;
