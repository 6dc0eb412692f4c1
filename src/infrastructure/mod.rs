//! Infrastructure layer - external concerns

pub mod files;
pub mod http;
pub mod sheets;
pub mod storage;

pub use files::load_json_list;
pub use http::BackOfficeClient;
pub use sheets::{read_sheet, sheet_names};
pub use storage::InMemoryStorage;
