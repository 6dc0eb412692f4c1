use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    /// A required selection or input is missing; the user action is aborted.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Charge for shipment {0} comes from the rate service and is read-only")]
    ReadOnly(String),

    #[error("Stale rate batch {batch} discarded (current epoch {current})")]
    StaleBatch { batch: u64, current: u64 },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The collaborator could not be reached (connect failure or timeout).
    #[error("Persistence failed: {0}")]
    Unavailable(String),
}

impl DomainError {
    /// Whether this error is likely transient and the operation may succeed
    /// if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Unavailable(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} responded {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InfraError {
    /// Connection resets and timeouts; HTTP status failures are final.
    pub fn is_transient(&self) -> bool {
        match self {
            InfraError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Status { message, .. } => DomainError::Persistence(message),
            other if other.is_transient() => DomainError::Unavailable(other.to_string()),
            other => DomainError::Persistence(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
