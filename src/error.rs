use thiserror::Error;

/// Errors raised by a [`UserStore`](crate::UserStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user '{0}' not found")]
    NotFound(String),
    #[error("user '{0}' already exists")]
    DuplicateUser(String),
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store is corrupted: {0}")]
    Corrupt(String),
}

/// Errors raised by the credential core and the service built on it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("OS random generator unavailable: {0}")]
    EntropySource(String),
    #[error("invalid key derivation parameters: {0}")]
    KdfParameter(String),
    #[error("pepper unavailable: {0}")]
    PepperSource(String),
    #[error("malformed credential record: {0}")]
    Record(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
