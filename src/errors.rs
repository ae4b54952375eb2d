//! Error handling for the application

use thiserror::Error;

/// Price text normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("price text is empty or blank")]
    EmptyInput,

    #[error("no numeric token found in price text")]
    NoNumericToken,
}

/// Fetch-related errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("unexpected status code: {0}")]
    BadStatus(u16),
}

/// Ledger-related errors
///
/// Reads never surface these; a degraded store reads as empty. Only write
/// paths report them, and the session logs rather than aborts.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error on history file: {0}")]
    Io(String),
}

/// Notification delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}
