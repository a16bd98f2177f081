//! Error types for the fan-out client.
//!
//! # Design
//! `ApiError` describes what went wrong with a single round trip. `NotFound`
//! gets a dedicated variant because the sequential scan treats it as "end of
//! collection" rather than a failure. `FetchError` wraps `ApiError` with the
//! two outcomes that only exist inside a fan-out: cancellation and a unit of
//! work that never produced a value.
//!
//! Both types are `Clone + PartialEq` so whole result sets can be compared.

use thiserror::Error;

/// Errors returned by the clients' `parse_*` methods and by transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A base URL or query could not be assembled into a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Connection failure, timeout or any other I/O-level problem.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Outcome of one failed slot in a `ResultSet`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The fan-out was cancelled before this unit finished.
    #[error("cancelled")]
    Cancelled,

    /// The unit of work panicked or was aborted by the runtime.
    #[error("unit of work aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// True when the remote service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Api(ApiError::NotFound))
    }
}
