//! Error types for the content gateway.
//!
//! # Design
//! `NotFound` gets a dedicated variant so callers of `try_fetch` can tell a
//! missing resource from an unexpected status. The query functions on
//! `ContentGateway` never surface these; they log and return a sentinel.

/// Errors produced while building, executing or decoding a content request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service returned 404.
    #[error("resource not found")]
    NotFound,

    /// The service returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS,
    /// timeout, interrupted body).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The gateway configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}
