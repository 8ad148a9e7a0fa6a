//! Error taxonomy for a single exchange
//!
//! Only hard failures live here. The permissive cases (unrecognized range,
//! range past end of resource, missing Content-Length) are expressed as
//! `None` or truncation by the code that meets them, never as errors.

use hyper::StatusCode;
use std::io;

/// Failure of one request/response exchange
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// Body was present with a declared length but is not a well-formed document
    #[error("malformed request body: {0}")]
    MalformedRequestBody(#[from] xmltree::ParseError),

    /// Body ended before the declared Content-Length was reached
    #[error("request body truncated: declared {declared} bytes, received {received}")]
    IncompleteBody { declared: u64, received: u64 },

    /// Declared Content-Length exceeds `http.max_body_size`
    #[error("request body too large: {declared} bytes (max: {limit})")]
    BodyTooLarge { declared: u64, limit: u64 },

    /// Transport failed while the body was being read
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    /// Request path resolves outside the storage root
    #[error("path escapes storage root: {0}")]
    Forbidden(String),

    /// Read, seek or write against the backing resource failed
    #[error("resource I/O failure: {0}")]
    ResourceIo(#[from] io::Error),

    #[error("failed to serialize multistatus document: {0}")]
    Serialize(#[from] xmltree::Error),
}

impl DavError {
    /// HTTP status reported to the client for this failure
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequestBody(_) | Self::IncompleteBody { .. } | Self::BodyRead(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ResourceIo(_) | Self::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
