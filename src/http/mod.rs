//! HTTP protocol layer module
//!
//! Protocol helpers shared by the file and property responders, decoupled
//! from request dispatch.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange};
pub use response::{
    build_304_response, build_405_response, build_capability_response, build_error_response,
    build_full_response, build_partial_response, empty_body, full_body, PartialContent,
    ResponseBody,
};
