//! Request handler module
//!
//! Dispatches requests to the file responder (full and ranged transfer) and
//! to the property and capability responders.

pub mod ranged;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
