//! minidav
//!
//! A small file-serving responder: plain GET/HEAD, single byte-range
//! delivery, a depth-0 PROPFIND that reports whether a path is a
//! collection, and an OPTIONS capability advertisement.

pub mod config;
pub mod dav;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::DavError;
