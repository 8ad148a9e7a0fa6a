//! HTTP response building module
//!
//! Builders for the fixed-shape responses the server emits. Builders never
//! panic: a header that fails validation is logged and an empty response of
//! the same status is returned instead.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use std::io;

/// Methods answered by this server, advertised in `Allow`
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS, PROPFIND";

/// Body of every response: buffered bytes or a slice streamed from a resource
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Wrap in-memory bytes as a response body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<ResponseBody> {
    finish(
        StatusCode::NOT_MODIFIED,
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, etag)
            .body(empty_body()),
    )
}

/// Build a plain-text error response for any status
pub fn build_error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let text = format!("{} {message}", status.as_u16());
    finish(
        status,
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(header::CONTENT_LENGTH, text.len())
            .body(full_body(text)),
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut resp = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    resp
}

/// Build the capability advertisement for OPTIONS
///
/// Compliance class 1 only: no locking.
pub fn build_capability_response() -> Response<ResponseBody> {
    finish(
        StatusCode::OK,
        Response::builder()
            .status(StatusCode::OK)
            .header("DAV", "1")
            .header(header::ALLOW, ALLOWED_METHODS)
            .header(header::CONTENT_LENGTH, 0)
            .body(empty_body()),
    )
}

/// Build 200 response carrying a whole resource
pub fn build_full_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    finish(
        StatusCode::OK,
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, content_length)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::ETAG, etag)
            .body(full_body(body)),
    )
}

/// Header values describing a served slice, fixed before the body is streamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialContent {
    pub start: u64,
    /// Last byte offset served, `None` when the slice is empty
    pub last: Option<u64>,
    pub total: u64,
}

impl PartialContent {
    pub fn content_length(&self) -> u64 {
        self.last.map_or(0, |last| last - self.start + 1)
    }

    /// `Content-Range` value, `None` for an empty slice
    pub fn content_range(&self) -> Option<String> {
        self.last
            .map(|last| format!("bytes {}-{last}/{}", self.start, self.total))
    }
}

/// Build 206 Partial Content response
///
/// Headers come from `slice` alone, so they are fixed before `body` yields
/// its first byte. An empty slice carries no `Content-Range`.
pub fn build_partial_response(
    body: ResponseBody,
    content_type: &str,
    slice: PartialContent,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, slice.content_length())
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(range) = slice.content_range() {
        builder = builder.header(header::CONTENT_RANGE, range);
    }

    finish(StatusCode::PARTIAL_CONTENT, builder.body(body))
}

/// Unwrap a builder result, degrading to an empty response of the same status
pub fn finish(
    status: StatusCode,
    built: Result<Response<ResponseBody>, hyper::http::Error>,
) -> Response<ResponseBody> {
    built.unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build {status} response: {e}"));
        let mut resp = Response::new(empty_body());
        *resp.status_mut() = status;
        resp
    })
}
