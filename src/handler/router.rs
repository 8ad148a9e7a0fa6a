//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method lookup, path
//! resolution, dispatch, error conversion and access logging.

use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::static_files::{self, RequestContext};
use crate::config::AppState;
use crate::dav::{self, DavMethod};
use crate::error::DavError;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
///
/// Never fails: every error becomes a response local to this exchange.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut response = match DavMethod::from_http(&parts.method) {
        Some(method) => dispatch(method, &parts, body, &state)
            .await
            .unwrap_or_else(|e| error_response(&parts, &e)),
        None => {
            logger::log_warning(&format!("Method not allowed: {}", parts.method));
            http::build_405_response()
        }
    };

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(header::SERVER, server);
    }

    if state.access_log() {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

/// Route a recognized method to its responder
async fn dispatch<B>(
    method: DavMethod,
    parts: &Parts,
    body: B,
    state: &AppState,
) -> Result<Response<ResponseBody>, DavError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let path = parts.uri.path();

    match method {
        DavMethod::Get | DavMethod::Head => {
            let fs_path = static_files::resolve_path(state.storage_root(), path)?;
            let ctx = RequestContext {
                path,
                is_head: method == DavMethod::Head,
                if_none_match: header_string(&parts.headers, header::IF_NONE_MATCH),
                range_header: header_string(&parts.headers, header::RANGE),
            };
            static_files::serve_path(&ctx, &fs_path, &state.config.storage.index_files).await
        }
        DavMethod::Propfind => {
            let fs_path = static_files::resolve_path(state.storage_root(), path)?;
            dav::handle_propfind(
                path,
                &fs_path,
                &parts.headers,
                body,
                state.config.http.max_body_size,
            )
            .await
        }
        DavMethod::Options => {
            Ok(dav::handle_options_query(body, state.config.http.max_body_size).await)
        }
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Convert a failed exchange into a plain-text response, logging server faults
fn error_response(parts: &Parts, err: &DavError) -> Response<ResponseBody> {
    let status = err.status();
    if err.is_client_error() {
        logger::log_debug(&format!("{} {}: {err}", parts.method, parts.uri.path()));
    } else {
        logger::log_error(&format!("{} {}: {err}", parts.method, parts.uri.path()));
    }
    http::build_error_response(status, status.canonical_reason().unwrap_or("Error"))
}

fn log_access(
    parts: &Parts,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_string(&parts.headers, header::REFERER);
    entry.user_agent = header_string(&parts.headers, header::USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
