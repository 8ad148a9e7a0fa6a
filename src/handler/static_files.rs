//! Static file serving module
//!
//! Resolves request paths under the storage root and answers GET/HEAD,
//! either with the whole resource or, when a recognizable Range header is
//! present, with the requested slice.

use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};

use super::ranged::{plan_range, stream_range};
use crate::error::DavError;
use crate::http::{self, cache, mime, ResponseBody};

/// Request details the file responder needs
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Map a request path onto the storage root
///
/// The path is percent-decoded first. Decoded `..` segments, NUL bytes and
/// non-UTF-8 names are refused; nothing outside `root` is reachable.
pub fn resolve_path(root: &Path, request_path: &str) -> Result<PathBuf, DavError> {
    let forbidden = || DavError::Forbidden(request_path.to_string());
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| forbidden())?;
    if decoded.contains('\0') {
        return Err(forbidden());
    }

    let relative = Path::new(decoded.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(forbidden());
            }
        }
    }
    Ok(resolved)
}

/// Serve GET/HEAD for a resolved path
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    fs_path: &Path,
    index_files: &[String],
) -> Result<Response<ResponseBody>, DavError> {
    let meta = fs::metadata(fs_path).await.map_err(|e| not_found_or_io(e, ctx.path))?;

    let file_path = if meta.is_dir() {
        find_index_file(fs_path, index_files)
            .await
            .ok_or_else(|| DavError::NotFound(ctx.path.to_string()))?
    } else {
        fs_path.to_path_buf()
    };

    let range = ctx.range_header.as_deref().and_then(http::parse_range_header);
    match range {
        Some(range) => serve_partial(ctx, &file_path, range).await,
        None => serve_full(ctx, &file_path).await,
    }
}

/// First index file that exists as a plain file inside `dir`
async fn find_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Whole-resource transfer with conditional GET
async fn serve_full(
    ctx: &RequestContext<'_>,
    file_path: &Path,
) -> Result<Response<ResponseBody>, DavError> {
    let meta = fs::metadata(file_path).await?;
    let etag = cache::etag_for(&meta);

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return Ok(http::build_304_response(&etag));
    }

    let data = if ctx.is_head {
        Bytes::new()
    } else {
        Bytes::from(fs::read(file_path).await?)
    };
    let mut resp =
        http::build_full_response(data, mime::content_type_for(file_path), &etag, ctx.is_head);

    if ctx.is_head {
        // Full body was skipped, advertise the real size
        resp.headers_mut()
            .insert(hyper::header::CONTENT_LENGTH, meta.len().into());
    }
    Ok(resp)
}

/// Slice transfer
///
/// Headers are fixed from the file length before streaming starts. The file
/// handle moves into the streaming body, or is closed here for HEAD.
async fn serve_partial(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    range: http::ByteRange,
) -> Result<Response<ResponseBody>, DavError> {
    let file = File::open(file_path).await?;
    let total = file.metadata().await?.len();
    let plan = plan_range(range, total);

    let body = if ctx.is_head {
        drop(file);
        http::empty_body()
    } else {
        stream_range(file, range, total).boxed()
    };

    Ok(http::build_partial_response(
        body,
        mime::content_type_for(file_path),
        plan,
    ))
}

fn not_found_or_io(err: std::io::Error, path: &str) -> DavError {
    if err.kind() == ErrorKind::NotFound {
        DavError::NotFound(path.to_string())
    } else {
        DavError::ResourceIo(err)
    }
}
