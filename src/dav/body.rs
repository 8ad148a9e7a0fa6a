//! Request body reading
//!
//! A missing or unusable Content-Length means "no body", which is the
//! common case for PROPFIND. Only a body that was announced and then turns
//! out broken is an error.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderMap};
use std::fmt::Display;
use xmltree::Element;

use crate::error::DavError;

/// Declared body length, `None` if absent, unparseable, or zero
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::CONTENT_LENGTH)?.to_str().ok()?.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().filter(|&n| n > 0)
}

/// Read exactly `content_length` bytes and parse them as an XML document
///
/// Returns `Ok(None)` without touching the body when no length was declared.
/// Bytes beyond the declared length are ignored.
pub async fn read_request_body<B>(
    content_length: Option<u64>,
    mut body: B,
    max_body_size: u64,
) -> Result<Option<Element>, DavError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let Some(declared) = content_length else {
        return Ok(None);
    };
    if declared > max_body_size {
        return Err(DavError::BodyTooLarge {
            declared,
            limit: max_body_size,
        });
    }

    let wanted = usize::try_from(declared).map_err(|_| DavError::BodyTooLarge {
        declared,
        limit: max_body_size,
    })?;
    let mut buf = Vec::with_capacity(wanted);

    while buf.len() < wanted {
        let Some(frame) = body.frame().await else {
            break;
        };
        let frame = frame.map_err(|e| DavError::BodyRead(e.to_string()))?;
        if let Ok(data) = frame.into_data() {
            let take = data.len().min(wanted - buf.len());
            buf.extend_from_slice(&data[..take]);
        }
    }

    if buf.len() < wanted {
        return Err(DavError::IncompleteBody {
            declared,
            received: buf.len() as u64,
        });
    }

    let document = Element::parse(buf.as_slice())?;
    Ok(Some(document))
}

/// Drain and drop a body without looking at it
///
/// Frames are dropped as they arrive. Reading stops once `limit` bytes have
/// been seen, at the end of the body, or on a transport error; the caller
/// answers regardless. Returns the number of bytes drained.
pub async fn discard_body<B>(mut body: B, limit: u64) -> u64
where
    B: Body<Data = Bytes> + Unpin,
{
    let mut drained = 0u64;
    while drained < limit {
        let Some(Ok(frame)) = body.frame().await else {
            break;
        };
        if let Ok(data) = frame.into_data() {
            drained += data.len() as u64;
        }
    }
    drained
}
