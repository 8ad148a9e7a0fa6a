//! Property and capability responders
//!
//! A property query walks `AwaitingBody -> BodyRead | BodyAbsent ->
//! ResourceInspected -> DocumentBuilt -> DocumentSent`, one shot per
//! exchange. Depth is always 0: the Depth header is read only to log that
//! it was ignored.

pub mod body;
pub mod method;
pub mod propfind;
pub mod writer;

use hyper::body::{Body, Bytes};
use hyper::header::HeaderMap;
use hyper::Response;
use std::fmt::Display;
use std::path::Path;

use crate::error::DavError;
use crate::http::{self, ResponseBody};
use crate::logger;

pub use body::{declared_length, discard_body, read_request_body};
pub use method::DavMethod;
pub use propfind::{build_property_response, PropertyDocument, ResourceDescriptor};
pub use writer::{multistatus_response, write_document, MULTISTATUS_CONTENT_TYPE};

/// Answer a depth-0 PROPFIND for `path`, stored at `fs_path`
///
/// A body that was declared but does not parse fails the exchange; a
/// missing body does not.
pub async fn handle_propfind<B>(
    path: &str,
    fs_path: &Path,
    headers: &HeaderMap,
    body: B,
    max_body_size: u64,
) -> Result<Response<ResponseBody>, DavError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    log_ignored_depth(headers);

    if let Some(request) = read_request_body(declared_length(headers), body, max_body_size).await? {
        logger::log_debug(&format!(
            "PROPFIND {path}: request body <{}> accepted, reporting resourcetype only",
            request.name
        ));
    }

    let resource = ResourceDescriptor::inspect(path, fs_path).await?;
    let document = PropertyDocument::builder().response(resource).build();
    multistatus_response(&document).await
}

/// Answer OPTIONS with the capability advertisement
///
/// Any body is drained, up to `max_body_size` bytes, and thrown away
/// unparsed, so it can never fail the exchange.
pub async fn handle_options_query<B>(body: B, max_body_size: u64) -> Response<ResponseBody>
where
    B: Body<Data = Bytes> + Unpin,
{
    match discard_body(body, max_body_size).await {
        0 => {}
        n if n >= max_body_size => logger::log_debug(&format!(
            "OPTIONS: body exceeds {max_body_size} bytes, rest left unread"
        )),
        n => logger::log_debug(&format!("OPTIONS: discarded {n} body bytes")),
    }
    http::build_capability_response()
}

fn log_ignored_depth(headers: &HeaderMap) {
    if let Some(depth) = headers.get("depth").and_then(|v| v.to_str().ok()) {
        if depth.trim() != "0" {
            logger::log_debug(&format!("Depth '{depth}' requested, answering with depth 0"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Empty, Full};
    use hyper::header::{self, HeaderValue};
    use hyper::StatusCode;
    use xmltree::Element;

    async fn parse_body(resp: Response<ResponseBody>) -> Element {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        Element::parse(&bytes[..]).unwrap()
    }

    #[tokio::test]
    async fn test_propfind_without_body_on_collection() {
        let resp = handle_propfind(
            "/docs/",
            Path::new("fixtures/root/docs"),
            &HeaderMap::new(),
            Empty::<Bytes>::new(),
            1024,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let root = parse_body(resp).await;
        let response = root.get_child("response").unwrap();
        assert_eq!(response.get_child("href").unwrap().get_text().unwrap(), "/docs/");
        let resourcetype = response
            .get_child("propstat")
            .and_then(|p| p.get_child("prop"))
            .and_then(|p| p.get_child("resourcetype"))
            .unwrap();
        assert!(resourcetype.get_child("collection").is_some());
    }

    #[tokio::test]
    async fn test_depth_infinity_still_answers_depth_zero() {
        let mut headers = HeaderMap::new();
        headers.insert("depth", HeaderValue::from_static("infinity"));

        let resp = handle_propfind(
            "/docs/",
            Path::new("fixtures/root/docs"),
            &headers,
            Empty::<Bytes>::new(),
            1024,
        )
        .await
        .unwrap();

        // docs/ contains notes.txt, which must not be listed
        let root = parse_body(resp).await;
        let count = root
            .children
            .iter()
            .filter(|n| matches!(n, xmltree::XMLNode::Element(e) if e.name == "response"))
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_propfind_malformed_declared_body_fails() {
        let raw = b"<D:propfind xmlns:D=\"DAV:\">";
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(raw.len()));

        let err = handle_propfind(
            "/hundred.bin",
            Path::new("fixtures/root/hundred.bin"),
            &headers,
            Full::new(Bytes::from_static(raw)),
            1024,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DavError::MalformedRequestBody(_)));
    }

    #[tokio::test]
    async fn test_propfind_missing_resource() {
        let err = handle_propfind(
            "/absent.txt",
            Path::new("fixtures/root/absent.txt"),
            &HeaderMap::new(),
            Empty::<Bytes>::new(),
            1024,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_options_with_unparsable_body() {
        let resp =
            handle_options_query(Full::new(Bytes::from_static(b"<<<%%% not xml")), 1024).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["dav"], "1");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_options_with_body_over_limit() {
        let oversized = Full::new(Bytes::from(vec![b'<'; 8192]));
        let resp = handle_options_query(oversized, 1024).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["dav"], "1");
    }
}
