//! Multistatus response writer
//!
//! Serializes a [`PropertyDocument`] as UTF-8 XML. The sink is taken by
//! value and flushed and shut down before it is dropped: one document per
//! sink, never reused.

use hyper::header;
use hyper::{Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use xmltree::EmitterConfig;

use super::propfind::PropertyDocument;
use crate::error::DavError;
use crate::http::response::{finish, full_body, ResponseBody};

/// Content-Type of every property-query response
pub const MULTISTATUS_CONTENT_TYPE: &str = "application/xml; charset=\"utf-8\"";

/// Render the document, XML declaration included
pub fn serialize_document(doc: &PropertyDocument) -> Result<Vec<u8>, DavError> {
    let mut out = Vec::new();
    let config = EmitterConfig::new()
        .perform_indent(true)
        .write_document_declaration(true);
    doc.to_element().write_with_config(&mut out, config)?;
    Ok(out)
}

/// Write the serialized document to `sink`, then flush and close it
///
/// Returns the number of body bytes written. Element order is exactly the
/// builder's insertion order.
pub async fn write_document<W>(doc: &PropertyDocument, mut sink: W) -> Result<u64, DavError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = serialize_document(doc)?;
    sink.write_all(&bytes).await?;
    sink.flush().await?;
    sink.shutdown().await?;
    Ok(bytes.len() as u64)
}

/// Build the HTTP response for a property query: 200, XML content type, document body
pub async fn multistatus_response(
    doc: &PropertyDocument,
) -> Result<Response<ResponseBody>, DavError> {
    let mut body = Vec::new();
    let written = write_document(doc, &mut body).await?;

    Ok(finish(
        StatusCode::OK,
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, MULTISTATUS_CONTENT_TYPE)
            .header(header::CONTENT_LENGTH, written)
            .body(full_body(body)),
    ))
}
