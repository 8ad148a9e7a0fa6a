//! Multistatus document model
//!
//! A [`PropertyDocument`] lists one `response` per [`ResourceDescriptor`],
//! in insertion order. Each descriptor carries the href and the collection
//! flag together, so an entry can never describe a different resource than
//! the one it was inspected from.
//!
//! Rendered shape:
//!
//! ```text
//! <D:multistatus xmlns:D="DAV:">
//!   <D:response>
//!     <D:href>/docs/</D:href>
//!     <D:propstat>
//!       <D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
//!       <D:status>HTTP/1.1 200 OK</D:status>
//!     </D:propstat>
//!   </D:response>
//! </D:multistatus>
//! ```

use std::io::ErrorKind;
use std::path::Path;
use xmltree::{Element, Namespace, XMLNode};

use crate::error::DavError;

pub const DAV_NAMESPACE: &str = "DAV:";
const DAV_PREFIX: &str = "D";

/// The single property reported for a resource: whether it is a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub path: String,
    pub is_collection: bool,
}

impl ResourceDescriptor {
    pub fn new(path: impl Into<String>, is_collection: bool) -> Self {
        Self {
            path: path.into(),
            is_collection,
        }
    }

    /// Stat `fs_path` and describe it under the request path `path`
    ///
    /// Recomputed for every request; nothing is cached.
    pub async fn inspect(path: &str, fs_path: &Path) -> Result<Self, DavError> {
        match tokio::fs::metadata(fs_path).await {
            Ok(meta) => Ok(Self::new(path, meta.is_dir())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DavError::NotFound(path.to_string())),
            Err(e) => Err(DavError::ResourceIo(e)),
        }
    }
}

/// In-memory multistatus document, built per request and discarded after writing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDocument {
    responses: Vec<ResourceDescriptor>,
}

impl PropertyDocument {
    pub fn builder() -> PropertyDocumentBuilder {
        PropertyDocumentBuilder::default()
    }

    /// Entries in the order they will be serialized
    pub fn responses(&self) -> &[ResourceDescriptor] {
        &self.responses
    }

    /// Convert into an XML element tree rooted at `D:multistatus`
    pub fn to_element(&self) -> Element {
        let mut namespaces = Namespace::empty();
        namespaces.put(DAV_PREFIX, DAV_NAMESPACE);

        let mut root = dav_element("multistatus");
        root.namespaces = Some(namespaces);
        root.children = self
            .responses
            .iter()
            .map(|r| XMLNode::Element(response_element(r)))
            .collect();
        root
    }
}

/// Accumulates response entries before freezing them into a [`PropertyDocument`]
#[derive(Debug, Default)]
pub struct PropertyDocumentBuilder {
    responses: Vec<ResourceDescriptor>,
}

impl PropertyDocumentBuilder {
    #[must_use]
    pub fn response(mut self, resource: ResourceDescriptor) -> Self {
        self.responses.push(resource);
        self
    }

    pub fn build(self) -> PropertyDocument {
        PropertyDocument {
            responses: self.responses,
        }
    }
}

/// Depth-0 answer: exactly one entry for the addressed resource
///
/// Children of a collection are never listed, whatever Depth the client
/// asked for.
pub fn build_property_response(path: &str, is_collection: bool) -> PropertyDocument {
    PropertyDocument::builder()
        .response(ResourceDescriptor::new(path, is_collection))
        .build()
}

fn dav_element(name: &str) -> Element {
    let mut element = Element::new(name);
    element.prefix = Some(DAV_PREFIX.to_string());
    element.namespace = Some(DAV_NAMESPACE.to_string());
    element
}

fn with_children(mut element: Element, children: Vec<Element>) -> Element {
    element.children = children.into_iter().map(XMLNode::Element).collect();
    element
}

fn with_text(mut element: Element, text: &str) -> Element {
    element.children = vec![XMLNode::Text(text.to_string())];
    element
}

fn response_element(resource: &ResourceDescriptor) -> Element {
    let resourcetype = if resource.is_collection {
        with_children(dav_element("resourcetype"), vec![dav_element("collection")])
    } else {
        dav_element("resourcetype")
    };

    let propstat = with_children(
        dav_element("propstat"),
        vec![
            with_children(dav_element("prop"), vec![resourcetype]),
            with_text(dav_element("status"), "HTTP/1.1 200 OK"),
        ],
    );

    with_children(
        dav_element("response"),
        vec![with_text(dav_element("href"), &resource.path), propstat],
    )
}
