//! Method table
//!
//! Fixed mapping from request method to responder; anything not listed
//! here is answered with 405 by the router.

use hyper::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavMethod {
    Get,
    /// GET semantics without a body
    Head,
    /// Depth-0 property query
    Propfind,
    /// Capability advertisement
    Options,
}

impl DavMethod {
    pub fn from_http(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "PROPFIND" => Some(Self::Propfind),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Propfind => "PROPFIND",
            Self::Options => "OPTIONS",
        }
    }
}
