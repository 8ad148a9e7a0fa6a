//! HTTP Range request parsing module
//!
//! Only the canonical single interval `bytes=<start>-<end>` is recognized.
//! Anything else (suffix or open ranges, multiple ranges, other units,
//! reversed bounds, junk) parses to `None` and the caller serves the whole
//! resource instead of failing the request.

/// Inclusive byte interval requested by a client, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Returns `None` when `end < start`
    pub const fn new(start: u64, end: u64) -> Option<Self> {
        if start > end {
            None
        } else {
            Some(Self { start, end })
        }
    }

    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes actually deliverable from a resource of `total_len` bytes
    ///
    /// Requests running past the end are truncated; a start at or beyond the
    /// end yields zero.
    pub const fn served_len(&self, total_len: u64) -> u64 {
        if self.start >= total_len {
            return 0;
        }
        let last = if self.end < total_len - 1 {
            self.end
        } else {
            total_len - 1
        };
        last - self.start + 1
    }

    /// Offset of the last byte actually served, `None` for an empty slice
    pub const fn last_served(&self, total_len: u64) -> Option<u64> {
        match self.served_len(total_len) {
            0 => None,
            n => Some(self.start + n - 1),
        }
    }
}

/// Parse a Range header value of the form `bytes=<start>-<end>`
///
/// Surrounding whitespace is tolerated.
///
/// # Examples
/// ```
/// use minidav::http::range::{parse_range_header, ByteRange};
///
/// assert_eq!(parse_range_header("bytes=10-19"), ByteRange::new(10, 19));
/// assert_eq!(parse_range_header("bytes=19-10"), None);
/// assert_eq!(parse_range_header("bytes=0-9,20-29"), None);
/// ```
pub fn parse_range_header(header: &str) -> Option<ByteRange> {
    let spec = header.trim().strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;
    ByteRange::new(parse_offset(start_str)?, parse_offset(end_str)?)
}

/// Strict non-negative decimal, rejecting signs, empty strings and overflow
fn parse_offset(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
