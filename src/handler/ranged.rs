//! Range responder
//!
//! Streams one inclusive byte slice of a seekable resource into a sink.
//! The slice length is fixed from the resource's total length before any
//! byte moves, so headers can be built first.

use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt, DuplexStream,
    ReadBuf,
};

use crate::error::DavError;
use crate::http::{ByteRange, PartialContent};
use crate::logger;

/// Bytes buffered between the copy task and the response body
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Header values for serving `range` out of `total_len` bytes
pub const fn plan_range(range: ByteRange, total_len: u64) -> PartialContent {
    PartialContent {
        start: range.start(),
        last: range.last_served(total_len),
        total: total_len,
    }
}

/// Copy the bytes `range` selects from `resource` into `out`
///
/// Ranges running past the end are truncated; a start past the end writes
/// nothing. `resource` is consumed and released on every return path. A
/// resource that yields fewer bytes than `total_len` promised is an I/O
/// failure.
pub async fn serve_range<R, W>(
    mut resource: R,
    range: ByteRange,
    total_len: u64,
    out: &mut W,
) -> Result<u64, DavError>
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    let count = range.served_len(total_len);
    if count == 0 {
        return Ok(0);
    }

    resource.seek(SeekFrom::Start(range.start())).await?;
    let mut slice = resource.take(count);
    let copied = tokio::io::copy(&mut slice, out).await?;
    out.flush().await?;

    if copied < count {
        return Err(DavError::ResourceIo(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("resource ended after {copied} of {count} bytes"),
        )));
    }
    Ok(copied)
}

/// Response body carrying one slice, fed by [`serve_range`] in its own task
///
/// At most `STREAM_BUFFER_SIZE` bytes of the slice are in memory at once.
/// Dropping the body (client gone) makes the copy task fail its next write
/// and release the resource.
#[derive(Debug)]
pub struct SliceBody {
    reader: DuplexStream,
    remaining: u64,
    buffer: Vec<u8>,
}

/// Start copying the bytes `range` selects from `resource` into a body
pub fn stream_range<R>(resource: R, range: ByteRange, total_len: u64) -> SliceBody
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    let remaining = range.served_len(total_len);
    let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER_SIZE);

    if remaining > 0 {
        tokio::spawn(async move {
            if let Err(e) = serve_range(resource, range, total_len, &mut writer).await {
                logger::log_warning(&format!(
                    "Range transfer bytes={}-{} aborted: {e}",
                    range.start(),
                    range.end()
                ));
            }
        });
    }

    SliceBody {
        reader,
        remaining,
        buffer: vec![0; STREAM_BUFFER_SIZE],
    }
}

impl Body for SliceBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        let this = &mut *self;
        if this.remaining == 0 {
            return Poll::Ready(None);
        }

        let want = usize::try_from(this.remaining)
            .unwrap_or(usize::MAX)
            .min(this.buffer.len());
        let mut read_buf = ReadBuf::new(&mut this.buffer[..want]);

        match Pin::new(&mut this.reader).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                this.remaining = 0;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Ok(())) if read_buf.filled().is_empty() => {
                // Copy task stopped early; the declared length cannot be met
                let missing = this.remaining;
                this.remaining = 0;
                Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("range transfer ended {missing} bytes short"),
                ))))
            }
            Poll::Ready(Ok(())) => {
                let chunk = Bytes::copy_from_slice(read_buf.filled());
                this.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn hundred_bytes() -> Vec<u8> {
        (0u8..100).collect()
    }

    async fn serve(range: ByteRange) -> Vec<u8> {
        let data = hundred_bytes();
        let mut out = Vec::new();
        let n = serve_range(Cursor::new(data), range, 100, &mut out).await.unwrap();
        assert_eq!(n as usize, out.len());
        out
    }

    #[tokio::test]
    async fn test_exact_slice() {
        let out = serve(ByteRange::new(10, 19).unwrap()).await;
        assert_eq!(out, (10u8..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_slice_past_end_truncates() {
        let out = serve(ByteRange::new(90, 150).unwrap()).await;
        assert_eq!(out, (90u8..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_start_past_end_is_empty() {
        let out = serve(ByteRange::new(100, 200).unwrap()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_single_byte() {
        let out = serve(ByteRange::new(0, 0).unwrap()).await;
        assert_eq!(out, vec![0]);
    }

    #[tokio::test]
    async fn test_every_range_matches_min_formula() {
        for a in (0..100).step_by(7) {
            for b in (a..130).step_by(11) {
                let out = serve(ByteRange::new(a, b).unwrap()).await;
                let expected = b.min(99) - a + 1;
                assert_eq!(out.len() as u64, expected, "bytes={a}-{b}");
                assert_eq!(u64::from(out[0]), a);
            }
        }
    }

    #[test]
    fn test_plan_range_headers() {
        let plan = plan_range(ByteRange::new(90, 150).unwrap(), 100);
        assert_eq!(plan.content_length(), 10);
        assert_eq!(plan.content_range().as_deref(), Some("bytes 90-99/100"));

        let empty = plan_range(ByteRange::new(120, 130).unwrap(), 100);
        assert_eq!(empty.content_length(), 0);
        assert_eq!(empty.content_range(), None);
    }

    /// Reader that fails after seeking and reports when it is dropped
    struct FailingResource {
        released: Arc<AtomicBool>,
    }

    impl Drop for FailingResource {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    impl AsyncRead for FailingResource {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("disk read failed")))
        }
    }

    impl AsyncSeek for FailingResource {
        fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
            Ok(())
        }

        fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
            Poll::Ready(Ok(0))
        }
    }

    #[tokio::test]
    async fn test_io_failure_releases_resource() {
        let released = Arc::new(AtomicBool::new(false));
        let resource = FailingResource {
            released: Arc::clone(&released),
        };
        let mut out = Vec::new();

        let err = serve_range(resource, ByteRange::new(0, 9).unwrap(), 100, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, DavError::ResourceIo(_)));
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_short_resource_is_io_failure() {
        // Claims 100 bytes but only holds 50
        let data: Vec<u8> = (0u8..50).collect();
        let mut out = Vec::new();
        let err = serve_range(Cursor::new(data), ByteRange::new(40, 60).unwrap(), 100, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, DavError::ResourceIo(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_serves_from_file() {
        let file = tokio::fs::File::open("fixtures/root/hundred.bin").await.unwrap();
        let total = file.metadata().await.unwrap().len();
        let mut out = Vec::new();
        serve_range(file, ByteRange::new(10, 19).unwrap(), total, &mut out)
            .await
            .unwrap();
        assert_eq!(out, b"0123456789");
    }

    /// In-memory resource that reports when it is dropped
    struct TrackedResource {
        inner: Cursor<Vec<u8>>,
        released: Arc<AtomicBool>,
    }

    impl TrackedResource {
        fn new(released: &Arc<AtomicBool>) -> Self {
            Self {
                inner: Cursor::new(hundred_bytes()),
                released: Arc::clone(released),
            }
        }
    }

    impl Drop for TrackedResource {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    impl AsyncRead for TrackedResource {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    impl AsyncSeek for TrackedResource {
        fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
            Pin::new(&mut self.inner).start_seek(position)
        }

        fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
            Pin::new(&mut self.inner).poll_complete(cx)
        }
    }

    #[tokio::test]
    async fn test_success_releases_resource() {
        let released = Arc::new(AtomicBool::new(false));
        let mut out = Vec::new();

        let n = serve_range(
            TrackedResource::new(&released),
            ByteRange::new(10, 19).unwrap(),
            100,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(n, 10);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_slice_releases_resource() {
        let released = Arc::new(AtomicBool::new(false));
        let mut out = Vec::new();
        serve_range(
            TrackedResource::new(&released),
            ByteRange::new(100, 120).unwrap(),
            100,
            &mut out,
        )
        .await
        .unwrap();
        assert!(out.is_empty());
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stream_range_body() {
        let body = stream_range(Cursor::new(hundred_bytes()), ByteRange::new(90, 150).unwrap(), 100);
        assert_eq!(body.size_hint().exact(), Some(10));

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), (90u8..100).collect::<Vec<_>>().as_slice());
    }

    #[tokio::test]
    async fn test_stream_range_larger_than_buffer() {
        let total = STREAM_BUFFER_SIZE * 3 + 17;
        let data: Vec<u8> = (0..total).map(|i| (i % 251) as u8).collect();
        let body = stream_range(
            Cursor::new(data.clone()),
            ByteRange::new(5, total as u64 - 1).unwrap(),
            total as u64,
        );

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), &data[5..]);
    }

    #[tokio::test]
    async fn test_stream_range_empty_slice() {
        let body = stream_range(Cursor::new(hundred_bytes()), ByteRange::new(200, 300).unwrap(), 100);
        assert!(body.is_end_stream());
        assert!(body.collect().await.unwrap().to_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_stream_range_short_resource_errors() {
        let data: Vec<u8> = (0u8..50).collect();
        let body = stream_range(Cursor::new(data), ByteRange::new(40, 60).unwrap(), 100);
        assert!(body.collect().await.is_err());
    }

    #[tokio::test]
    async fn test_stream_range_releases_resource_after_body_drained() {
        let released = Arc::new(AtomicBool::new(false));
        let body = stream_range(TrackedResource::new(&released), ByteRange::new(0, 9).unwrap(), 100);
        body.collect().await.unwrap();

        // The copy task drops the resource right after its final write
        for _ in 0..100 {
            if released.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(released.load(Ordering::SeqCst));
    }
}
