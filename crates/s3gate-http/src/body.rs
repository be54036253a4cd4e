//! Response body type shared by the service and backends.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;

/// A fully buffered response body, or none at all.
///
/// Every response the gateway itself produces (error documents, the health
/// reply, backend descriptions) is small and known up front.
#[derive(Debug, Default)]
pub struct GatewayBody {
    inner: Option<Full<Bytes>>,
}

impl GatewayBody {
    /// No content; used for HEAD, preflight and 204 replies.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Buffered content.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            inner: Some(Full::new(data.into())),
        }
    }
}

impl From<String> for GatewayBody {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

impl From<&'static str> for GatewayBody {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<u8>> for GatewayBody {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl Body for GatewayBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().inner {
            Some(full) => Pin::new(full).poll_frame(cx),
            None => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.as_ref().is_none_or(Full::is_end_stream)
    }

    fn size_hint(&self) -> SizeHint {
        self.inner
            .as_ref()
            .map_or_else(|| SizeHint::with_exact(0), Full::size_hint)
    }
}
