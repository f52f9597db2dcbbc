//! Response sinks.
//!
//! A [`ResponseSink`] is the channel a handler writes its response through.
//! Two implementations are provided:
//!
//! - [`HttpResponseWriter`]: the real channel, turned into an axum
//!   [`Response`] once the handler returns
//! - [`StatusCapture`]: a decorator that forwards everything to an inner sink
//!   and remembers the first status code written

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use thiserror::Error;

/// Error type for response body writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The underlying channel accepted fewer bytes than it was given.
    #[error("short write: {written} of {expected} bytes accepted")]
    ShortWrite { written: usize, expected: usize },
}

/// Capabilities a handler needs to produce a response.
pub trait ResponseSink: Send {
    /// Set the response status code.
    fn set_status(&mut self, status: StatusCode);

    /// Write bytes to the response body.
    ///
    /// Returns the number of bytes the channel accepted.
    fn write_body(&mut self, bytes: &[u8]) -> Result<usize, SinkError>;

    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

impl<T: ResponseSink + ?Sized> ResponseSink for &mut T {
    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status);
    }

    fn write_body(&mut self, bytes: &[u8]) -> Result<usize, SinkError> {
        (**self).write_body(bytes)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }
}

/// The real response channel.
///
/// The status is committed by the first `set_status` call or by the first
/// body write, whichever comes first. Once committed it cannot change; later
/// `set_status` calls are logged and ignored.
#[derive(Debug, Default)]
pub struct HttpResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpResponseWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an axum response. An uncommitted status becomes 200.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for HttpResponseWriter {
    fn set_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => {
                tracing::warn!(
                    committed = committed.as_u16(),
                    ignored = status.as_u16(),
                    "Superfluous status write ignored"
                );
            }
        }
    }

    fn write_body(&mut self, bytes: &[u8]) -> Result<usize, SinkError> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// Sink decorator that records the first status code written.
///
/// Every call is forwarded to the inner sink unchanged. The only state kept
/// is the captured status; nothing is buffered.
#[derive(Debug)]
pub struct StatusCapture<W> {
    inner: W,
    captured: Option<StatusCode>,
}

impl<W: ResponseSink> StatusCapture<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            captured: None,
        }
    }

    /// The first status written, or 200 if none was.
    pub fn captured_status(&self) -> StatusCode {
        self.captured.unwrap_or(StatusCode::OK)
    }

    /// Whether a status has been committed, explicitly or by a body write.
    pub fn is_committed(&self) -> bool {
        self.captured.is_some()
    }

    /// Unwrap the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseSink> ResponseSink for StatusCapture<W> {
    fn set_status(&mut self, status: StatusCode) {
        self.inner.set_status(status);
        if self.captured.is_none() {
            self.captured = Some(status);
        }
    }

    fn write_body(&mut self, bytes: &[u8]) -> Result<usize, SinkError> {
        // A body write commits the default status on the real channel.
        if self.captured.is_none() {
            self.captured = Some(StatusCode::OK);
        }
        let written = self.inner.write_body(bytes)?;
        if written < bytes.len() {
            return Err(SinkError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(written)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }
}
