//! Handler abstraction and its bridge into axum.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;

use super::sink::{HttpResponseWriter, ResponseSink};

/// A request handler that writes its response through a [`ResponseSink`].
///
/// Handlers never see the concrete response type, which lets wrappers such
/// as [`Measured`](super::measurable::Measured) substitute a decorated sink.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn serve(&self, sink: &mut dyn ResponseSink, request: Request);
}

/// Turn a [`Handler`] into an axum handler function.
///
/// Each request gets a fresh [`HttpResponseWriter`] that becomes the
/// response once the handler returns.
pub fn endpoint<H: Handler>(
    handler: H,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    let handler = Arc::new(handler);
    move |request: Request| -> BoxFuture<'static, Response> {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let mut writer = HttpResponseWriter::new();
            handler.serve(&mut writer, request).await;
            writer.into_response()
        })
    }
}
