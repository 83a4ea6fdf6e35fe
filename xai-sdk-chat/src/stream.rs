//! Streaming chat completions.

use chrono::{SecondsFormat, Utc};
use futures::Stream;
use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::Span;
use opentelemetry::KeyValue;
use tracing::{debug, trace};

use xai_sdk_core::{CallContext, ChunkStream, Result, XaiError};
use xai_sdk_streaming::{Chunk, Response};

use crate::telemetry;

/// A server stream of completion chunks folded into one [`Response`].
///
/// Each call to [`ChatStream::next`] receives one chunk, merges it into the
/// aggregate and returns a handle on the updated response. The stream is
/// half-closed and its span ended on every terminating path: end of stream,
/// error, [`ChatStream::close`] or drop.
pub struct ChatStream {
    stream: Option<Box<dyn ChunkStream>>,
    response: Response,
    last_chunk: Option<Chunk>,
    span: Option<BoxedSpan>,
    ctx: CallContext,
    first_chunk_seen: bool,
    finished: bool,
}

impl ChatStream {
    pub(crate) fn new(
        stream: Box<dyn ChunkStream>,
        response: Response,
        span: Option<BoxedSpan>,
        ctx: CallContext,
    ) -> Self {
        Self {
            stream: Some(stream),
            response,
            last_chunk: None,
            span,
            ctx,
            first_chunk_seen: false,
            finished: false,
        }
    }

    /// Receive the next chunk.
    ///
    /// Returns the aggregated response after the chunk was applied, `None`
    /// once the server ends the stream, or an error exactly once before
    /// iteration stops.
    pub async fn next(&mut self) -> Option<Result<Response>> {
        if self.finished {
            return None;
        }
        let Some(stream) = self.stream.as_mut() else {
            self.finished = true;
            return None;
        };

        let received = self
            .ctx
            .run(stream.message())
            .await
            .map_err(XaiError::from);

        match received {
            Ok(Some(chunk)) => {
                if !self.first_chunk_seen {
                    self.first_chunk_seen = true;
                    if let Some(span) = self.span.as_mut() {
                        span.set_attribute(KeyValue::new(
                            "gen_ai.completion.start_time",
                            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                        ));
                    }
                }

                self.response.auto_demote(&chunk);
                self.response.process_chunk(&chunk);
                trace!(outputs = chunk.outputs.len(), "chunk received");
                self.last_chunk = Some(Chunk::new(chunk, self.response.index()));
                Some(Ok(self.response.clone()))
            }
            Ok(None) => {
                debug!("stream finished");
                if let Some(span) = self.span.as_mut() {
                    telemetry::succeed_span(span, std::slice::from_ref(&self.response));
                }
                self.close();
                None
            }
            Err(err) => {
                debug!(error = %err, "stream failed");
                if let Some(span) = self.span.as_mut() {
                    telemetry::fail_span(span, &err);
                }
                self.close();
                Some(Err(err))
            }
        }
    }

    /// The aggregated response so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The last chunk received, filtered to the selected output(s).
    pub fn chunk(&self) -> Option<&Chunk> {
        self.last_chunk.as_ref()
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Half-close the stream and end the span. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.finished = true;
        if let Some(mut stream) = self.stream.take() {
            stream.close_send();
        }
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }

    /// Adapt into a [`futures::Stream`] of aggregated responses.
    pub fn into_stream(self) -> impl Stream<Item = Result<Response>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let item = stream.next().await?;
            Some((item, stream))
        })
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("response", &self.response)
            .field("closed", &self.is_closed())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
