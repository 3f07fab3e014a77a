//! Streaming Parser: bounded-memory feature extraction from chunked input.
//!
//! ## State machine
//!
//! ```text
//!          feed / push_bytes                       batch full
//!  Idle ───────────────────▶ Accumulating ─▶ Extracting ─────▶ Flushing
//!                                 ▲               │                │
//!                                 └───────────────┴────────────────┘
//!                                        finish
//!  Accumulating ──────────────────────────────────▶ Draining ─▶ Done
//! ```
//!
//! Every chunk is appended to a text buffer which is then scanned for
//! complete `featureMember` / `member` wrappers. Each wrapper is parsed on
//! its own, inside a synthetic `FeatureCollection` that replays the root's
//! namespace declarations, and the processed prefix of the buffer is
//! dropped. A wrapper that fails to parse is reported and skipped.
//!
//! A response whose root is an OWS exception report yields no features; the
//! report is decoded when input ends and surfaces as one
//! [`GmlError::OwsException`] through the error handlers.
//!
//! Features are delivered in batches. Within one flush all synchronous
//! handlers run in extraction order and all asynchronous handler futures
//! are awaited together; flushes never overlap.

mod scanner;

use futures::future::{LocalBoxFuture, join_all};
use futures::{FutureExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace, warn};

use crate::base::Dialect;
use crate::base::constants::{FEATURE_MEMBER, namespace};
use crate::builder::Builder;
use crate::error::{GmlError, Result};
use crate::exception::{is_ows_exception_report, parse_exception_report};
use crate::parser::GmlParser;

/// Default number of features per flush.
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default accumulation buffer limit (10 MiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Streaming configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub batch_size: usize,
    pub max_buffer_size: usize,
    /// Dialect forced on every extracted feature; detected when `None`.
    pub version: Option<Dialect>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            version: None,
        }
    }
}

impl StreamOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    pub fn with_version(mut self, version: Dialect) -> Self {
        self.version = Some(version);
        self
    }
}

/// Where the parser is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Nothing fed yet.
    #[default]
    Idle,
    /// Waiting for more input.
    Accumulating,
    /// Scanning the buffer for wrappers.
    Extracting,
    /// Delivering a batch to the handlers.
    Flushing,
    /// End of input; delivering the last partial batch.
    Draining,
    /// Finished; further input is ignored.
    Done,
}

type FeatureHandler<T> = Box<dyn FnMut(&T)>;
type AsyncFeatureHandler<T> = Box<dyn Fn(T) -> LocalBoxFuture<'static, ()>>;
type ErrorHandler = Box<dyn FnMut(&GmlError)>;
type EndHandler = Box<dyn FnMut(usize)>;

/// Incremental feature extractor over a [`Builder`].
pub struct StreamingParser<B: Builder> {
    builder: B,
    parser: GmlParser,
    options: StreamOptions,
    state: StreamState,
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending_bytes: Vec<u8>,
    root_declarations: Option<Vec<(String, String)>>,
    /// The root is an exception report; it is decoded whole at `finish`.
    exception_report: bool,
    batch: Vec<B::Output>,
    feature_count: usize,
    flush_count: usize,
    feature_handlers: Vec<FeatureHandler<B::Output>>,
    async_handlers: Vec<AsyncFeatureHandler<B::Output>>,
    error_handlers: Vec<ErrorHandler>,
    end_handlers: Vec<EndHandler>,
}

impl<B> StreamingParser<B>
where
    B: Builder,
    B::Output: Clone + 'static,
{
    pub fn new(builder: B) -> Self {
        Self::with_options(builder, StreamOptions::default())
    }

    pub fn with_options(builder: B, options: StreamOptions) -> Self {
        Self {
            builder,
            parser: GmlParser::default(),
            options: StreamOptions {
                batch_size: options.batch_size.max(1),
                ..options
            },
            state: StreamState::Idle,
            buffer: String::new(),
            pending_bytes: Vec::new(),
            root_declarations: None,
            exception_report: false,
            batch: Vec::new(),
            feature_count: 0,
            flush_count: 0,
            feature_handlers: Vec::new(),
            async_handlers: Vec::new(),
            error_handlers: Vec::new(),
            end_handlers: Vec::new(),
        }
    }

    /// Use a custom parser (e.g. one with its own version detector).
    pub fn with_parser(mut self, parser: GmlParser) -> Self {
        self.parser = parser;
        self
    }

    /// Register a handler called for every delivered feature.
    pub fn on_feature(&mut self, handler: impl FnMut(&B::Output) + 'static) -> &mut Self {
        self.feature_handlers.push(Box::new(handler));
        self
    }

    /// Register an asynchronous feature handler. All futures of one flush
    /// are awaited together before the flush completes.
    pub fn on_feature_async<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(B::Output) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.async_handlers
            .push(Box::new(move |feature| handler(feature).boxed_local()));
        self
    }

    /// Register a handler for non-fatal stream errors.
    pub fn on_error(&mut self, handler: impl FnMut(&GmlError) + 'static) -> &mut Self {
        self.error_handlers.push(Box::new(handler));
        self
    }

    /// Register a handler called once at the end with the feature count.
    pub fn on_end(&mut self, handler: impl FnMut(usize) + 'static) -> &mut Self {
        self.end_handlers.push(Box::new(handler));
        self
    }

    /// Features delivered so far.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Flushes performed so far.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Bytes currently held in the accumulation buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Feed a text chunk.
    pub async fn feed(&mut self, chunk: &str) {
        if self.state == StreamState::Done {
            warn!(len = chunk.len(), "chunk after end of stream ignored");
            return;
        }
        self.buffer.push_str(chunk);
        self.process().await;
    }

    /// Feed raw bytes. A UTF-8 sequence split across chunks is held back
    /// until its remaining bytes arrive.
    pub async fn push_bytes(&mut self, bytes: &[u8]) {
        if self.state == StreamState::Done {
            warn!(len = bytes.len(), "chunk after end of stream ignored");
            return;
        }
        self.pending_bytes.extend_from_slice(bytes);
        let text = self.take_decoded();
        self.buffer.push_str(&text);
        self.process().await;
    }

    /// Signal end of input: drain the buffer and deliver the last batch.
    pub async fn finish(&mut self) {
        if self.state == StreamState::Done {
            return;
        }
        if !self.pending_bytes.is_empty() {
            let rest = std::mem::take(&mut self.pending_bytes);
            self.buffer.push_str(&String::from_utf8_lossy(&rest));
            self.process().await;
        }

        self.state = StreamState::Draining;
        if self.exception_report && !self.buffer.trim().is_empty() {
            let error = match parse_exception_report(&self.buffer) {
                Ok(report) => GmlError::OwsException(report),
                Err(cause) => cause,
            };
            warn!(error = %error, "stream is an exception report");
            self.report(error);
            self.buffer.clear();
        }
        if !self.batch.is_empty() {
            self.flush().await;
        }
        if !self.buffer.trim().is_empty() {
            trace!(len = self.buffer.len(), "discarding unterminated tail");
        }
        self.buffer.clear();
        self.state = StreamState::Done;

        debug!(
            features = self.feature_count,
            flushes = self.flush_count,
            "stream complete"
        );
        let count = self.feature_count;
        for handler in &mut self.end_handlers {
            handler(count);
        }
    }

    /// Drive the parser from a stream of byte chunks until it ends.
    ///
    /// Returns the number of delivered features.
    pub async fn parse_stream<S>(&mut self, stream: S) -> usize
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(chunk) = stream.next().await {
            self.push_bytes(chunk.as_ref()).await;
        }
        self.finish().await;
        self.feature_count
    }

    /// Drive the parser from an async reader until EOF.
    ///
    /// Read errors end the stream early and are returned.
    pub async fn parse_reader<R>(&mut self, reader: R) -> Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = reader;
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let read = reader.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            self.push_bytes(&chunk[..read]).await;
        }
        self.finish().await;
        Ok(self.feature_count)
    }

    /// Decode the longest valid UTF-8 prefix of the pending bytes.
    fn take_decoded(&mut self) -> String {
        let mut text = String::new();
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending_bytes.clear();
                    return text;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid_up_to]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending_bytes.drain(..valid_up_to);
                            return text;
                        }
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid_up_to + invalid);
                        }
                    }
                }
            }
        }
    }

    /// Extract every complete wrapper, trim the buffer, and flush full
    /// batches.
    async fn process(&mut self) {
        self.state = StreamState::Extracting;

        if self.root_declarations.is_none() {
            self.root_declarations = scanner::root_declarations(&self.buffer);
            if self.root_declarations.is_some() && is_ows_exception_report(&self.buffer) {
                debug!("stream root is an exception report");
                self.exception_report = true;
            }
        }

        let wrappers = if self.exception_report {
            Vec::new()
        } else {
            scanner::find_wrappers(&self.buffer)
        };
        let consumed = wrappers.iter().map(|w| w.end).max().unwrap_or(0);

        for wrapper in &wrappers {
            trace!(
                wrapper = wrapper.local_name,
                start = wrapper.start,
                end = wrapper.end,
                "extracting wrapper"
            );
            let document = self.synthetic_collection(
                &self.buffer[wrapper.start..wrapper.end],
                wrapper.local_name,
            );
            match self.parser.parse_feature_members(
                &document,
                self.options.version,
                &self.builder,
            ) {
                Ok(features) => self.batch.extend(features),
                Err(cause) => {
                    warn!(error = %cause, "feature failed to parse");
                    self.report(GmlError::feature_failure(cause));
                }
            }
            if self.batch.len() >= self.options.batch_size {
                self.flush().await;
                self.state = StreamState::Extracting;
            }
        }

        self.buffer.drain(..consumed);

        if wrappers.is_empty() && self.buffer.len() > self.options.max_buffer_size {
            let size = self.buffer.len();
            warn!(size, limit = self.options.max_buffer_size, "buffer overflow, discarding buffer");
            self.buffer.clear();
            self.report(GmlError::BufferOverflow {
                size,
                limit: self.options.max_buffer_size,
            });
        }

        self.state = StreamState::Accumulating;
    }

    /// Wrap one wrapper element in a minimal collection document.
    fn synthetic_collection(&self, wrapper: &str, local_name: &str) -> String {
        let (wfs, gml) = if local_name == FEATURE_MEMBER {
            (namespace::WFS_LEGACY, namespace::GML_LEGACY)
        } else {
            (namespace::WFS_20, namespace::GML_32)
        };

        let mut declarations: Vec<(&str, &str)> = self
            .root_declarations
            .iter()
            .flatten()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
            .collect();
        for (prefix, uri) in [("wfs", wfs), ("gml", gml)] {
            if !declarations.iter().any(|(p, _)| *p == prefix) {
                declarations.push((prefix, uri));
            }
        }

        let mut document = String::with_capacity(wrapper.len() + 256);
        document.push_str("<wfs:FeatureCollection");
        for (prefix, uri) in declarations {
            let uri = quick_xml::escape::escape(uri);
            if prefix.is_empty() {
                document.push_str(&format!(" xmlns=\"{uri}\""));
            } else {
                document.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
            }
        }
        document.push('>');
        document.push_str(wrapper);
        document.push_str("</wfs:FeatureCollection>");
        document
    }

    /// Deliver the pending batch to every handler.
    async fn flush(&mut self) {
        self.state = StreamState::Flushing;
        let batch = std::mem::take(&mut self.batch);

        for feature in &batch {
            for handler in &mut self.feature_handlers {
                handler(feature);
            }
        }
        if !self.async_handlers.is_empty() {
            let pending: Vec<_> = batch
                .iter()
                .flat_map(|feature| self.async_handlers.iter().map(move |h| h(feature.clone())))
                .collect();
            join_all(pending).await;
        }

        self.feature_count += batch.len();
        self.flush_count += 1;
        debug!(
            batch = batch.len(),
            total = self.feature_count,
            flush = self.flush_count,
            "flushed feature batch"
        );
    }

    fn report(&mut self, error: GmlError) {
        for handler in &mut self.error_handlers {
            handler(&error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MEMBER: &str = r#"<wfs:member><app:T gml:id="t1"><app:geometry><gml:Point><gml:pos>1 2</gml:pos></gml:Point></app:geometry></app:T></wfs:member>"#;

    #[tokio::test]
    async fn test_utf8_sequence_split_across_chunks() {
        let mut parser = StreamingParser::new(ModelBuilder);
        let names = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&names);
        parser.on_feature(move |object| {
            if let crate::model::GmlObject::Feature(feature) = object {
                sink.borrow_mut().push(feature.properties["name"].clone());
            }
        });

        let xml = "<wfs:member><app:T><app:name>Zürich</app:name></app:T></wfs:member>".as_bytes();
        let split = xml.iter().position(|b| *b == 0xC3).unwrap() + 1;
        parser.push_bytes(&xml[..split]).await;
        parser.push_bytes(&xml[split..]).await;
        parser.finish().await;

        assert_eq!(*names.borrow(), vec![serde_json::json!("Zürich")]);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut parser = StreamingParser::new(ModelBuilder);
        assert_eq!(parser.state(), StreamState::Idle);
        parser.feed("<wfs:FeatureCollection>").await;
        assert_eq!(parser.state(), StreamState::Accumulating);
        parser.feed(MEMBER).await;
        assert_eq!(parser.buffer_len(), 0);
        assert_eq!(parser.feature_count(), 0);
        parser.finish().await;
        assert_eq!(parser.state(), StreamState::Done);
        assert_eq!(parser.feature_count(), 1);
        parser.feed(MEMBER).await;
        assert_eq!(parser.feature_count(), 1);
    }

    #[tokio::test]
    async fn test_root_declarations_are_replayed() {
        let mut parser = StreamingParser::new(ModelBuilder);
        parser.feed(r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:app="urn:app">"#).await;
        let document = parser.synthetic_collection(MEMBER, "member");
        assert!(document.contains(r#"xmlns:app="urn:app""#));
        assert_eq!(document.matches("xmlns:gml=").count(), 1);
    }
}
