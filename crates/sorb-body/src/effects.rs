//! Effects layer: the one-shot body entity and its streaming file output.

use std::mem;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use sorb_http::{BoxStream, InFlight};

use crate::core::{self, PROGRESS_INTERVAL, Throttle};
use crate::data::{Progress, ProgressCallback};
use crate::error::{BodyError, Result};

/// The stream type consumed by [`Body`]. Items carry the client's boxed
/// error; the materializer flattens it into [`BodyError::Network`] at the
/// point of consumption.
pub type BodyStream =
    BoxStream<'static, std::result::Result<Bytes, Box<dyn std::error::Error + Send>>>;

/// Where the one-shot stream currently is in its lifecycle.
enum BodyState {
    /// Raw stream unread; owns the underlying connection.
    Pending(BodyStream),
    /// Fully buffered; authoritative for every further access.
    Buffered(Bytes),
    /// Consumed by a streaming copy; nothing was cached.
    Drained,
    /// Sticky failure; replayed verbatim on every access.
    Failed(Arc<BodyError>),
}

/// A one-shot HTTP response body with memoized accessors.
///
/// The raw stream is read at most once no matter how many accessors are
/// called or in what order. The first in-memory accessor buffers the whole
/// stream and caches it; [`save_to`](Body::save_to) streams straight to
/// disk when nothing is cached yet. A failed read poisons the body: every
/// later call returns the same error without touching the network.
///
/// Materializing accessors take `&mut self`, so the first touch is
/// serialized by ownership rather than by a lock.
pub struct Body {
    state: BodyState,
    content_length: Option<u64>,
    on_progress: Option<ProgressCallback>,
}

impl Body {
    /// Wrap an unread stream and its expected total size.
    pub fn new(stream: BodyStream, content_length: Option<u64>) -> Self {
        Self {
            state: BodyState::Pending(stream),
            content_length,
            on_progress: None,
        }
    }

    /// Build a body from the transport layer's hand-off value.
    pub fn from_in_flight<E>(raw: InFlight<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let stream = raw
            .stream
            .map(|item| item.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>));
        Self::new(Box::pin(stream), raw.content_length)
    }

    /// Build a body that is poisoned from birth, for responses whose
    /// request already failed. Every accessor returns `err`.
    pub fn failed(err: BodyError) -> Self {
        Self {
            state: BodyState::Failed(Arc::new(err)),
            content_length: None,
            on_progress: None,
        }
    }

    /// Install a progress reporter for streaming file transfers.
    ///
    /// The callback fires only from [`save_to`](Body::save_to), only when
    /// the expected total size is known and positive, and at most once per
    /// [`PROGRESS_INTERVAL`] plus a forced final invocation at completion.
    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Expected total body size, `None` when the server did not declare one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The cached body, if an in-memory accessor already materialized it.
    pub fn cached(&self) -> Option<&Bytes> {
        match &self.state {
            BodyState::Buffered(cached) => Some(cached),
            _ => None,
        }
    }

    /// Materialize the whole body as bytes.
    ///
    /// The first successful call drains the raw stream and caches the
    /// result; later calls return the cache without any I/O. A failed read
    /// is just as sticky: the partial data is discarded and the same error
    /// comes back from every subsequent accessor.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        match mem::replace(&mut self.state, BodyState::Drained) {
            BodyState::Failed(err) => {
                let replay = BodyError::Shared(Arc::clone(&err));
                self.state = BodyState::Failed(err);
                Err(replay)
            }
            BodyState::Buffered(cached) => {
                let out = cached.clone();
                self.state = BodyState::Buffered(cached);
                Ok(out)
            }
            BodyState::Drained => Err(BodyError::Consumed),
            BodyState::Pending(stream) => match read_to_end(stream, self.content_length).await {
                Ok(buffered) => {
                    debug!(bytes = buffered.len(), "buffered response body");
                    self.state = BodyState::Buffered(buffered.clone());
                    Ok(buffered)
                }
                Err(err) => {
                    let err = Arc::new(err);
                    self.state = BodyState::Failed(Arc::clone(&err));
                    Err(BodyError::Shared(err))
                }
            },
        }
    }

    /// Materialize the body as text.
    ///
    /// Uses lossy UTF-8 conversion, so this fails iff the buffered read
    /// failed.
    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(core::decode_text(&bytes))
    }

    /// Decode the body as JSON into a caller-supplied shape.
    ///
    /// Fails with the buffered-read error, or [`BodyError::Json`] when the
    /// bytes are not well-formed for the target.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(core::decode_json(&bytes)?)
    }

    /// Decode the body as XML into a caller-supplied shape.
    ///
    /// Fails with the buffered-read error, or [`BodyError::Xml`] when the
    /// bytes are not well-formed for the target.
    pub async fn xml<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(core::decode_xml(&bytes)?)
    }

    /// Best-effort variant of [`bytes`](Body::bytes): returns an empty
    /// buffer instead of an error.
    pub async fn bytes_or_default(&mut self) -> Bytes {
        self.bytes().await.unwrap_or_default()
    }

    /// Best-effort variant of [`text`](Body::text): returns an empty
    /// string instead of an error.
    pub async fn text_or_default(&mut self) -> String {
        self.text().await.unwrap_or_default()
    }

    /// Persist the body to `path`, creating or truncating the destination.
    ///
    /// Picks the cheapest correct path: an already-buffered body is written
    /// straight from the cache (repeatable, no network I/O); otherwise the
    /// raw stream is copied to the file chunk by chunk without ever holding
    /// the whole body in memory, with throttled progress reporting when a
    /// callback is installed and the expected size is known and positive.
    /// Returns the number of bytes written.
    ///
    /// The destination is opened before the stream is touched, so an open
    /// failure leaves the body unread and usable. Once the copy has
    /// started, the stream is consumed regardless of outcome: a failed
    /// transfer removes the partially written file best-effort, and later
    /// in-memory accessors return [`BodyError::Consumed`] (or replay the
    /// read error that aborted the copy).
    pub async fn save_to(&mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        match mem::replace(&mut self.state, BodyState::Drained) {
            BodyState::Failed(err) => {
                let replay = BodyError::Shared(Arc::clone(&err));
                self.state = BodyState::Failed(err);
                Err(replay)
            }
            BodyState::Buffered(cached) => {
                self.state = BodyState::Buffered(cached.clone());
                debug!(path = %path.display(), bytes = cached.len(), "writing cached body");
                let mut file = File::create(path).await?;
                file.write_all(&cached).await?;
                file.flush().await?;
                Ok(cached.len() as u64)
            }
            BodyState::Drained => Err(BodyError::Consumed),
            BodyState::Pending(stream) => {
                let file = match File::create(path).await {
                    Ok(file) => file,
                    Err(e) => {
                        // Stream untouched; put it back.
                        self.state = BodyState::Pending(stream);
                        return Err(BodyError::Io(e));
                    }
                };

                let outcome = match (&self.on_progress, self.content_length) {
                    (Some(callback), Some(total)) if total > 0 => {
                        debug!(path = %path.display(), total, "streaming body with progress");
                        copy_with_progress(stream, file, total, callback).await
                    }
                    _ => {
                        debug!(path = %path.display(), "streaming body");
                        copy_plain(stream, file).await
                    }
                };

                match outcome {
                    Ok(written) => Ok(written),
                    Err(err) => {
                        if tokio::fs::remove_file(path).await.is_err() {
                            trace!(path = %path.display(), "partial file cleanup failed");
                        }
                        match err {
                            // Read failures stay sticky, like a failed
                            // buffered read.
                            BodyError::Network(_) => {
                                let err = Arc::new(err);
                                self.state = BodyState::Failed(Arc::clone(&err));
                                Err(BodyError::Shared(err))
                            }
                            other => Err(other),
                        }
                    }
                }
            }
        }
    }
}

/// Drain the stream into one buffer. The stream is dropped, and with it
/// the connection, on every exit path.
async fn read_to_end(mut stream: BodyStream, size_hint: Option<u64>) -> Result<Bytes> {
    let mut buf = match size_hint {
        Some(n) => BytesMut::with_capacity(usize::try_from(n).unwrap_or(0)),
        None => BytesMut::new(),
    };
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BodyError::Network(e.to_string()))?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

async fn copy_plain(mut stream: BodyStream, mut file: File) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BodyError::Network(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn copy_with_progress(
    mut stream: BodyStream,
    mut file: File,
    total: u64,
    callback: &ProgressCallback,
) -> Result<u64> {
    let mut written = 0u64;
    let mut throttle = Throttle::new(PROGRESS_INTERVAL);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BodyError::Network(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        if throttle.ready(Instant::now()) {
            callback(&Progress::new(written, Some(total)));
        }
    }
    file.flush().await?;
    // Forced final invocation so the reporter always sees the true total.
    callback(&Progress::new(written, Some(total)));
    Ok(written)
}
