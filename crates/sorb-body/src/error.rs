//! Error types for sorb-body.

use std::io;
use std::sync::Arc;

use thiserror::Error;

pub type Result<T, E = BodyError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BodyError {
    /// Transport-level failure: the request itself failed, or the raw
    /// stream errored while being drained. Sticky once recorded.
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML body: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("destination I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("body already consumed by a streaming transfer")]
    Consumed,

    /// Replay of the one sticky error recorded when the stream failed.
    /// Displays exactly as the original failure.
    #[error(transparent)]
    Shared(Arc<BodyError>),
}
