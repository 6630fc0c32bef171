//! Data layer: immutable progress types.

/// Snapshot of a streaming transfer, handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes written to the destination so far. Non-decreasing across
    /// invocations within one transfer.
    pub bytes_transferred: u64,
    /// Expected total from the Content-Length header, `None` when unknown.
    /// Informational only; the true transferred count may exceed it when
    /// the server lied about the length.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }

    pub fn percentage(&self) -> Option<f32> {
        self.total_bytes.map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.bytes_transferred as f32 / total as f32) * 100.0
            }
        })
    }
}

/// Callback invoked during a streaming file transfer, never from the
/// in-memory accessors. Invocations are throttled; see
/// [`PROGRESS_INTERVAL`](crate::PROGRESS_INTERVAL).
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;
