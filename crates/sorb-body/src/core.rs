//! Core layer: pure transformations over buffered bytes and timestamps.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

/// Minimum interval between two progress callback invocations.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Interval gate for throttled callbacks.
///
/// [`ready`](Throttle::ready) passes on the first call and then at most
/// once per interval, no matter how often it is polled. Chunk arrival
/// frequency therefore never translates into callback frequency.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Record `now` and report whether the callback may fire.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.duration_since(prev) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Convert buffered bytes to text.
///
/// Invalid UTF-8 is replaced rather than rejected, so text access fails
/// only when the underlying read failed.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode buffered bytes as JSON into a caller-supplied shape.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Decode buffered bytes as XML into a caller-supplied shape.
pub fn decode_xml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, quick_xml::DeError> {
    quick_xml::de::from_str(&String::from_utf8_lossy(bytes))
}
