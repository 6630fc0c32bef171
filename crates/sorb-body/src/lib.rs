//! One-shot HTTP response body materialization.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - `data` - Immutable progress types
//! - `core` - Pure transformations (decoding, throttling)
//! - `effects` - I/O: the body entity and file output
//!
//! # Key Properties
//!
//! - **At-Most-One-Read**: the raw stream backing a [`Body`] is drained at
//!   most once; every in-memory accessor after the first is served from the
//!   cache
//! - **Sticky Failure**: a failed read poisons the body and replays the
//!   same error on every later call, never retrying the network
//! - **Bounded Streaming**: [`Body::save_to`] copies chunk by chunk without
//!   holding the whole body in memory, with progress callbacks throttled to
//!   one per [`PROGRESS_INTERVAL`]
//! - **Mechanism-Only**: no retry, no redirect handling, no progress UI;
//!   callers own all policy

mod core;
mod data;
mod effects;
mod error;

pub use crate::core::{PROGRESS_INTERVAL, Throttle, decode_json, decode_text, decode_xml};
pub use data::{Progress, ProgressCallback};
pub use effects::{Body, BodyStream};
pub use error::{BodyError, Result};
