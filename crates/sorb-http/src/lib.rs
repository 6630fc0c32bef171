//! Minimal async HTTP client seam for streaming response bodies.
//!
//! This crate defines the input boundary of the `sorb` workspace: the
//! [`HttpClient`] trait produces an [`InFlight`] value pairing the unread
//! response body stream with its expected total size. Everything above this
//! seam (body materialization, file output, progress reporting) lives in
//! `sorb-body`; everything below it (TLS, redirects, pooling, retries) is
//! the client implementation's business.

mod client;

pub use client::{BoxStream, HttpClient, InFlight};

#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;
