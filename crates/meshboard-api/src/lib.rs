//! Async REST transport for the meshboard dashboard engine.
//!
//! This crate owns everything HTTP: building a TLS-aware
//! [`reqwest::Client`] from a [`TransportConfig`], injecting the API-key
//! header, issuing requests, and normalizing controller responses and
//! error envelopes into [`Error`]. It knows nothing about targets,
//! batches, or the reactive store — `meshboard-core` drives it through
//! the plain [`ApiClient::request`] surface.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, HttpMethod};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
