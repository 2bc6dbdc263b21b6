//! Core engine for the meshboard dashboard: request scheduling and the
//! reactive entity store.
//!
//! The moving parts:
//!
//! - [`Engine`] — session-scoped container wiring everything together.
//! - [`Scheduler`] — FIFO batch queue; one batch in flight at a time,
//!   per-target fan-out concurrent within a batch.
//! - [`Store`] — tag-keyed tables replaced wholesale on ingest, with
//!   derived composite counts and `watch`-based subscriptions.
//! - [`Target`] — the closed taxonomy of entity classes.
//!
//! Reads flow `Scheduler -> Transport -> Store -> subscribers`; views
//! never talk to the network and the store is never written except by
//! ingest.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
mod routes;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod target;
pub mod transport;

pub use batch::{BatchRequest, BatchResults, BatchTicket, Operation};
pub use config::{ControllerConfig, TlsVerification};
pub use engine::Engine;
pub use error::CoreError;
pub use routes::DEFAULT_SITE;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use store::{Record, Store, Table};
pub use stream::{TableStream, TableWatchStream};
pub use target::Target;
pub use transport::Transport;
