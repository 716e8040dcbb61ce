//! Waypost - lightweight service registry
//!
//! Services register themselves over HTTP, prove liveness with periodic
//! heartbeats, and are discovered through filtered, paginated queries.
//! All durable state lives in a shared key-value store; each entry is a
//! single key with a short TTL, so a silent service expires on its own.
//!
//! ## Components
//!
//! - **Key codec** ([`registry::keys`]): a service identity plus its status
//!   encoded into one composite lookup key; wildcard search keys for
//!   filtered queries.
//! - **Entry store** ([`registry::store`]): register, heartbeat,
//!   deregister and lookup against the key-value backend.
//! - **Discovery** ([`registry::discovery`]): filter fields plus pagination
//!   turned into a wildcard scan with a fixed page-size ceiling.
//! - **KV backends** ([`kv`]): Redis for production, in-memory for tests
//!   and dev mode.

pub mod config;
pub mod error;
pub mod kv;
pub mod registry;
pub mod routes;
pub mod server;
pub mod vocab;

pub use config::Args;
pub use error::{RegistryError, Result};
pub use server::{run, AppState};
