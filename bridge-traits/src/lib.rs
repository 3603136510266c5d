//! # Host Bridge Traits
//!
//! Capability traits the sync engine is written against.
//!
//! ## Overview
//!
//! The reconciliation engine never talks to the network or the system clock
//! directly. Each capability it needs is a trait here, implemented by a
//! concrete adapter crate and injected at construction time, so the engine
//! can be driven against in-memory fakes in tests.
//!
//! ## Traits
//!
//! - [`RecordStore`](store::RecordStore) - create/update/delete/list against the remote store
//! - [`HttpClient`](http::HttpClient) - single-shot async HTTP exchange
//! - [`Clock`](time::Clock) - time source for deterministic timestamps
//!
//! ## Implementations
//!
//! | Trait         | Implementation Crate |
//! |---------------|----------------------|
//! | `HttpClient`  | `bridge-desktop`     |
//! | `RecordStore` | `provider-supabase`  |
//!
//! ## Error Handling
//!
//! Transport-level failures use [`BridgeError`](error::BridgeError); record
//! store failures use [`StoreError`](store::StoreError), which carries the
//! status code and the store's message/hint/details.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared behind
//! `Arc`.

pub mod error;
pub mod http;
pub mod store;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use store::{Record, RecordKey, RecordStore, StoreError, StoreResult};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
