//! alertscale-state — embedded replica store for alertscale.
//!
//! Backed by [redb](https://docs.rs/redb), persists the replica bounds and
//! current replica count of every scalable function. Records are
//! JSON-serialized into redb's `&[u8]` value columns under
//! `{namespace}/{name}` keys, so a namespace is a prefix scan.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across request handlers.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
