//! quill-core - Core library for Quill
//!
//! This crate contains the shared models, local database layer, remote API
//! client, and the offline-first synchronization engine used by all Quill
//! front-ends. Data is served instantly from the local store, refreshed
//! opportunistically from the remote service, and every state transition is
//! surfaced to observers as an ordered stream of [`Resource`] values.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod resource;
pub mod sync;
#[cfg(test)]
pub(crate) mod test_support;
pub mod util;
pub mod worker;

pub use error::{Error, Result};
pub use models::{Note, Tombstone};
pub use resource::{Resource, Status};
pub use sync::SyncEngine;
