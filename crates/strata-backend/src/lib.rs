//! Durable record backends for the strata versioned store.
//!
//! A backend persists one opaque record per `(key, sequence number)` pair —
//! the raw material the history index builds version sequences from. Two
//! implementations are provided:
//!
//! - [`FjallBackend`] — persistent storage in a Fjall keyspace at a named
//!   location.
//! - [`MemoryBackend`] — volatile in-memory storage, discarded on drop.

mod disk;
mod error;
mod memory;
mod traits;

pub use disk::FjallBackend;
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use traits::VersionBackend;
