//! Record persistence for the Aura cognitive mirror.
//!
//! Three collections ([`RecordKind`]) are stored as JSON bodies keyed by
//! id. Re-saving an id overwrites; loading returns every record of a kind.
//!
//! # Backends
//!
//! ```text
//! RecordStore
//!     |-- Memory     (in-process, tests and offline runs)
//!     |-- Dragonfly  (HSET {prefix}:{kind} id json)
//!     +-- Postgres   (records(kind, id, body JSONB))
//! ```
//!
//! # Modules
//!
//! - [`store`] -- [`RecordStore`] dispatch and typed loaders
//! - [`memory`] -- In-process store
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) hashes
//! - [`postgres`] -- `PostgreSQL` pool, migrations and upserts
//! - [`error`] -- Shared error types
//!
//! [`RecordKind`]: aura_types::RecordKind

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyStore;
pub use error::DbError;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use store::RecordStore;
