//! Firestore Tools Core Library
//!
//! Store capability traits, node paths and the pre-order tree walker used by
//! the `firestore-tools` CLI. Nothing here talks to the network: adapters
//! implement [`DocumentStore`] and hand it to [`TreeWalker`].

pub mod error;
pub mod memory;
pub mod paths;
pub mod sink;
pub mod store;
pub mod types;
pub mod walker;

// Re-export commonly used types
pub use error::*;
pub use memory::{MemoryCollection, MemoryDocument, MemoryStore};
pub use paths::default_config_path;
pub use sink::VisitSink;
pub use store::{CollectionLike, DocumentLike, DocumentStore};
pub use types::*;
pub use walker::{TreeWalker, WalkOptions};
