//! Firestore Tools CLI Library
//!
//! This library provides the functionality behind the `firestore-tools`
//! binary: a REST client for Firestore, an adapter that exposes it to the
//! core tree walker, configuration handling and the terminal demos.
//!
//! # Public API
//!
//! The primary public API is [`client::FirestoreClient`] together with
//! [`remote::FirestoreStore`], which can be handed to
//! [`firestore_tools_core::TreeWalker`]:
//!
//! ```no_run
//! use firestore_tools::client::{ConnectionSettings, FirestoreClient};
//! use firestore_tools::config::CliConfig;
//! use firestore_tools::remote::FirestoreStore;
//! use firestore_tools_core::{NodePath, TreeWalker, Visit};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = ConnectionSettings::from_config(&CliConfig::default(), "credential.json");
//! let store = FirestoreStore::new(FirestoreClient::connect(&settings)?);
//!
//! let mut visits: Vec<Visit> = Vec::new();
//! let summary = TreeWalker::default()
//!     .walk(&store, &NodePath::root(), &mut visits)
//!     .await?;
//! println!("{} nodes", summary.total());
//! # Ok(())
//! # }
//! ```

/// Service-account and emulator authorization.
pub mod auth;

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// HTTP client for the Firestore REST API.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

/// Terminal demo commands.
pub mod demos;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

/// Store traits implemented over the REST client.
pub mod remote;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
