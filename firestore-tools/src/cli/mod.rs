//! Command-line surface of `firestore-tools`
//!
//! - [`commands`] - clap definitions of every subcommand
//! - [`handlers`] - what each subcommand does once parsed

mod commands;
mod handlers;

pub use commands::*;
pub use handlers::*;
