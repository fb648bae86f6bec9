//! Cryptomoon - crypto market and moon-phase chat client library
//!
//! This library provides the core of the Cryptomoon terminal client: two
//! backend clients, a keyword router that picks between them, local JSON
//! caches for the transcript and the daily moon phase, a concurrent
//! summary aggregator and a periodic refresh loop.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `domain`: Chat items, payload variants and tool descriptors
//! - `api`: HTTP clients for the crypto and moon backends and their wire DTOs
//! - `storage`: JSON file caches for the transcript and the moon phase
//! - `router`: Keyword-based backend selection
//! - `repository`: Routing, tools, the time-gated moon cache and the combined summary
//! - `refresh`: Periodic summary refresh with broadcast to subscribers
//! - `session`: Chat state and event handling
//! - `render`: Terminal rendering of chat items
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use cryptomoon::{ChatRepository, Config, Repository};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let repository = Repository::from_config(&config)?;
//!     let items = repository.send_message("what is the moon phase today?").await?;
//!     println!("{} items", items.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod refresh;
pub mod render;
pub mod report;
pub mod repository;
pub mod router;
pub mod session;
pub mod storage;
pub mod usecases;

// Re-export commonly used types
pub use config::Config;
pub use domain::{ChatItem, ChatPayload, ChatRole, ToolItem, ToolSource};
pub use error::{CryptomoonError, Result};
pub use repository::{ChatRepository, Repository};
pub use router::{detect_backend, BackendKind};

#[cfg(test)]
pub(crate) mod test_utils;
