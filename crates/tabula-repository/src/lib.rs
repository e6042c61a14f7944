//! Decision definition repositories for the Tabula decision engine
//!
//! This crate provides the lookup interface the resolver consults, two
//! backends, and the shared rule model cache.
//!
//! # Features
//!
//! - **In-memory repository**: publish deployments programmatically
//! - **File system repository**: deployment directories of YAML decision tables
//! - **Rule model cache**: bounded, read-through, single load per definition id
//!
//! # Quick Start
//!
//! ```no_run
//! use tabula_repository::{DecisionRepository, FileSystemDecisionRepository, RuleModelCache};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repo = FileSystemDecisionRepository::open("deployments").await?;
//!     let cache = RuleModelCache::default();
//!
//!     if let Some(definition) = repo.find_latest("discount", "").await? {
//!         let model = cache.get_or_load(&repo, &definition.id).await?;
//!         println!("{} has {} rules", definition.key, model.rules.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        Decision Resolver (sdk)         │
//! └──────────────┬─────────────────────────┘
//!                │ DecisionRepository trait
//!                ↓
//!       ┌────────┴────────┐
//!       ↓                 ↓
//! ┌──────────────┐  ┌──────────────────┐
//! │ InMemory     │  │  FileSystem      │
//! │ - deploy()   │  │  - deployment    │
//! │              │  │    directories   │
//! └──────────────┘  └──────────────────┘
//!
//!        RuleModelCache (keyed by definition id)
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod file_system;
mod index;
pub mod loader;
pub mod memory;
pub mod models;
pub mod traits;

pub use cache::RuleModelCache;
pub use config::{RepositoryConfig, RepositorySource};
pub use error::{RepositoryError, RepositoryResult};
pub use file_system::FileSystemDecisionRepository;
pub use loader::open_repository;
pub use memory::{DecisionResource, InMemoryDecisionRepository, NewDeployment};
pub use models::*;
pub use traits::*;
