//! # DevCamper DB
//!
//! The document store behind the DevCamper API.
//!
//! Records are JSON objects grouped into [`Collection`]s. Every document has
//! an `_id` (UUID string) and a `createdAt` timestamp, both assigned on
//! insert when absent.
//!
//! - [`store`]: the [`DocumentStore`] trait and its query/update types
//! - [`postgres`]: PostgreSQL JSONB implementation
//! - [`memory`]: in-process implementation for tests and local runs
//! - [`expand`]: resolves related documents into results
//! - [`results`]: the list pipeline (compile, count, fetch, expand, paginate)
//!
//! # Example
//!
//! ```ignore
//! use devcamper_db::{Collection, PgStore, advanced_results};
//!
//! let store = PgStore::connect(&database_url).await?;
//! store.migrate().await?;
//!
//! let body = advanced_results(&store, Collection::Bootcamps, &raw, &options).await?;
//! ```

pub mod collection;
pub mod error;
pub mod expand;
pub mod memory;
pub mod postgres;
pub mod results;
pub mod store;

pub use collection::Collection;
pub use error::StoreError;
pub use expand::expand;
pub use memory::MemoryStore;
pub use postgres::{PgStore, init_db_pool};
pub use results::advanced_results;
pub use store::{Document, DocumentStore, FindQuery, Update, id_filter};

pub use sqlx::PgPool;
