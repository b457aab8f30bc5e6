//! # DevCamper Core
//!
//! Shared building blocks for the DevCamper API:
//!
//! - [`errors`]: the HTTP-facing [`AppError`]
//! - [`query`]: compiles list-request query parameters into a bounded, structured
//!   [`QueryDescriptor`](query::QueryDescriptor)
//! - [`pagination`]: page links from a total, page and limit
//! - [`envelope`]: the `{success, count, pagination, data}` list body
//! - [`serde`]: serde helpers for the document models
//!
//! # Example
//!
//! ```ignore
//! use devcamper_core::query::{CompileOptions, RawParams, compile};
//! use devcamper_core::{ResultEnvelope, paginate};
//!
//! let raw = RawParams::from_pairs([("averageCost[lte]", "10000"), ("page", "2")]);
//! let descriptor = compile(&raw, &CompileOptions::default())?;
//!
//! let records = fetch(&descriptor).await?;
//! let meta = paginate(total, descriptor.page, descriptor.limit)?;
//! let body = ResultEnvelope::build(records, meta);
//! ```

pub mod envelope;
pub mod errors;
pub mod pagination;
pub mod query;
pub mod serde;

pub use axum::http::StatusCode;
pub use envelope::ResultEnvelope;
pub use errors::AppError;
pub use pagination::{PageLink, PaginationMeta, paginate};
pub use query::{QueryDescriptor, QueryError};
