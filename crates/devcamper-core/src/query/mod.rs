//! Query compilation for list endpoints.
//!
//! Turns the raw, client-controlled query string of a list request into a
//! [`QueryDescriptor`]: a filter predicate tree, a projection, sort keys, a
//! page window and an optional relation expansion.
//!
//! # Query syntax
//!
//! ```text
//! GET /api/v1/bootcamps?careers=Business&averageCost[lte]=10000&select=name,careers&sort=-name&page=2&limit=2
//! ```
//!
//! - `field=value` filters on equality
//! - `field[gt|gte|lt|lte|in]=value` filters with a comparison operator
//! - `select` is a comma-separated projection
//! - `sort` is a comma-separated list of fields, `-` prefix for descending
//! - `page` / `limit` select the page window
//!
//! Only the fixed operator whitelist is recognised. Any other bracketed key is
//! kept verbatim as a field name and compared for equality, which matches
//! nothing.

mod compiler;
mod filter;
mod params;

pub use compiler::{
    CompileOptions, DEFAULT_LIMIT, Expand, Projection, QueryDescriptor, RESERVED_KEYS, Relation,
    SortDirection, SortKey, compile,
};
pub use filter::{Clause, Comparison, Filter, FilterValue, Operator, compare_values, lookup};
pub use params::RawParams;

/// Errors raised while compiling a query or computing its page window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query parameters cannot be turned into a safe descriptor.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),
    /// `page` or `limit` was zero.
    #[error("Invalid pagination arguments: page={page}, limit={limit}")]
    InvalidPaginationArgs { page: u64, limit: u64 },
}
