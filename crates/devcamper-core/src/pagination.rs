//! Page window metadata for list responses.
//!
//! Serialized as part of the result envelope:
//!
//! ```json
//! {
//!   "next": { "page": 3, "limit": 10 },
//!   "prev": { "page": 1, "limit": 10 }
//! }
//! ```
//!
//! Either link is omitted when there is no such page.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::query::QueryError;

/// A reference to a neighbouring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    #[serde(skip)]
    pub page: u64,
    /// Page size that was applied
    #[serde(skip)]
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

impl PaginationMeta {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// Computes the page links for `total` matching records.
///
/// `next` is present iff `page * limit < total`, `prev` iff `page > 1`. A
/// window that overflows `u64` is past every possible record, so it has no
/// `next`.
pub fn paginate(total: u64, page: u64, limit: u64) -> Result<PaginationMeta, QueryError> {
    if page == 0 || limit == 0 {
        return Err(QueryError::InvalidPaginationArgs { page, limit });
    }

    let end = page.checked_mul(limit);
    let next = match end {
        Some(end) if end < total => Some(PageLink {
            page: page + 1,
            limit,
        }),
        _ => None,
    };
    let prev = (page > 1).then(|| PageLink {
        page: page - 1,
        limit,
    });

    Ok(PaginationMeta {
        page,
        limit,
        next,
        prev,
    })
}
