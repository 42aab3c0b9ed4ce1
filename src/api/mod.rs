//! Typed endpoint functions for the Repotoire cloud API
//!
//! Each submodule owns the request/response shapes for one resource and a
//! set of free functions taking an [`ApiClient`]. Nothing here caches;
//! caching and invalidation happen in `hooks`.

pub mod analytics;
pub mod billing;
pub mod findings;
pub mod fixes;
pub mod marketplace;
pub mod repositories;

use std::borrow::Cow;

use crate::http::QueryParams;
use crate::models::ListParams;

pub use crate::http::{ApiClient, ApiError, ApiResult};

/// Percent-encode a path segment (ids, slugs)
pub(crate) fn seg(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// Pagination and sort parameters in wire order
pub(crate) fn list_query(params: &ListParams, query: &mut QueryParams) {
    query.push("page", params.page);
    query.push("page_size", params.page_size);
    query.push_opt("sort_by", params.sort_by.as_deref());
    if params.sort_by.is_some() {
        query.push("sort_direction", params.sort_direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;

    #[test]
    fn test_seg_escapes() {
        assert_eq!(seg("abc-123"), "abc-123");
        assert_eq!(seg("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_list_query_omits_direction_without_sort() {
        let mut q = QueryParams::new();
        list_query(&ListParams::default(), &mut q);
        let pairs = q.into_vec();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("page".to_string(), "1".to_string()));

        let mut q = QueryParams::new();
        list_query(
            &ListParams::page(2, 50).sorted_by("severity", SortDirection::Asc),
            &mut q,
        );
        let pairs = q.into_vec();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[3], ("sort_direction".to_string(), "asc".to_string()));
    }
}
