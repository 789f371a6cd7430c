//! The history query engine: scan, sort, paginate.

use std::cmp::Reverse;

use pulse_types::{EventRecord, PageResult, Pagination};

use crate::error::{QueryError, ValidationError};
use crate::filter::{EventFilter, SortOrder, SortSpec};
use crate::store::EventStore;

/// A validated history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub filter: EventFilter,
    /// `None` keeps the store's scan order.
    pub sort: Option<SortSpec>,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
}

/// Runs `q` against `store` and returns the requested page.
///
/// The filter is pushed down to the store; sorting and slicing happen in
/// memory. Totals always describe the filtered set, and a page past the end
/// comes back empty with correct totals.
///
/// # Errors
///
/// Returns `QueryError::Validation` if `page` or `page_size` is zero, before
/// the store is touched, and `QueryError::Internal` if the scan fails.
pub fn query(store: &dyn EventStore, q: &HistoryQuery) -> Result<PageResult, QueryError> {
    if q.page < 1 {
        return Err(ValidationError::new("page", "must be at least 1").into());
    }
    if q.page_size < 1 {
        return Err(ValidationError::new("page_size", "must be at least 1").into());
    }

    let mut items = store.scan(&q.filter)?;

    if let Some(ref sort) = q.sort {
        sort_events(&mut items, sort);
    }

    Ok(paginate(items, q.page, q.page_size))
}

/// Stable sort on the string form of `spec.field`.
///
/// Records without the field sort as the empty string. Equal keys keep
/// their input order in both directions.
pub fn sort_events(items: &mut [EventRecord], spec: &SortSpec) {
    let key = |event: &EventRecord| event.field_text(&spec.field).unwrap_or_default();
    match spec.order {
        SortOrder::Asc => items.sort_by_cached_key(key),
        SortOrder::Desc => items.sort_by_cached_key(|e| Reverse(key(e))),
    }
}

fn paginate(items: Vec<EventRecord>, page: usize, page_size: usize) -> PageResult {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let offset = (page - 1).saturating_mul(page_size);

    let events = if offset >= total_items {
        Vec::new()
    } else {
        items.into_iter().skip(offset).take(page_size).collect()
    };

    PageResult {
        events,
        pagination: Pagination {
            current_page: page,
            total_pages,
            page_size,
            total_items,
        },
    }
}
