//! Event-history retrieval for the Pulse services.
//!
//! Events are written by upstream producers into the `events_history`
//! table; this crate only reads them. A query runs in three steps:
//!
//! 1. **Scan.** The [`EventStore`] returns every record matching the
//!    [`EventFilter`] (a conjunction of `detail-type`, `source`,
//!    `operation` equality and an inclusive calendar-date range).
//! 2. **Sort.** Optionally, a stable sort on the string form of one
//!    attribute, ascending unless `sort_order=desc`.
//! 3. **Paginate.** Offset slicing with totals computed over the filtered
//!    set, never the raw table.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pulse_history::{query, HistoryParams, PageLimits, SqliteEventStore};
//!
//! let store = SqliteEventStore::new(pool);
//! let q = params.into_query(PageLimits::default())?;
//! let page = query(&store, &q)?;
//! ```

mod error;
mod filter;
mod params;
mod query;
mod store;

pub use error::{QueryError, StoreError, ValidationError};
pub use filter::{parse_date, EventFilter, SortOrder, SortSpec, DATE_FORMAT};
pub use params::{HistoryParams, PageLimits};
pub use query::{query, sort_events, HistoryQuery};
pub use store::{EventStore, MemoryEventStore, SqliteEventStore};

#[cfg(test)]
mod tests;
