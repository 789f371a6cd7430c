//! Unit tests for the history store and query engine.

use std::sync::atomic::{AtomicUsize, Ordering};

use pulse_db::{create_pool, run_migrations, DbRuntimeSettings};
use pulse_types::EventRecord;
use serde_json::json;

use crate::error::{QueryError, StoreError};
use crate::filter::{parse_date, EventFilter, SortOrder, SortSpec};
use crate::query::{query, HistoryQuery};
use crate::store::{EventStore, MemoryEventStore, SqliteEventStore};

/// Creates a SQLite-backed store on a single-connection in-memory pool.
fn sqlite_store() -> SqliteEventStore {
    let settings = DbRuntimeSettings {
        pool_max_size: 1,
        ..DbRuntimeSettings::default()
    };
    let pool = create_pool(":memory:", settings).expect("should create pool");
    {
        let conn = pool.get().expect("should get connection");
        run_migrations(&conn).expect("migrations should succeed");
    }
    SqliteEventStore::new(pool)
}

/// Even ids are sales (`venta`), odd ids resales (`reventa`).
fn event(id: usize, detail_type: &str, timestamp: &str) -> EventRecord {
    let operation = if id % 2 == 0 { "venta" } else { "reventa" };
    serde_json::from_value(json!({
        "id": format!("evt-{id:04}"),
        "source": "myapp",
        "detail-type": detail_type,
        "timestamp": timestamp,
        "operation": operation,
        "seq": id,
    }))
    .expect("event should deserialize")
}

fn numbered(count: usize) -> Vec<EventRecord> {
    (0..count)
        .map(|i| event(i, "test", &format!("2024-01-{:02}T00:00:00", (i % 28) + 1)))
        .collect()
}

fn page_query(page: usize, page_size: usize) -> HistoryQuery {
    HistoryQuery {
        filter: EventFilter::default(),
        sort: None,
        page,
        page_size,
    }
}

fn ids(events: &[EventRecord]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

/// A store that counts scans and can be told to fail.
#[derive(Default)]
struct ProbeStore {
    scans: AtomicUsize,
    fail: bool,
}

impl EventStore for ProbeStore {
    fn scan(&self, _filter: &EventFilter) -> Result<Vec<EventRecord>, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StoreError::Unavailable("table offline".to_string()))
        } else {
            Ok(Vec::new())
        }
    }

    fn put(&self, _event: &EventRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── store ────────────────────────────────────────────────────────────

#[test]
fn sqlite_scan_returns_insertion_order() {
    let store = sqlite_store();
    for e in [
        event(3, "test", "2024-03-01T00:00:00"),
        event(1, "test", "2024-01-01T00:00:00"),
        event(2, "test", "2024-02-01T00:00:00"),
    ] {
        store.put(&e).unwrap();
    }

    let all = store.scan(&EventFilter::default()).unwrap();
    assert_eq!(ids(&all), vec!["evt-0003", "evt-0001", "evt-0002"]);
}

#[test]
fn sqlite_scan_round_trips_payload() {
    let store = sqlite_store();
    let original = event(7, "test", "2024-05-05T12:00:00");
    store.put(&original).unwrap();

    let all = store.scan(&EventFilter::default()).unwrap();
    assert_eq!(all, vec![original]);
}

#[test]
fn sqlite_filters_agree_with_in_memory_predicate() {
    let events = vec![
        event(0, "venta", "2023-12-31T23:59:59"),
        event(1, "venta", "2024-01-01T00:00:00"),
        event(2, "reventa", "2024-01-15T08:00:00"),
        event(3, "venta", "2024-01-31T23:00:00"),
        event(4, "venta", "2024-02-01T00:00:00"),
        event(5, "venta", "bad"),
    ];
    let sqlite = sqlite_store();
    for e in &events {
        sqlite.put(e).unwrap();
    }
    let memory = MemoryEventStore::with_events(events);

    let filters = [
        EventFilter::default(),
        EventFilter {
            detail_type: Some("venta".to_string()),
            ..Default::default()
        },
        EventFilter {
            operation: Some("venta".to_string()),
            ..Default::default()
        },
        EventFilter {
            start_date: Some(parse_date("start_date", "2024-01-01").unwrap()),
            end_date: Some(parse_date("end_date", "2024-01-31").unwrap()),
            ..Default::default()
        },
        EventFilter {
            detail_type: Some("venta".to_string()),
            start_date: Some(parse_date("start_date", "2024-01-01").unwrap()),
            ..Default::default()
        },
        EventFilter {
            source: Some("elsewhere".to_string()),
            ..Default::default()
        },
    ];

    for filter in &filters {
        let from_sql = sqlite.scan(filter).unwrap();
        let from_mem = memory.scan(filter).unwrap();
        assert_eq!(ids(&from_sql), ids(&from_mem), "filter: {filter:?}");
    }
}

#[test]
fn date_range_is_inclusive_on_both_ends() {
    let store = sqlite_store();
    for (i, ts) in ["2023-12-31T23:59:59", "2024-01-01T00:00:00", "2024-01-31T23:59:59Z"]
        .iter()
        .enumerate()
    {
        store.put(&event(i, "test", ts)).unwrap();
    }

    let filter = EventFilter {
        start_date: Some(parse_date("start_date", "2024-01-01").unwrap()),
        end_date: Some(parse_date("end_date", "2024-01-31").unwrap()),
        ..Default::default()
    };
    let matched = store.scan(&filter).unwrap();
    assert_eq!(ids(&matched), vec!["evt-0001", "evt-0002"]);
}

// ── query ────────────────────────────────────────────────────────────

#[test]
fn third_page_of_120_holds_the_last_20() {
    let store = MemoryEventStore::with_events(numbered(120));

    let page = query(&store, &page_query(3, 50)).unwrap();

    assert_eq!(page.events.len(), 20);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.total_items, 120);
    assert_eq!(page.pagination.current_page, 3);
    assert_eq!(page.pagination.page_size, 50);
    assert_eq!(page.events[0].id, "evt-0100");
}

#[test]
fn empty_result_has_zero_pages() {
    let store = MemoryEventStore::new();

    let page = query(&store, &page_query(1, 50)).unwrap();

    assert!(page.events.is_empty());
    assert_eq!(page.pagination.total_items, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[test]
fn page_past_the_end_is_empty_with_totals() {
    let store = MemoryEventStore::with_events(numbered(10));

    let page = query(&store, &page_query(5, 5)).unwrap();

    assert!(page.events.is_empty());
    assert_eq!(page.pagination.total_items, 10);
    assert_eq!(page.pagination.total_pages, 2);
}

#[test]
fn total_pages_is_ceiling_of_items_over_size() {
    let store = MemoryEventStore::with_events(numbered(101));
    for size in [1, 7, 50, 100] {
        let page = query(&store, &page_query(1, size)).unwrap();
        assert_eq!(page.pagination.total_pages, 101_usize.div_ceil(size));
    }
}

#[test]
fn totals_count_filtered_items_not_table_rows() {
    let store = MemoryEventStore::with_events(numbered(30));
    let q = HistoryQuery {
        filter: EventFilter {
            operation: Some("venta".to_string()),
            ..Default::default()
        },
        ..page_query(1, 10)
    };

    let page = query(&store, &q).unwrap();

    assert_eq!(page.pagination.total_items, 15);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page
        .events
        .iter()
        .all(|e| e.payload["operation"] == "venta"));
}

#[test]
fn pages_of_a_filter_never_leak_other_records() {
    let store = MemoryEventStore::with_events(numbered(57));
    let filter = EventFilter {
        operation: Some("reventa".to_string()),
        ..Default::default()
    };

    let mut seen = Vec::new();
    for page_no in 1..=4 {
        let q = HistoryQuery {
            filter: filter.clone(),
            ..page_query(page_no, 9)
        };
        let page = query(&store, &q).unwrap();
        for e in &page.events {
            assert!(filter.matches(e));
            seen.push(e.id.clone());
        }
    }
    // 28 odd ids across pages of 9, no duplicates.
    assert_eq!(seen.len(), 28);
    seen.dedup();
    assert_eq!(seen.len(), 28);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let events = vec![
        event(1, "b", "2024-01-02"),
        event(2, "a", "2024-01-01"),
        event(3, "b", "2024-01-03"),
        event(4, "a", "2024-01-04"),
    ];
    let store = MemoryEventStore::with_events(events);

    let asc = HistoryQuery {
        sort: Some(SortSpec {
            field: "detail-type".to_string(),
            order: SortOrder::Asc,
        }),
        ..page_query(1, 10)
    };
    let page = query(&store, &asc).unwrap();
    assert_eq!(
        ids(&page.events),
        vec!["evt-0002", "evt-0004", "evt-0001", "evt-0003"]
    );

    let desc = HistoryQuery {
        sort: Some(SortSpec {
            field: "detail-type".to_string(),
            order: SortOrder::Desc,
        }),
        ..page_query(1, 10)
    };
    let page = query(&store, &desc).unwrap();
    assert_eq!(
        ids(&page.events),
        vec!["evt-0001", "evt-0003", "evt-0002", "evt-0004"]
    );
}

#[test]
fn missing_sort_field_sorts_as_empty_string() {
    let mut with_venue = event(1, "test", "2024-01-01");
    with_venue.payload.insert("venue".to_string(), json!("Monumental"));
    let without_venue = event(2, "test", "2024-01-02");
    let store = MemoryEventStore::with_events(vec![with_venue, without_venue]);

    let q = HistoryQuery {
        sort: Some(SortSpec {
            field: "venue".to_string(),
            order: SortOrder::Asc,
        }),
        ..page_query(1, 10)
    };
    let page = query(&store, &q).unwrap();
    assert_eq!(ids(&page.events), vec!["evt-0002", "evt-0001"]);
}

#[test]
fn sort_by_timestamp_descending() {
    let store = sqlite_store();
    for e in numbered(5) {
        store.put(&e).unwrap();
    }
    let q = HistoryQuery {
        sort: Some(SortSpec {
            field: "timestamp".to_string(),
            order: SortOrder::Desc,
        }),
        ..page_query(1, 2)
    };

    let page = query(&store, &q).unwrap();
    assert_eq!(ids(&page.events), vec!["evt-0004", "evt-0003"]);
    assert_eq!(page.pagination.total_pages, 3);
}

#[test]
fn inverted_date_range_yields_empty_set() {
    let store = MemoryEventStore::with_events(numbered(20));
    let q = HistoryQuery {
        filter: EventFilter {
            start_date: Some(parse_date("start_date", "2024-01-01").unwrap()),
            end_date: Some(parse_date("end_date", "2023-12-31").unwrap()),
            ..Default::default()
        },
        ..page_query(1, 50)
    };

    let page = query(&store, &q).unwrap();
    assert!(page.events.is_empty());
    assert_eq!(page.pagination.total_items, 0);
}

#[test]
fn invalid_paging_is_rejected_before_scanning() {
    let store = ProbeStore::default();

    let err = query(&store, &page_query(0, 10)).unwrap_err();
    assert!(matches!(err, QueryError::Validation(ref v) if v.field == "page"));

    let err = query(&store, &page_query(1, 0)).unwrap_err();
    assert!(matches!(err, QueryError::Validation(ref v) if v.field == "page_size"));

    assert_eq!(store.scans.load(Ordering::SeqCst), 0);
}

#[test]
fn store_failure_surfaces_as_internal() {
    let store = ProbeStore {
        fail: true,
        ..Default::default()
    };

    let err = query(&store, &page_query(1, 10)).unwrap_err();
    assert!(matches!(err, QueryError::Internal(_)));
    assert_eq!(store.scans.load(Ordering::SeqCst), 1);
}
