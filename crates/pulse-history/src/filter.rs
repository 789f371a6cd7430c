//! Filter and sort criteria for history queries.

use chrono::NaiveDate;
use pulse_types::EventRecord;

use crate::error::ValidationError;

/// Calendar-date format accepted for `start_date` and `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Conjunction of predicates applied by the store during a scan.
///
/// Every `Some` field must match for a record to be returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Exact `detail-type`.
    pub detail_type: Option<String>,
    /// Exact `source`.
    pub source: Option<String>,
    /// Exact string value of the payload's `operation` attribute.
    pub operation: Option<String>,
    /// Earliest calendar date of the timestamp, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Latest calendar date of the timestamp, inclusive.
    pub end_date: Option<NaiveDate>,
}

impl EventFilter {
    /// Returns true if the record satisfies every predicate.
    ///
    /// An inverted date range matches nothing. A record whose timestamp has
    /// no date prefix never matches a date bound.
    pub fn matches(&self, event: &EventRecord) -> bool {
        if let Some(ref dt) = self.detail_type {
            if &event.detail_type != dt {
                return false;
            }
        }
        if let Some(ref source) = self.source {
            if &event.source != source {
                return false;
            }
        }
        if let Some(ref op) = self.operation {
            if event.payload.get("operation").and_then(|v| v.as_str()) != Some(op.as_str()) {
                return false;
            }
        }
        if self.has_date_range() {
            let Some(date) = event.date() else {
                return false;
            };
            if let Some(start) = self.start_bound() {
                if date < start.as_str() {
                    return false;
                }
            }
            if let Some(end) = self.end_bound() {
                if date > end.as_str() {
                    return false;
                }
            }
        }
        true
    }

    /// True when either date bound is set.
    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// The start bound as a `YYYY-MM-DD` string, comparable against
    /// timestamp prefixes.
    pub fn start_bound(&self) -> Option<String> {
        self.start_date.map(|d| d.format(DATE_FORMAT).to_string())
    }

    /// The end bound as a `YYYY-MM-DD` string.
    pub fn end_bound(&self) -> Option<String> {
        self.end_date.map(|d| d.format(DATE_FORMAT).to_string())
    }
}

/// Parses a `YYYY-MM-DD` query parameter.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field` if `raw` is not a valid
/// calendar date.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::new(field, format!("expected YYYY-MM-DD, got '{raw}'")))
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `"desc"` sorts descending; anything else, including no value, sorts
    /// ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

/// Which attribute to sort on, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Wire name of the attribute (`timestamp`, `detail-type`, or a payload
    /// key).
    pub field: String,
    pub order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(detail_type: &str, source: &str, timestamp: &str) -> EventRecord {
        serde_json::from_value(json!({
            "id": format!("{detail_type}-{timestamp}"),
            "source": source,
            "detail-type": detail_type,
            "timestamp": timestamp,
            "operation": "venta",
        }))
        .unwrap()
    }

    fn date(raw: &str) -> NaiveDate {
        parse_date("start_date", raw).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EventFilter::default().matches(&event("test", "myapp", "2024-01-01T00:00:00")));
    }

    #[test]
    fn equality_predicates_are_conjunctive() {
        let filter = EventFilter {
            detail_type: Some("test".to_string()),
            source: Some("myapp".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&event("test", "myapp", "2024-01-01")));
        assert!(!filter.matches(&event("test", "other", "2024-01-01")));
        assert!(!filter.matches(&event("other", "myapp", "2024-01-01")));
    }

    #[test]
    fn operation_matches_payload_attribute() {
        let filter = EventFilter {
            operation: Some("reventa".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&event("test", "myapp", "2024-01-01")));

        let mut resale = event("test", "myapp", "2024-01-01");
        resale.payload.insert("operation".to_string(), json!("reventa"));
        assert!(filter.matches(&resale));
    }

    #[test]
    fn date_bounds_are_inclusive_calendar_days() {
        let filter = EventFilter {
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-31")),
            ..Default::default()
        };
        assert!(filter.matches(&event("t", "s", "2024-01-01T00:00:00")));
        assert!(filter.matches(&event("t", "s", "2024-01-31T23:59:59Z")));
        assert!(!filter.matches(&event("t", "s", "2023-12-31T23:59:59")));
        assert!(!filter.matches(&event("t", "s", "2024-02-01T00:00:00")));
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let filter = EventFilter {
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2023-12-31")),
            ..Default::default()
        };
        assert!(!filter.matches(&event("t", "s", "2024-01-01T00:00:00")));
        assert!(!filter.matches(&event("t", "s", "2023-12-31T00:00:00")));
    }

    #[test]
    fn malformed_timestamp_never_matches_a_range() {
        let filter = EventFilter {
            start_date: Some(date("2000-01-01")),
            ..Default::default()
        };
        assert!(!filter.matches(&event("t", "s", "2024")));
    }

    #[test]
    fn parse_date_names_the_field() {
        let err = parse_date("end_date", "not-a-date").unwrap_err();
        assert_eq!(err.field, "end_date");
        assert!(err.to_string().contains("end_date"));
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        assert_eq!(SortOrder::from_param(None), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("DESC")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Desc);
    }
}
