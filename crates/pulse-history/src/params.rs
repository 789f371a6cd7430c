//! Query-string parameters for the history endpoint.
//!
//! Every parameter arrives as an optional raw string so that malformed
//! values become field-specific [`ValidationError`]s here, at parse time,
//! instead of generic deserialisation rejections.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::filter::{parse_date, EventFilter, SortOrder, SortSpec};
use crate::query::HistoryQuery;

/// Raw query-string parameters of `GET /v1/events/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(rename = "detail-type")]
    pub detail_type: Option<String>,
    pub source: Option<String>,
    pub operation: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Page-size policy applied at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Used when `page_size` is absent.
    pub default_page_size: usize,
    /// Upper clamp for `page_size`. The lower clamp is always 1.
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl HistoryParams {
    /// Validates the raw parameters and builds the engine query.
    ///
    /// Empty strings are treated as absent. `page_size` is clamped to
    /// `1..=limits.max_page_size`; `page` is passed through unclamped so the
    /// engine can reject it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first malformed field.
    pub fn into_query(self, limits: PageLimits) -> Result<HistoryQuery, ValidationError> {
        let start_date = non_empty(self.start_date)
            .map(|raw| parse_date("start_date", &raw))
            .transpose()?;
        let end_date = non_empty(self.end_date)
            .map(|raw| parse_date("end_date", &raw))
            .transpose()?;

        let page = match non_empty(self.page) {
            Some(raw) => parse_count("page", &raw)?,
            None => 1,
        };
        if page < 1 {
            return Err(ValidationError::new("page", "must be at least 1"));
        }

        let page_size = match non_empty(self.page_size) {
            Some(raw) => parse_count("page_size", &raw)?,
            None => limits.default_page_size,
        }
        .clamp(1, limits.max_page_size.max(1));

        let sort = non_empty(self.sort_by).map(|field| SortSpec {
            field,
            order: SortOrder::from_param(self.sort_order.as_deref()),
        });

        Ok(HistoryQuery {
            filter: EventFilter {
                detail_type: non_empty(self.detail_type),
                source: non_empty(self.source),
                operation: non_empty(self.operation),
                start_date,
                end_date,
            },
            sort,
            page,
            page_size,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_count(field: &'static str, raw: &str) -> Result<usize, ValidationError> {
    // Negative numbers are reported as "at least 1" rather than as a parse
    // failure.
    match raw.trim().parse::<i64>() {
        Ok(n) if n < 1 => Err(ValidationError::new(field, "must be at least 1")),
        Ok(n) => usize::try_from(n)
            .map_err(|_| ValidationError::new(field, format!("out of range: {raw}"))),
        Err(_) => Err(ValidationError::new(
            field,
            format!("expected a positive integer, got '{raw}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HistoryParams {
        HistoryParams::default()
    }

    #[test]
    fn defaults_apply_when_absent() {
        let q = params().into_query(PageLimits::default()).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 50);
        assert_eq!(q.sort, None);
        assert_eq!(q.filter, EventFilter::default());
    }

    #[test]
    fn page_size_is_clamped() {
        let big = HistoryParams {
            page_size: Some("1000".to_string()),
            ..params()
        };
        assert_eq!(big.into_query(PageLimits::default()).unwrap().page_size, 100);
    }

    #[test]
    fn page_zero_is_rejected() {
        let p = HistoryParams {
            page: Some("0".to_string()),
            ..params()
        };
        let err = p.into_query(PageLimits::default()).unwrap_err();
        assert_eq!(err.field, "page");
    }

    #[test]
    fn non_numeric_page_size_is_rejected() {
        let p = HistoryParams {
            page_size: Some("lots".to_string()),
            ..params()
        };
        let err = p.into_query(PageLimits::default()).unwrap_err();
        assert_eq!(err.field, "page_size");
    }

    #[test]
    fn malformed_start_date_names_start_date() {
        let p = HistoryParams {
            start_date: Some("not-a-date".to_string()),
            ..params()
        };
        let err = p.into_query(PageLimits::default()).unwrap_err();
        assert_eq!(err.field, "start_date");
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn sort_and_filters_are_carried_through() {
        let p = HistoryParams {
            detail_type: Some("venta".to_string()),
            source: Some(" ".to_string()),
            sort_by: Some("timestamp".to_string()),
            sort_order: Some("desc".to_string()),
            end_date: Some("2024-12-31".to_string()),
            ..params()
        };
        let q = p.into_query(PageLimits::default()).unwrap();
        assert_eq!(q.filter.detail_type.as_deref(), Some("venta"));
        assert_eq!(q.filter.source, None);
        assert_eq!(q.filter.end_bound().as_deref(), Some("2024-12-31"));
        assert_eq!(
            q.sort,
            Some(SortSpec {
                field: "timestamp".to_string(),
                order: SortOrder::Desc,
            })
        );
    }
}
