//! `startIndex` / `limit` window required by every list endpoint.

use serde::Deserialize;

use crate::errors::AppError;

/// Raw pagination query parameters, parsed by [`Pagination::window`] so that
/// malformed values produce the API's own 400 envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub start_index: Option<String>,
    pub limit: Option<String>,
}

/// A validated offset/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Pagination {
    /// Maximum items per page.
    const MAX_LIMIT: i64 = 100;

    /// Both parameters are required; `startIndex` must be >= 0 and `limit` > 0.
    pub fn window(&self) -> Result<Window, AppError> {
        let invalid = || {
            AppError::Validation(
                "startIndex and limit query parameters are required and must be valid numbers"
                    .to_string(),
            )
        };

        let offset: i64 = self
            .start_index
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(invalid)?;
        let limit: i64 = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(invalid)?;

        if offset < 0 || limit <= 0 {
            return Err(invalid());
        }

        Ok(Window {
            offset,
            limit: limit.min(Self::MAX_LIMIT),
        })
    }
}

/// Free-text search parameter shared by the search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    pub fn term(&self) -> Result<&str, AppError> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("Search parameter is required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(start: Option<&str>, limit: Option<&str>) -> Pagination {
        Pagination {
            start_index: start.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn window_accepts_zero_start() {
        let w = raw(Some("0"), Some("10")).window().unwrap();
        assert_eq!(w, Window { offset: 0, limit: 10 });
    }

    #[test]
    fn window_requires_both_parameters() {
        assert!(raw(None, Some("10")).window().is_err());
        assert!(raw(Some("0"), None).window().is_err());
    }

    #[test]
    fn window_rejects_non_positive_limit_and_negative_start() {
        assert!(raw(Some("0"), Some("0")).window().is_err());
        assert!(raw(Some("-1"), Some("5")).window().is_err());
        assert!(raw(Some("abc"), Some("5")).window().is_err());
    }

    #[test]
    fn window_clamps_limit() {
        let w = raw(Some("20"), Some("500")).window().unwrap();
        assert_eq!(w.limit, 100);
        assert_eq!(w.offset, 20);
    }

    #[test]
    fn search_term_is_required() {
        assert!(SearchQuery::default().term().is_err());
        let q = SearchQuery {
            search: Some("  solar ".into()),
        };
        assert_eq!(q.term().unwrap(), "solar");
    }
}
