use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::filter::FindOptions;
use crate::services::ServiceError;

/// Postgres OFFSET/LIMIT are bigint.
const MAX_WINDOW: u64 = i64::MAX as u64;

/// A validated page window. Construction is the only place page/limit are
/// checked, so a `PageRequest` in hand never needs re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, ServiceError> {
        if page < 1 {
            return Err(ServiceError::invalid_argument("page must be a positive integer"));
        }
        if limit < 1 {
            return Err(ServiceError::invalid_argument("limit must be a positive integer"));
        }

        let (page, limit) = (page as u64, limit as u64);
        match (page - 1).checked_mul(limit) {
            Some(skip) if skip <= MAX_WINDOW => Ok(Self { page, limit }),
            _ => Err(ServiceError::invalid_argument("page is out of range")),
        }
    }

    /// Parse raw query values, falling back to the configured defaults.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        defaults: &PaginationConfig,
    ) -> Result<Self, ServiceError> {
        let page = parse_param("page", page, defaults.default_page)?;
        let limit = parse_param("limit", limit, defaults.default_limit)?;
        Self::new(page, limit)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        // Bounded in new()
        (self.page - 1) * self.limit
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::new().skip(self.skip()).limit(self.limit)
    }
}

fn parse_param(name: &str, raw: Option<&str>, default: u64) -> Result<i64, ServiceError> {
    match raw.map(str::trim) {
        None | Some("") => i64::try_from(default)
            .map_err(|_| ServiceError::invalid_argument(format!("{} default is out of range", name))),
        Some(value) => value
            .parse::<i64>()
            .map_err(|_| ServiceError::invalid_argument(format!("{} must be a positive integer", name))),
    }
}

/// One page of records plus the echoed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: &PageRequest) -> Self {
        Self { data, page: request.page, limit: request.limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PaginationConfig {
        PaginationConfig { default_page: 1, default_limit: 10 }
    }

    #[test]
    fn defaults_apply_when_absent() {
        let req = PageRequest::from_query(None, None, &defaults()).unwrap();
        assert_eq!((req.page(), req.limit(), req.skip()), (1, 10, 0));

        let req = PageRequest::from_query(Some(""), Some("5"), &defaults()).unwrap();
        assert_eq!((req.page(), req.limit()), (1, 5));
    }

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        let req = PageRequest::new(3, 10).unwrap();
        assert_eq!(req.skip(), 20);
        assert_eq!(req.find_options(), FindOptions::new().skip(20).limit(10));
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        for (page, limit) in [("0", "10"), ("1", "0"), ("-2", "10"), ("abc", "10"), ("1", "1.5")] {
            let err = PageRequest::from_query(Some(page), Some(limit), &defaults()).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidArgument(_)), "{} {}", page, limit);
        }
    }

    #[test]
    fn rejects_overflowing_window() {
        let err = PageRequest::new(i64::MAX, i64::MAX).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m == "page is out of range"));
        assert!(PageRequest::new(1, i64::MAX).is_ok());
    }

    #[test]
    fn page_echoes_request() {
        let req = PageRequest::new(2, 3).unwrap();
        let page = Page::new(vec!["a", "b"], &req);
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v, serde_json::json!({ "data": ["a", "b"], "page": 2, "limit": 3 }));
    }
}
