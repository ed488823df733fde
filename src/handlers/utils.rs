use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::config::PaginationConfig;
use crate::error::ApiError;
use crate::services::PageRequest;

/// `?page=&limit=` kept as raw strings so bad values surface as 400 with
/// our own message instead of a query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self, defaults: &PaginationConfig) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::from_query(self.page.as_deref(), self.limit.as_deref(), defaults)?)
    }
}

pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id '{}': expected a UUID", raw)))
}

pub fn caller(extension: Option<Extension<CallerIdentity>>) -> Option<CallerIdentity> {
    extension.map(|Extension(caller)| caller)
}
