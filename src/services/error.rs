use thiserror::Error;

use crate::database::models::{Entity, FieldErrors};
use crate::database::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{message}")]
    Validation { message: String, field_errors: FieldErrors },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn validation(field_errors: FieldErrors) -> Self {
        Self::Validation { message: "Validation failed".to_string(), field_errors }
    }

    pub fn not_found<T: Entity>() -> Self {
        Self::NotFound(format!("{} not found", T::NAME))
    }
}
