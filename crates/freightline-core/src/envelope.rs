use serde::{Deserialize, Serialize};

use crate::rate_source::RateError;

/// Success envelope returned by every callable rating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Classified error payload: `code` is the wire status, `message` the human detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// Failure envelope, the counterpart of [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

impl From<&RateError> for ApiErrorResponse {
    fn from(error: &RateError) -> Self {
        Self {
            success: false,
            error: ApiErrorBody {
                code: error.code().to_owned(),
                message: error.message().to_owned(),
            },
        }
    }
}
