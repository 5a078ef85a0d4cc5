//! JSON response envelope.

use serde::Serialize;

/// Envelope wrapping every non-validation response body.
///
/// `data` is `null` on failure. `count` only appears on list responses and
/// `error` only on failures.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Wraps a single resource.
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            count: None,
            error: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps a list and reports its length.
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            data: Some(items),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// An error envelope with no data.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            count: None,
            error: Some(ErrorBody {
                message: message.into(),
            }),
        }
    }
}
