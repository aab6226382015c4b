//! REST client errors

use thiserror::Error;

/// REST layer errors
#[derive(Debug, Error)]
pub enum RestError {
    /// Transport failure or undecodable body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("REST request failed: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        /// API-specific error code from the JSON body, when present
        code: Option<u32>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RestError {
    /// True for 401/403, which retrying with the same token cannot fix
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// REST result type
pub type RestResult<T> = Result<T, RestError>;
