//! Error types for odx-sources

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Server responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The request was sent but no (complete) response came back.
    #[error("No response received from {url}: {message}")]
    NoResponse { url: String, message: String },

    /// The request could not be built (bad URL, client setup).
    #[error("Request could not be constructed: {0}")]
    Request(String),

    /// The body is not an OData `{ d: { results } }` envelope.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub(crate) fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::Request(err.to_string())
        } else {
            FetchError::NoResponse {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
