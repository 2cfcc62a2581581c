//! Error types shared by the backend REST client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ApiError`] failures.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures that can occur while talking to the competition backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build backend client")]
    ClientBuilder {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or no response was received.
    #[error("failed to send backend request to `{path}`")]
    RequestSend {
        /// Endpoint path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a status other than 200.
    #[error("unexpected backend response status {status} for `{path}`")]
    RequestStatus {
        /// Endpoint path.
        path: String,
        /// Status the backend returned.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode backend response for `{path}`")]
    DecodeResponse {
        /// Endpoint path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}
