use thiserror::Error;

/// Errors returned by the projection and odds API clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: &'static str,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Turn a non-success response into a `Status` error, keeping the body for diagnostics
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::Status {
            service,
            status,
            body,
        }
    }
}

/// Read a JSON body, attributing decode failures to the named service
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { service, source })
}
