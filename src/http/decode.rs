use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Error, Result};

/// Decodes a successful response body as JSON.
///
/// Any non-2xx response becomes [`Error::Rejected`] carrying the body text, which
/// is also logged since upstream error bodies usually explain the rejection.
pub async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(Error::Decode);
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() || status.is_server_error() {
        warn!(status = status.as_u16(), error = %body, "http request failed with error");
    }

    Err(Error::Rejected { status, body })
}
