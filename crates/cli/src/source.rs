//! Obtaining the schema document text from a URL or a file.

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Whether `source` is an http(s) URL.
pub fn is_url(source: &str) -> bool {
    Url::parse(source).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Accept a URL or a path to an existing file.
pub fn validate_source(source: &str) -> Result<(), String> {
    if is_url(source) || Path::new(source).is_file() {
        Ok(())
    } else {
        Err(format!("'{source}' is neither a URL nor an existing file"))
    }
}

fn build_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .build()
        .map_err(|err| format!("Failed to build HTTP client: {err}"))
}

/// Download a document, sending `cookie` as the `Cookie` header when set.
pub async fn fetch(url: &str, cookie: Option<&str>) -> Result<String, String> {
    let client = build_client()?;
    let mut request = client
        .get(url)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS));
    if let Some(cookie) = cookie.filter(|cookie| !cookie.is_empty()) {
        request = request.header(COOKIE, cookie);
    }

    debug!(%url, "Fetching schema document.");
    let response = request.send().await.map_err(|err| {
        debug!(error = %err, %url, "Schema request failed.");
        format!("Failed to fetch {url}: {err}")
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(format!("Failed to fetch {url}: server answered {status}"));
    }
    response
        .text()
        .await
        .map_err(|err| format!("Failed to read response from {url}: {err}"))
}

/// Read `source` from the network or the filesystem.
pub async fn load_source(source: &str, cookie: Option<&str>) -> Result<String, String> {
    if is_url(source) {
        return fetch(source, cookie).await;
    }
    debug!(path = %source, "Reading schema document.");
    std::fs::read_to_string(source).map_err(|err| format!("Failed to read {source}: {err}"))
}
