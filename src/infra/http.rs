//! Shared HTTP plumbing for the remote collaborators.

use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::HttpSettings;

use super::error::InfraError;

fn user_agent() -> &'static str {
    concat!("planner/", env!("CARGO_PKG_VERSION"))
}

pub fn build_client(settings: &HttpSettings) -> Result<Client, InfraError> {
    let client = Client::builder()
        .user_agent(user_agent())
        .timeout(settings.timeout)
        .build()?;
    Ok(client)
}

/// GET `url` and return the body, failing on any non-success status.
pub async fn get_bytes(client: &Client, url: Url) -> Result<Bytes, InfraError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(InfraError::Status {
            status: status.as_u16(),
            url: redact(&url),
        });
    }
    let body = response.bytes().await?;
    debug!(
        target = "planner::http",
        op = "http::get",
        url = %redact(&url),
        bytes = body.len(),
        "Fetched remote document"
    );
    Ok(body)
}

pub async fn get_text(client: &Client, url: Url) -> Result<String, InfraError> {
    let body = get_bytes(client, url).await?;
    String::from_utf8(body.to_vec())
        .map_err(|err| InfraError::decode("response body", err.to_string()))
}

/// Strip query strings before a URL reaches logs or errors; the dictionary key travels there.
pub(crate) fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

/// Make sure `base` ends with a slash so relative joins append instead of replacing.
pub(crate) fn with_trailing_slash(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
