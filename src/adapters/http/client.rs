use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::domain::{Error, Result};
use crate::ports::{CollectorClient, SnapshotFetcher};

fn transport_error(url: &str, detail: impl ToString) -> Error {
    Error::RemoteCollectionFailed {
        url: url.to_string(),
        detail: detail.to_string(),
    }
}

/// Collector-bound HTTP client used by the push scheduler and the
/// registration announcer.
pub struct HttpCollectorClient {
    client: Client,
}

impl HttpCollectorClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CollectorClient for HttpCollectorClient {
    async fn push_snapshot(
        &self,
        url: &str,
        identity: &str,
        filename: &str,
        payload: Vec<u8>,
    ) -> Result<()> {
        let part = Part::bytes(payload)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| transport_error(url, e))?;
        let form = Form::new()
            .text("application", identity.to_string())
            .part("data", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        response
            .error_for_status()
            .map_err(|e| transport_error(url, e))?;

        debug!(url, identity, "snapshot pushed");
        Ok(())
    }

    async fn announce(&self, url: &str, identity: &str, app_url: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .form(&[("appName", identity), ("appUrls", app_url)])
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        response
            .error_for_status()
            .map_err(|e| transport_error(url, e))?;

        debug!(url, identity, app_url, "instance announced");
        Ok(())
    }
}

/// Pull-side HTTP fetcher for monitored applications' own data endpoints.
pub struct HttpSnapshotFetcher {
    client: Client,
}

impl HttpSnapshotFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?
            .error_for_status()
            .map_err(|e| transport_error(url, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;
        Ok(bytes.to_vec())
    }
}
