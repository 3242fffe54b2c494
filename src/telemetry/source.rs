use std::{future::Future, time::Duration};

use anyhow::{bail, Context, Result};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA},
    Client, Url,
};

use super::{FetchError, Snapshot};

/// Capability to fetch the board's current snapshot on demand.
///
/// The poller bounds every call with its own timeout, so implementations do
/// not need to enforce one, though the HTTP source does.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send;
}

/// Fetches snapshots with an uncached HTTP GET against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(endpoint).with_context(|| format!("invalid endpoint {endpoint}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("endpoint {endpoint} must use http or https");
        }

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send {
        let request = self.client.get(self.url.clone());
        let timeout = self.timeout;
        let map_err = move |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Transport(err.to_string())
            }
        };

        async move {
            let response = request.send().await.map_err(map_err)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.bytes().await.map_err(map_err)?;
            debug!("received {} byte snapshot payload", body.len());

            Ok(serde_json::from_slice::<Snapshot>(&body)?)
        }
    }
}
