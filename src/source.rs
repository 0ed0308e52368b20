// Data sources feeding the paths phase.
// Anything that can asynchronously produce the full record list.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Produces the full list of records to pre-render.
#[async_trait]
pub trait DataSource<D: Send>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<D>>;
}

#[async_trait]
impl<D, F, Fut> DataSource<D> for F
where
    D: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<D>>> + Send + 'static,
{
    async fn fetch(&self) -> Result<Vec<D>> {
        (self)().await
    }
}

/// Fetches records from a URL that serves a JSON array.
pub struct HttpSource<D> {
    client: Client,
    url: String,
    _records: PhantomData<fn() -> D>,
}

impl<D> HttpSource<D> {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("static-data-paths/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Fetch)?;
        Ok(Self::with_client(client, url))
    }

    /// Reuse an existing client (shared pool, custom headers, auth).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            _records: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<D> DataSource<D> for HttpSource<D>
where
    D: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<Vec<D>> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(Error::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        tracing::debug!(url = %self.url, %status, "fetched records");
        Ok(response.json::<Vec<D>>().await?)
    }
}
