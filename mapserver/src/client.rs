use std::time::Duration;

use reqwest::redirect::Policy;

use crate::{decode, Bitmap, Error, Extent, Result};

/// Source of map images and extents.
pub trait MapSource: Send + Sync {
    /// Fetch the raw body of `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    fn fetch_map(&self, url: &str) -> Result<Bitmap> {
        decode(&self.fetch(url)?)
    }

    /// Query the extent of a map from a companion endpoint answering with a
    /// plain-text `minx miny maxx maxy` body.
    fn fetch_extent(&self, url: &str) -> Result<Extent> {
        let body = self.fetch(url)?;
        std::str::from_utf8(&body)?.trim().parse()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: concat!("mapview/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Blocking HTTP client for map services.
///
/// Redirects are not followed; every non-success status is an error.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new() -> Result<Client> {
        Self::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Result<Client> {
        let mut builder = reqwest::blocking::Client::builder()
            .redirect(Policy::none())
            .user_agent(config.user_agent.as_str());

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Client {
            http: builder.build()?,
        })
    }
}

impl MapSource for Client {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "requesting");

        let response = self.http.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body = response.bytes()?;
        tracing::debug!(url, len = body.len(), "received response");

        Ok(body.to_vec())
    }
}
