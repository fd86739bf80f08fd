//! HTTP client for the registry API.
//!
//! This module provides a thin typed client for the container registry REST
//! API: namespaces, images, tags and tag deletion. All requests go through the
//! [`RetryTransport`] and carry the configured authentication header.

use crate::config::Config;
use crate::error::{Result, SweepError};
use crate::models::{Image, Namespace, Tag};
use crate::transport::{RetryPolicy, RetryTransport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Number of items requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Maximum number of pages fetched for one listing.
pub const MAX_PAGES: u32 = 20;

/// Registry regions with a fixed API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    FrPar,
    NlAms,
    PlWaw,
}

impl Region {
    /// All known regions.
    pub const ALL: [Region; 3] = [Region::FrPar, Region::NlAms, Region::PlWaw];

    /// Returns the region identifier, e.g. `fr-par`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::FrPar => "fr-par",
            Region::NlAms => "nl-ams",
            Region::PlWaw => "pl-waw",
        }
    }

    /// Returns the registry API base URL of the region.
    pub fn base_url(&self) -> String {
        format!(
            "https://api.scaleway.com/registry/v1/regions/{}",
            self.as_str()
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == s.trim())
            .ok_or_else(|| {
                SweepError::config(
                    format!(
                        "'{}' is not a valid region (expected one of fr-par, nl-ams, pl-waw)",
                        s
                    ),
                    None,
                )
            })
    }
}

/// Authentication sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Secret key, sent as `X-Auth-Token`.
    Token(String),
    /// Session JWT, sent as `X-Session-Token`.
    SessionJwt(String),
}

impl Credentials {
    fn header_name(&self) -> HeaderName {
        match self {
            Credentials::Token(_) => HeaderName::from_static("x-auth-token"),
            Credentials::SessionJwt(_) => HeaderName::from_static("x-session-token"),
        }
    }

    fn secret(&self) -> &str {
        match self {
            Credentials::Token(secret) | Credentials::SessionJwt(secret) => secret,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::SessionJwt(_) => f.write_str("SessionJwt(***)"),
        }
    }
}

/// Configuration for the registry client.
///
/// # Examples
///
/// ```
/// use libsweep::client::{ClientConfig, Credentials, Region};
///
/// let config = ClientConfig::new()
///     .with_region(Region::NlAms)
///     .with_credentials(Credentials::Token("secret".into()));
/// assert_eq!(config.region, Some(Region::NlAms));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub region: Option<Region>,
    pub base_url: Option<String>,
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
    pub echo_bodies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            base_url: None,
            credentials: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            user_agent: format!("sweep/{}", env!("CARGO_PKG_VERSION")),
            echo_bodies: false,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a client configuration from the library [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let region = config
            .registry
            .region
            .as_deref()
            .map(Region::from_str)
            .transpose()?;

        Ok(Self {
            region,
            base_url: config.registry.base_url.clone(),
            connect_timeout: Duration::from_secs(config.network.connect_timeout),
            read_timeout: Duration::from_secs(config.network.read_timeout),
            retry: RetryPolicy::new(config.retry.max_retries, config.retry.max_delay),
            ..Self::default()
        })
    }

    /// Selects a region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Uses an explicit API base URL instead of a region.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the credentials attached to every request.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets connect and read timeouts.
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Sets the maintenance retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Logs decoded response bodies.
    pub fn with_echo_bodies(mut self, echo: bool) -> Self {
        self.echo_bodies = echo;
        self
    }

    /// Resolves the API base URL.
    fn resolve_base_url(&self) -> Result<String> {
        match (&self.region, &self.base_url) {
            (Some(_), Some(_)) => Err(SweepError::config(
                "Specify either a region or a base URL, not both",
                None,
            )),
            (_, Some(url)) => normalize_url(url),
            (region, None) => Ok(region.unwrap_or_default().base_url()),
        }
    }
}

/// Validates a base URL and strips trailing slashes.
fn normalize_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SweepError::config("Base URL cannot be empty", None));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        SweepError::config_with_source(format!("Invalid base URL '{}'", url), None, e)
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SweepError::config(
            format!("Base URL '{}' must use http or https", url),
            None,
        ));
    }

    Ok(url.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
struct NamespacesPage {
    namespaces: Vec<Namespace>,
}

#[derive(Debug, Deserialize)]
struct ImagesPage {
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct TagsPage {
    tags: Vec<Tag>,
}

/// Typed client for the registry API.
///
/// One instance owns exactly one connection pool, shared by every
/// concurrent call made through it. Call [`RegistryClient::close`] when done.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    transport: RetryTransport,
    base_url: String,
    read_timeout: Duration,
}

impl RegistryClient {
    /// Creates a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Config`] when both a region and a base URL are
    /// given, when the base URL is invalid, or when the credentials cannot be
    /// sent as a header.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::client::{ClientConfig, RegistryClient};
    ///
    /// let client = RegistryClient::new(ClientConfig::new()).unwrap();
    /// assert!(client.base_url().ends_with("/regions/fr-par"));
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.resolve_base_url()?;

        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| SweepError::config_with_source("Invalid user agent", None, e))?;
        headers.insert(USER_AGENT, user_agent);

        if let Some(credentials) = &config.credentials {
            let mut value = HeaderValue::from_str(credentials.secret()).map_err(|e| {
                SweepError::config_with_source(
                    "Credentials contain characters not allowed in a header",
                    None,
                    e,
                )
            })?;
            value.set_sensitive(true);
            headers.insert(credentials.header_name(), value);
        }

        let http_client = ReqwestClient::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| SweepError::network_with_source("Failed to create HTTP client", e))?;

        let transport =
            RetryTransport::new(http_client, config.retry).with_echo_bodies(config.echo_bodies);

        debug!(base_url = %base_url, "registry client ready");

        Ok(Self {
            transport,
            base_url,
            read_timeout: config.read_timeout,
        })
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Number of deletes that can run at once and still finish within the
    /// read timeout: half the timeout in seconds, at least one.
    pub fn delete_batch_size(&self) -> usize {
        ((self.read_timeout.as_secs() / 2) as usize).max(1)
    }

    /// Lists namespaces whose name matches `name`.
    pub async fn list_namespaces(&self, name: &str) -> Result<Vec<Namespace>> {
        let url = format!("{}/namespaces", self.base_url);
        let builder = self
            .transport
            .http_client()
            .get(&url)
            .query(&[("name", name)]);

        let page: NamespacesPage = self.transport.send(builder).await?.json()?;
        Ok(page.namespaces)
    }

    /// Resolves a namespace by its exact name.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::NotFound`] when no namespace carries that name.
    pub async fn namespace(&self, name: &str) -> Result<Namespace> {
        self.list_namespaces(name)
            .await?
            .into_iter()
            .find(|namespace| namespace.name == name)
            .ok_or_else(|| SweepError::not_found("namespace", name))
    }

    /// Lists the images of a namespace, optionally filtered by name.
    pub async fn list_images(&self, namespace_id: &str, name: Option<&str>) -> Result<Vec<Image>> {
        let url = format!("{}/images", self.base_url);
        let mut query = vec![("namespace_id", namespace_id.to_string())];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }

        self.fetch_pages(&url, &query, |page: ImagesPage| page.images)
            .await
    }

    /// Lists every tag of an image.
    ///
    /// Pages of [`PAGE_SIZE`] are requested until one comes back empty or
    /// [`MAX_PAGES`] pages have been read. Tags beyond the page cap are not
    /// returned.
    pub async fn list_tags(&self, image_id: &str) -> Result<Vec<Tag>> {
        let url = format!("{}/images/{}/tags", self.base_url, image_id);
        self.fetch_pages(&url, &[], |page: TagsPage| page.tags)
            .await
    }

    /// Deletes a tag and returns its final state.
    pub async fn delete_tag(&self, tag_id: &str) -> Result<Tag> {
        let url = format!("{}/tags/{}", self.base_url, tag_id);
        let builder = self.transport.http_client().delete(&url);

        let tag: Tag = self.transport.send(builder).await?.json()?;
        info!(tag_id = %tag_id, tag = %tag.name, "Deleted tag");
        Ok(tag)
    }

    /// Releases the connection pool.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing registry client");
    }

    async fn fetch_pages<P, T, F>(
        &self,
        url: &str,
        query: &[(&str, String)],
        into_items: F,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let builder = self
                .transport
                .http_client()
                .get(url)
                .query(query)
                .query(&[("page_size", PAGE_SIZE), ("page", page)]);

            let batch = into_items(self.transport.send(builder).await?.json()?);
            if batch.is_empty() {
                return Ok(items);
            }
            items.extend(batch);
        }

        warn!(
            url = %url,
            max_pages = MAX_PAGES,
            collected = items.len(),
            "page limit reached, listing truncated"
        );
        Ok(items)
    }
}
