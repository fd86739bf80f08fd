//! High-level API for sweeping a registry.
//!
//! [`Sweeper`] ties the registry client, the concurrent fetch, the retention
//! engine and the bulk delete together. A sweep is two steps: build a [`Plan`]
//! for a namespace, then [`execute`](Sweeper::execute) it. A dry run simply
//! stops after the first step.
//!
//! # Examples
//!
//! ```no_run
//! use libsweep::{Credentials, RetentionPolicy, Sweeper};
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sweeper = Sweeper::builder()
//!         .with_credentials(Credentials::Token("secret".to_string()))
//!         .build()?;
//!
//!     let policy = RetentionPolicy::new()
//!         .with_grace(Duration::days(30))
//!         .with_keep(5);
//!
//!     let plan = sweeper.plan("my-team", &policy).await?;
//!     println!("{} tags to delete", plan.len());
//!
//!     let report = sweeper.execute(&plan).await;
//!     println!("{} deleted, {} failed", report.deleted.len(), report.failed.len());
//!
//!     sweeper.close();
//!     Ok(())
//! }
//! ```

use crate::client::{ClientConfig, Credentials, Region, RegistryClient};
use crate::config::Config;
use crate::delete::{DeleteReport, bulk_delete};
use crate::error::{Result, SweepError};
use crate::fetch::namespace_tags;
use crate::models::ImageRef;
use crate::retention::{RetentionPolicy, apply_policy};
use crate::transport::RetryPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Tags selected for deletion in one namespace, grouped by image name.
///
/// Every image of the namespace appears, with an empty list when the policy
/// keeps all of its tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub namespace: String,
    pub images: BTreeMap<String, Vec<ImageRef>>,
}

impl Plan {
    /// Ids of every selected tag, image by image.
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags().map(|tag| tag.tag_id.clone()).collect()
    }

    /// Iterates over every selected tag, image by image.
    pub fn tags(&self) -> impl Iterator<Item = &ImageRef> {
        self.images.values().flatten()
    }

    /// Number of selected tags.
    pub fn len(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entry point for planning and running sweeps.
///
/// A `Sweeper` owns a single [`RegistryClient`]; every request of every
/// namespace goes through it.
#[derive(Debug)]
pub struct Sweeper {
    client: RegistryClient,
}

impl Sweeper {
    /// Creates a builder.
    pub fn builder() -> SweeperBuilder {
        SweeperBuilder::new()
    }

    /// Wraps an existing client.
    pub fn from_client(client: RegistryClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Fetches the tags of `namespace` and applies `policy` at the current
    /// time.
    ///
    /// # Errors
    ///
    /// Any failure while fetching fails the whole plan; no partial plan is
    /// returned.
    pub async fn plan(&self, namespace: &str, policy: &RetentionPolicy) -> Result<Plan> {
        self.plan_at(namespace, policy, Utc::now()).await
    }

    /// Same as [`plan`](Self::plan) with an explicit current time.
    pub async fn plan_at(
        &self,
        namespace: &str,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) -> Result<Plan> {
        let groups = namespace_tags(&self.client, namespace).await?;
        let images = apply_policy(&groups, policy, now);

        let plan = Plan {
            namespace: namespace.to_string(),
            images,
        };
        info!(
            namespace = %namespace,
            images = plan.images.len(),
            selected = plan.len(),
            "Planned sweep"
        );
        Ok(plan)
    }

    /// Deletes every tag of the plan.
    ///
    /// Deletes run in batches sized from the client's read timeout. Failures
    /// are collected in the report.
    pub async fn execute(&self, plan: &Plan) -> DeleteReport {
        let report = bulk_delete(
            &self.client,
            &plan.tag_ids(),
            self.client.delete_batch_size(),
        )
        .await;
        info!(
            namespace = %plan.namespace,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Executed sweep"
        );
        report
    }

    /// Releases the underlying client.
    pub fn close(self) {
        self.client.close();
    }
}

/// Builder for a [`Sweeper`].
///
/// Settings given directly on the builder take precedence over the ones
/// loaded from a [`Config`]. Setting a region drops a base URL coming from
/// the config and the other way around; setting both on the builder is an
/// error.
///
/// # Examples
///
/// ```
/// use libsweep::{Region, Sweeper};
///
/// let sweeper = Sweeper::builder().with_region(Region::NlAms).build().unwrap();
/// assert!(sweeper.client().base_url().ends_with("/regions/nl-ams"));
/// ```
#[derive(Debug, Default)]
pub struct SweeperBuilder {
    config: Option<Config>,
    credentials: Option<Credentials>,
    region: Option<Region>,
    base_url: Option<String>,
    retry: Option<RetryPolicy>,
    echo_bodies: bool,
}

impl SweeperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses settings from a loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the credentials sent with every request.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Targets a region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Targets an explicit API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Logs every response body.
    pub fn with_echo_bodies(mut self, echo: bool) -> Self {
        self.echo_bodies = echo;
        self
    }

    /// Builds the sweeper.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Config`] when the configuration is invalid or
    /// when both a region and a base URL were given to the builder.
    pub fn build(self) -> Result<Sweeper> {
        if self.region.is_some() && self.base_url.is_some() {
            return Err(SweepError::config(
                "Cannot set both a region and a base URL",
                None,
            ));
        }

        let mut client_config = match &self.config {
            Some(config) => ClientConfig::from_config(config)?,
            None => ClientConfig::new(),
        };

        if let Some(region) = self.region {
            client_config.base_url = None;
            client_config = client_config.with_region(region);
        }
        if let Some(url) = self.base_url {
            client_config.region = None;
            client_config = client_config.with_base_url(url);
        }
        if let Some(credentials) = self.credentials {
            client_config = client_config.with_credentials(credentials);
        }
        if let Some(retry) = self.retry {
            client_config = client_config.with_retry(retry);
        }
        client_config = client_config.with_echo_bodies(self.echo_bodies);

        let client = RegistryClient::new(client_config)?;
        Ok(Sweeper { client })
    }
}
