use crate::format::{Formattable, OutputFormat};
use chrono::{DateTime, Utc};
use libsweep::format::format_age;
use libsweep::retention::{parse_grace, parse_pattern};
use libsweep::{
    Config, Credentials, DeleteReport, ImageRef, Plan, Region, RetentionPolicy, Sweeper, TagStatus,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tabled::{Table, Tabled, settings::Style};

pub mod handlers;

/// Options of a sweep run, as given on the command line
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub secret_key: String,
    pub region: Option<String>,
    pub base_url: Option<String>,
    pub namespaces: Vec<String>,
    pub keep: Option<usize>,
    pub grace: Option<String>,
    pub pattern: Option<String>,
    /// Empty means the configured default
    pub exclude_statuses: Vec<String>,
    pub dry_run: bool,
    pub debug: bool,
    pub format: OutputFormat,
}

/// Build the retention policy from the options, falling back to the
/// configuration for excluded statuses.
///
/// Runs before any request is made, so a malformed grace, pattern or status
/// stops the run early.
pub fn build_policy(options: &CleanOptions, config: &Config) -> libsweep::Result<RetentionPolicy> {
    let mut policy = RetentionPolicy::new();

    if let Some(grace) = &options.grace {
        policy = policy.with_grace(parse_grace(grace)?);
    }
    if let Some(keep) = options.keep {
        policy = policy.with_keep(keep);
    }
    if let Some(pattern) = &options.pattern {
        policy = policy.with_pattern(parse_pattern(pattern)?);
    }

    let statuses = if options.exclude_statuses.is_empty() {
        config.retention.exclude_statuses.clone()
    } else {
        options
            .exclude_statuses
            .iter()
            .map(|s| TagStatus::from_str(s))
            .collect::<libsweep::Result<Vec<_>>>()?
    };

    Ok(policy.excluding(statuses))
}

/// Build the sweeper. Region and base URL from the options take precedence
/// over the configuration.
pub fn build_sweeper(options: &CleanOptions, config: &Config) -> libsweep::Result<Sweeper> {
    let mut builder = Sweeper::builder()
        .with_config(config.clone())
        .with_credentials(Credentials::Token(options.secret_key.clone()))
        .with_echo_bodies(options.debug);

    if let Some(region) = &options.region {
        builder = builder.with_region(Region::from_str(region)?);
    }
    if let Some(url) = &options.base_url {
        builder = builder.with_base_url(url.clone());
    }

    builder.build()
}

/// One row of the deleted tags table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct TagRow {
    #[tabled(rename = "AGE")]
    pub age: String,

    #[tabled(rename = "IMAGE REF")]
    pub image_ref: String,
}

impl TagRow {
    pub fn new(tag: &ImageRef, now: DateTime<Utc>) -> Self {
        let (days, hours) = tag.age_at(now);
        Self {
            age: format_age(days, hours),
            image_ref: tag.reference(),
        }
    }
}

/// A delete that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDelete {
    pub tag_id: String,
    pub image_ref: Option<String>,
    pub error: String,
}

/// Result of sweeping one namespace
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceReport {
    pub namespace: String,
    pub dry_run: bool,
    /// Set when the namespace could not be fetched; nothing was deleted then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub images: BTreeMap<String, Vec<ImageRef>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedDelete>,
    #[serde(skip)]
    pub rendered_at: DateTime<Utc>,
}

impl NamespaceReport {
    /// Report for a namespace whose tags could not be fetched
    pub fn fetch_failed(namespace: &str, dry_run: bool, error: &libsweep::SweepError) -> Self {
        Self {
            namespace: namespace.to_string(),
            dry_run,
            error: Some(error.to_string()),
            images: BTreeMap::new(),
            deleted: Vec::new(),
            failed: Vec::new(),
            rendered_at: Utc::now(),
        }
    }

    /// Report for a planned namespace, executed or not
    pub fn from_plan(plan: Plan, report: Option<DeleteReport>, now: DateTime<Utc>) -> Self {
        let dry_run = report.is_none();
        let report = report.unwrap_or_default();

        let failed = report
            .failed
            .into_iter()
            .map(|(tag_id, error)| FailedDelete {
                image_ref: plan
                    .tags()
                    .find(|tag| tag.tag_id == tag_id)
                    .map(ImageRef::reference),
                tag_id,
                error: error.to_string(),
            })
            .collect();

        Self {
            namespace: plan.namespace,
            dry_run,
            error: None,
            images: plan.images,
            deleted: report.deleted,
            failed,
            rendered_at: now,
        }
    }

    /// Title of the pretty output
    pub fn title(&self) -> String {
        let title = if self.dry_run {
            "Tags that would be deleted"
        } else {
            "Deleted tags"
        };
        format!("{} in {}:", title, self.namespace)
    }

    /// Returns true when nothing went wrong in this namespace
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed.is_empty()
    }

    /// Rows of one image, excluding tags whose delete failed
    fn rows(&self, tags: &[ImageRef]) -> Vec<TagRow> {
        tags.iter()
            .filter(|tag| !self.failed.iter().any(|f| f.tag_id == tag.tag_id))
            .map(|tag| TagRow::new(tag, self.rendered_at))
            .collect()
    }
}

impl Formattable for NamespaceReport {
    fn format_pretty(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Failed to fetch tags: {}", error);
        }

        let sections: Vec<String> = self
            .images
            .iter()
            .filter_map(|(image, tags)| {
                let rows = self.rows(tags);
                if rows.is_empty() {
                    return None;
                }
                let table = Table::new(&rows).with(Style::empty()).to_string();
                Some(format!("{} image\n{}", image, table))
            })
            .collect();

        if sections.is_empty() {
            "No tags to delete.".to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

/// Everything a run produced, for JSON and YAML output
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutput {
    pub dry_run: bool,
    /// Grace duration of the run, in `<N>hr<N>m<N>s` form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace: Option<String>,
    pub namespaces: Vec<NamespaceReport>,
}

impl Formattable for SweepOutput {
    /// Namespaces that failed to fetch are left out; they are reported on stderr.
    fn format_pretty(&self) -> String {
        self.namespaces
            .iter()
            .filter(|report| report.error.is_none())
            .map(|report| format!("{}\n\n{}", report.title(), report.format_pretty()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
