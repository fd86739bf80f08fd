//! Registry data model.
//!
//! Wire types returned by the registry API ([`Namespace`], [`Image`], [`Tag`])
//! and [`ImageRef`], the flattened tag view the retention engine works on.

use crate::error::{Result, SweepError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


/// Tag status as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Ready,
    Deleting,
    Error,
    Locked,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TagStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Unknown => "unknown",
            TagStatus::Ready => "ready",
            TagStatus::Deleting => "deleting",
            TagStatus::Error => "error",
            TagStatus::Locked => "locked",
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagStatus {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(TagStatus::Unknown),
            "ready" => Ok(TagStatus::Ready),
            "deleting" => Ok(TagStatus::Deleting),
            "error" => Ok(TagStatus::Error),
            "locked" => Ok(TagStatus::Locked),
            _ => Err(SweepError::policy(
                "tag status",
                s,
                "expected one of unknown, ready, deleting, error, locked",
            )),
        }
    }
}

/// A registry namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// An image (repository) inside a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub namespace_id: Option<String>,
}

/// A tag of an image, as returned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub status: TagStatus,
    #[serde(default)]
    pub digest: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One tag bound to its image and namespace.
///
/// `tag_id` is unique within a region; `(namespace, image_name, tag_name)`
/// is unique at any instant but a name can be reused after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub tag_id: String,
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub status: TagStatus,
    pub image_name: String,
    pub namespace: String,
}

impl ImageRef {
    /// Builds an `ImageRef` from a raw tag of `image` in `namespace`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::models::{Image, ImageRef, Tag, TagStatus};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let image = Image { id: "img-1".into(), name: "api".into(), namespace_id: None };
    /// let tag = Tag {
    ///     id: "tag-1".into(),
    ///     name: "v1".into(),
    ///     image_id: None,
    ///     status: TagStatus::Ready,
    ///     digest: None,
    ///     created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ///     updated_at: None,
    /// };
    ///
    /// let image_ref = ImageRef::from_tag("team", &image, tag);
    /// assert_eq!(image_ref.reference(), "team/api:v1");
    /// ```
    pub fn from_tag(namespace: &str, image: &Image, tag: Tag) -> Self {
        Self {
            tag_id: tag.id,
            tag_name: tag.name,
            created_at: tag.created_at,
            status: tag.status,
            image_name: image.name.clone(),
            namespace: namespace.to_string(),
        }
    }

    /// Returns the fully qualified reference `namespace/image:tag`.
    pub fn reference(&self) -> String {
        format!("{}/{}:{}", self.namespace, self.image_name, self.tag_name)
    }

    /// Returns the tag age as `(days, hours)` relative to now.
    pub fn age(&self) -> (i64, i64) {
        self.age_at(Utc::now())
    }

    /// Returns the tag age as `(days, hours)` relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> (i64, i64) {
        let delta = now - self.created_at;
        let days = delta.num_days();
        let hours = (delta - chrono::Duration::days(days)).num_hours();
        (days, hours)
    }
}
