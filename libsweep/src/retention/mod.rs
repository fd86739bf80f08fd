//! Retention decisions.
//!
//! Given the tags of one image and a [`RetentionPolicy`], decide which tags
//! are deleted. The decision is pure: no I/O, and the current time is passed
//! in by the caller.
//!
//! A tag is *eligible* when it matches the name pattern (if any) and its
//! status is not excluded. Ineligible tags are invisible to the algorithm:
//! they are never deleted and never count toward the keep floor.
//!
//! Eligible tags are walked oldest first. A tag older than the grace period
//! is deleted as long as more than `keep` eligible tags would still be left
//! standing, so the newest `keep` eligible tags always survive.

use crate::error::{Result, SweepError};
use crate::models::{ImageRef, TagStatus};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;


static GRACE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<hours>\d+)hr)?(?:(?P<minutes>\d+)m)?(?:(?P<seconds>\d+)s)?$")
        .expect("grace duration format is a valid regex")
});

/// Per-run retention settings. Every field is optional and independent.
#[derive(Debug, Clone, Default)]
pub struct RetentionPolicy {
    /// Minimum age before a tag can be deleted. `None` disables deletion.
    pub grace: Option<Duration>,
    /// Minimum number of eligible tags kept per image.
    pub keep: Option<usize>,
    /// Tags whose name does not match from its first character are ignored.
    pub pattern: Option<Regex>,
    /// Tags in one of these statuses are ignored.
    pub exclude_statuses: HashSet<TagStatus>,
}

impl RetentionPolicy {
    /// Creates an empty policy, which never deletes anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = Some(grace);
        self
    }

    /// Sets the keep floor.
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = Some(keep);
        self
    }

    /// Sets the tag name pattern.
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Adds statuses to ignore.
    pub fn excluding<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = TagStatus>,
    {
        self.exclude_statuses.extend(statuses);
        self
    }

    /// Returns true when the tag name matches the pattern, anchored at the
    /// start of the name. Always true without a pattern.
    pub fn matches_name(&self, tag_name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.find(tag_name).is_some_and(|m| m.start() == 0),
            None => true,
        }
    }

    /// Returns true when the tag takes part in retention decisions.
    pub fn is_eligible(&self, tag: &ImageRef) -> bool {
        self.matches_name(&tag.tag_name) && !self.exclude_statuses.contains(&tag.status)
    }

    /// Returns true when the tag has reached the grace period at `now`.
    pub fn is_expired(&self, tag: &ImageRef, now: DateTime<Utc>) -> bool {
        self.grace.is_some_and(|grace| now - tag.created_at >= grace)
    }
}

/// Selects the tags of one image that the policy deletes.
///
/// Tags are ordered by creation time with a stable sort, so tags sharing a
/// timestamp keep their input order. The result is ordered oldest first.
///
/// # Examples
///
/// ```
/// use libsweep::models::{ImageRef, TagStatus};
/// use libsweep::retention::{RetentionPolicy, select_tags_for_deletion};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let tag = |name: &str, month: u32| ImageRef {
///     tag_id: name.to_string(),
///     tag_name: name.to_string(),
///     created_at: Utc.with_ymd_and_hms(2020, month, 1, 0, 0, 0).unwrap(),
///     status: TagStatus::Ready,
///     image_name: "api".to_string(),
///     namespace: "team".to_string(),
/// };
/// let tags = vec![tag("t1", 1), tag("t2", 2), tag("t3", 3)];
/// let policy = RetentionPolicy::new().with_grace(Duration::zero()).with_keep(1);
///
/// let deleted = select_tags_for_deletion(&tags, &policy, Utc::now());
/// let names: Vec<_> = deleted.iter().map(|t| t.tag_name.as_str()).collect();
/// assert_eq!(names, vec!["t1", "t2"]);
/// ```
pub fn select_tags_for_deletion(
    tags: &[ImageRef],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<ImageRef> {
    if policy.grace.is_none() {
        return Vec::new();
    }

    let mut eligible: Vec<&ImageRef> = tags.iter().filter(|tag| policy.is_eligible(tag)).collect();
    eligible.sort_by_key(|tag| tag.created_at);

    let floor = policy.keep.unwrap_or(0);
    let mut standing = eligible.len();
    let mut selected = Vec::new();

    for tag in eligible {
        if standing <= floor {
            break;
        }
        if policy.is_expired(tag, now) {
            selected.push(tag.clone());
            standing -= 1;
        }
    }

    selected
}

/// Applies the policy to every image of a namespace.
///
/// Every image of the input appears in the output, with an empty list when
/// nothing is deleted.
pub fn apply_policy(
    groups: &HashMap<String, Vec<ImageRef>>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> BTreeMap<String, Vec<ImageRef>> {
    groups
        .iter()
        .map(|(image, tags)| {
            (
                image.clone(),
                select_tags_for_deletion(tags, policy, now),
            )
        })
        .collect()
}

/// Parses a grace duration such as `48hr`, `3600s` or `24hr30m`.
///
/// Each of the hour, minute and second components is optional, but at least
/// one must be present and they must appear in that order.
///
/// # Examples
///
/// ```
/// use libsweep::retention::parse_grace;
/// use chrono::Duration;
///
/// assert_eq!(parse_grace("24hr30m").unwrap(), Duration::minutes(24 * 60 + 30));
/// assert!(parse_grace("3 days").is_err());
/// ```
pub fn parse_grace(input: &str) -> Result<Duration> {
    let invalid = |message: &str| SweepError::policy("grace duration", input, message);
    let format_hint = "expected <N>hr<N>m<N>s, e.g. 48hr, 3600s or 24hr30m";

    let captures = GRACE_FORMAT
        .captures(input.trim())
        .ok_or_else(|| invalid(format_hint))?;

    let mut total = Duration::zero();
    let mut any = false;
    for (group, seconds_per_unit) in [("hours", 3600i64), ("minutes", 60), ("seconds", 1)] {
        if let Some(value) = captures.name(group) {
            any = true;
            let amount: i64 = value
                .as_str()
                .parse()
                .map_err(|_| invalid("component out of range"))?;
            let seconds = amount
                .checked_mul(seconds_per_unit)
                .ok_or_else(|| invalid("component out of range"))?;
            let component =
                Duration::try_seconds(seconds).ok_or_else(|| invalid("component out of range"))?;
            total = total
                .checked_add(&component)
                .ok_or_else(|| invalid("duration out of range"))?;
        }
    }

    if !any {
        return Err(invalid(format_hint));
    }
    Ok(total)
}

/// Compiles a tag name pattern.
pub fn parse_pattern(input: &str) -> Result<Regex> {
    Regex::new(input).map_err(|e| SweepError::policy("pattern", input, e.to_string()))
}
