//! Concurrent tag collection for a namespace.
//!
//! Tags of every image are fetched concurrently. Each per-image task owns its
//! result vector and the vectors are merged once all tasks have joined, so no
//! lock is shared between tasks. The first failing task fails the whole
//! collection and the remaining in-flight requests are dropped.

use crate::client::RegistryClient;
use crate::error::Result;
use crate::models::{Image, ImageRef};
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::debug;


/// Tags of a namespace, keyed by image name.
pub type NamespaceTags = HashMap<String, Vec<ImageRef>>;

/// Fetches every tag of every image of `namespace`.
///
/// Images without tags map to an empty list. Tags keep the order in which the
/// registry returned them.
///
/// # Errors
///
/// Fails when the namespace cannot be resolved, when images cannot be listed,
/// or when listing the tags of any single image fails. No partial mapping is
/// returned.
pub async fn namespace_tags(client: &RegistryClient, namespace: &str) -> Result<NamespaceTags> {
    let resolved = client.namespace(namespace).await?;
    let images = client.list_images(&resolved.id, None).await?;

    debug!(
        namespace = %namespace,
        namespace_id = %resolved.id,
        images = images.len(),
        "fetching tags"
    );

    let tasks = images
        .iter()
        .map(|image| image_tags(client, namespace, image));
    let groups = try_join_all(tasks).await?;

    let mut tags = NamespaceTags::with_capacity(groups.len());
    for (image_name, refs) in groups {
        tags.entry(image_name).or_default().extend(refs);
    }
    Ok(tags)
}

async fn image_tags(
    client: &RegistryClient,
    namespace: &str,
    image: &Image,
) -> Result<(String, Vec<ImageRef>)> {
    let tags = client.list_tags(&image.id).await?;
    let refs = tags
        .into_iter()
        .map(|tag| ImageRef::from_tag(namespace, image, tag))
        .collect();
    Ok((image.name.clone(), refs))
}
