//! Matching sprites and image resources between the two formats.
//!
//! Both formats identify an image by its file path. Intralism only ever sees the base name of the
//! file, because resources are copied flat next to `config.txt`, so every name crossing the boundary
//! goes through [`file_name`].

use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::{intralism::LevelResource, mania::storyboard::StoryboardSprite};

/// A sprite names a resource that the beatmap does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("no level resource is named `{name}`")]
pub struct ResourceLookupError {
    /// The name searched for.
    pub name: String,
}

/// Base name of a chart relative path, accepting both `/` and `\` separators.
///
/// Charts written on Windows commonly use `SB\bg.png`, which [`std::path::Path`] would not split on
/// other platforms.
#[must_use]
pub fn file_name(path: &str) -> &str {
    let path = path.trim().trim_matches('"');
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// A chart relative path made portable: quotes dropped and `\` separators turned into `/`.
#[must_use]
pub fn local_path(path: &str) -> PathBuf {
    PathBuf::from(path.trim().trim_matches('"').replace('\\', "/"))
}

/// Keeps the first sprite of every distinct path, in input order.
pub fn first_per_path<'a>(
    sprites: impl IntoIterator<Item = &'a StoryboardSprite>,
) -> impl Iterator<Item = &'a StoryboardSprite> {
    sprites.into_iter().unique_by(|sprite| sprite.path.clone())
}

/// Builds one `Sprite` resource per distinct non-empty base name, in first-seen order.
pub fn sprite_resources<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<LevelResource> {
    paths
        .into_iter()
        .map(file_name)
        .filter(|name| !name.is_empty())
        .unique()
        .map(LevelResource::sprite)
        .collect()
}

/// Finds the first resource declared with exactly `name`.
///
/// # Errors
///
/// Returns [`ResourceLookupError`] when no resource has that name.
pub fn find_resource<'a>(
    resources: &'a [LevelResource],
    name: &str,
) -> Result<&'a LevelResource, ResourceLookupError> {
    resources
        .iter()
        .find(|resource| resource.name == name)
        .ok_or_else(|| ResourceLookupError {
            name: name.to_string(),
        })
}
