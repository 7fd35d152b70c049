//! Embeddable image references.
//!
//! The generation API accepts URLs and base64 data URIs, never device
//! paths or symbolic names. Two things bridge that gap: inlining local
//! files as data URIs, and resolving the catalog's symbolic reference
//! image ids through a registered library.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Turn an image reference into something the generation API accepts.
///
/// Data URIs and http(s) URLs pass through unchanged; local paths
/// (with or without a `file://` prefix) are read and encoded as a
/// base64 data URI.
pub async fn inline_image_ref(image_ref: &str) -> MediaResult<String> {
    if is_embeddable(image_ref) {
        return Ok(image_ref.to_string());
    }

    let path = Path::new(image_ref.strip_prefix("file://").unwrap_or(image_ref));
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for(path),
        STANDARD.encode(&bytes)
    ))
}

fn is_embeddable(image_ref: &str) -> bool {
    image_ref.starts_with("data:")
        || image_ref.starts_with("http://")
        || image_ref.starts_with("https://")
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Maps the catalog's symbolic reference image ids to image refs.
///
/// Scenes name stock companions ("FROG_DRAGON") by id; the library owns
/// where those images actually live. Ids with no registered entry, and
/// entries that fail to inline, are skipped with a warning rather than
/// failing the scene.
#[derive(Debug, Clone, Default)]
pub struct ReferenceImageLibrary {
    entries: HashMap<String, String>,
}

impl ReferenceImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, image_ref: impl Into<String>) {
        self.entries.insert(id.into(), image_ref.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load an id → image-ref map from a JSON manifest file.
    ///
    /// Relative file entries are anchored to the manifest's directory.
    pub async fn from_manifest(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await?;
        let entries: HashMap<String, String> = serde_json::from_slice(&raw)?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let entries = entries
            .into_iter()
            .map(|(id, image_ref)| (id, anchor_entry(&base, image_ref)))
            .collect();
        Ok(Self { entries })
    }

    /// Resolve scene reference ids to embeddable image refs, in order.
    pub async fn resolve(&self, ids: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match self.entries.get(id) {
                Some(image_ref) => match inline_image_ref(image_ref).await {
                    Ok(inlined) => resolved.push(inlined),
                    Err(e) => {
                        warn!(id = %id, "Failed to inline reference image, skipping: {}", e);
                    }
                },
                None => {
                    warn!(id = %id, "No reference image registered for id, skipping");
                }
            }
        }
        resolved
    }
}

fn anchor_entry(base: &Path, image_ref: String) -> String {
    if is_embeddable(&image_ref)
        || image_ref.starts_with("file://")
        || Path::new(&image_ref).is_absolute()
    {
        image_ref
    } else {
        base.join(image_ref).to_string_lossy().into_owned()
    }
}
