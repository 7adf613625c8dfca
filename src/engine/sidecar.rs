// Sidecar engine: annotations computed elsewhere, stored as JSON next to each
// local document as `<file name>.annotations.json`.
//
// Expected shape is an array of records with character offsets into the
// processed text:
//
//   [{"id": 0, "type": "Location", "start": 8, "end": 13, "features": {"rule": "Location1"}}]

use super::AnnotationEngine;
use crate::annotation::{Annotation, AnnotationSet};
use crate::document::{Document, DocumentLocator};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the annotations for the document at `path` live
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".annotations.json");
    path.with_file_name(name)
}

pub struct SidecarEngine;

impl AnnotationEngine for SidecarEngine {
    fn name(&self) -> &str {
        "sidecar"
    }

    // Runs on a blocking worker, so std::fs is fine here
    fn annotate(&self, doc: &Document) -> Result<AnnotationSet> {
        let path = match &doc.locator {
            DocumentLocator::Path(path) => sidecar_path(path),
            DocumentLocator::Remote(url) => {
                anyhow::bail!("Sidecar annotations are only available for local documents, not {url}")
            }
        };

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read annotations from {}", path.display()))?;
        let annotations: Vec<Annotation> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid annotations in {}", path.display()))?;

        let content_len = doc.content.chars().count();
        if let Some(bad) = annotations.iter().find(|a| a.end > content_len) {
            anyhow::bail!(
                "Annotation {} in {} ends at {} but {} has only {} characters",
                bad.id,
                path.display(),
                bad.end,
                doc.locator,
                content_len
            );
        }

        let set = AnnotationSet::from_annotations(annotations)
            .with_context(|| format!("Invalid annotations in {}", path.display()))?;
        debug!("Loaded {} sidecar annotations for {}", set.len(), doc.locator);
        Ok(set)
    }
}
