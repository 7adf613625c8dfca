// Annotation engines: the named-entity recognizers the pipeline consults.
//
// The highlighting core only needs annotations with ids, types and offsets
// into the processed text. Any recognizer that can produce those plugs in by
// implementing `AnnotationEngine`.

pub mod gazetteer;
pub mod sidecar;

pub use gazetteer::{GazetteerConfig, GazetteerEngine};
pub use sidecar::{sidecar_path, SidecarEngine};

use crate::annotation::AnnotationSet;
use crate::document::Document;
use anyhow::Result;
use clap::ValueEnum;
use std::path::Path;
use std::sync::Arc;

/// Produces the full annotation set for a document's processed text
pub trait AnnotationEngine: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Annotate `doc.content`. Offsets are character offsets into it.
    fn annotate(&self, doc: &Document) -> Result<AnnotationSet>;
}

/// Engines selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Phrase lists matched against the processed text
    Gazetteer,
    /// Annotations precomputed by an external recognizer, stored next to each document
    Sidecar,
}

/// Construct the engine selected on the command line
pub fn build_engine(kind: EngineKind, gazetteer: Option<&Path>) -> Result<Arc<dyn AnnotationEngine>> {
    match kind {
        EngineKind::Gazetteer => {
            let config = match gazetteer {
                Some(path) => GazetteerConfig::load(path)?,
                None => GazetteerConfig::default(),
            };
            Ok(Arc::new(GazetteerEngine::new(&config)?))
        }
        EngineKind::Sidecar => {
            if gazetteer.is_some() {
                anyhow::bail!("--gazetteer only applies to the gazetteer engine");
            }
            Ok(Arc::new(SidecarEngine))
        }
    }
}
