pub mod annotation;
pub mod document;
pub mod engine;
pub mod markup;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod repositioning;
pub mod sorted_list;
pub mod xml;

// Re-export the highlighting core
pub use annotation::{Annotation, AnnotationSelector, AnnotationSet};
pub use markup::{opening_tag, MarkedUpText, MarkupInserter, MarkupStats};
pub use repositioning::{OffsetMapper, PositionInfo, RepositioningInfo};
pub use sorted_list::SortedAnnotationList;

// Re-export document loading and engines
pub use document::{Document, DocumentLocator};
pub use engine::{build_engine, AnnotationEngine, EngineKind, GazetteerConfig, GazetteerEngine, SidecarEngine};
pub use reader::{DocumentReader, ReaderConfig};

// Re-export the batch pipeline
pub use pipeline::{highlight_document, process_documents, DocumentStats, PipelineConfig, RunStats};
