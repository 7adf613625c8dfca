// Batch driver: takes document locators, runs each document through
// load -> annotate -> select -> sort -> markup -> write, and collects stats.
//
// Documents are independent units of work. A failure in one (bad locator,
// unreadable input, engine error, failed write) is recorded against that
// document only, unless fail-fast is on.

use crate::annotation::{AnnotationSelector, AnnotationSet};
use crate::document::{Document, DocumentLocator};
use crate::engine::AnnotationEngine;
use crate::markup::{MarkupInserter, MarkupStats};
use crate::output::{output_path, write_atomic, xml_output_path};
use crate::reader::{DocumentReader, ReaderConfig};
use crate::sorted_list::SortedAnnotationList;
use crate::xml::to_xml;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Entity types that receive highlight markup
    pub selector: AnnotationSelector,
    /// Directory receiving `annotated_<n>.html` / `.xml`
    pub output_dir: PathBuf,
    /// Also write the XML rendition
    pub write_xml: bool,
    /// Documents processed concurrently
    pub jobs: usize,
    /// Abort the run on the first failed document
    pub fail_fast: bool,
    pub reader: ReaderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selector: AnnotationSelector::default(),
            output_dir: PathBuf::from("."),
            write_xml: true,
            jobs: num_cpus::get(),
            fail_fast: false,
            reader: ReaderConfig::default(),
        }
    }
}

/// Per-document processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentStats {
    /// 1-based position of the locator in the input list
    pub index: usize,
    pub locator: String,
    pub output_path: Option<String>,
    pub xml_path: Option<String>,
    /// Annotations the engine produced
    pub annotations_found: usize,
    /// Annotations of a wanted type
    pub annotations_selected: usize,
    /// Annotations surviving overlap resolution
    pub annotations_accepted: usize,
    /// Annotations that received markup
    pub annotations_written: usize,
    /// Annotations dropped for lack of a valid position
    pub annotations_skipped: usize,
    /// Whether markup went into original text through a repositioning mapping
    pub remapped: bool,
    pub processing_time_ms: u64,
    /// Processing status (success, failed)
    pub status: String,
    /// Error message if processing failed
    pub error: Option<String>,
}

impl DocumentStats {
    fn new(index: usize, locator: &str) -> Self {
        Self {
            index,
            locator: locator.to_string(),
            output_path: None,
            xml_path: None,
            annotations_found: 0,
            annotations_selected: 0,
            annotations_accepted: 0,
            annotations_written: 0,
            annotations_skipped: 0,
            remapped: false,
            processing_time_ms: 0,
            status: "success".to_string(),
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Whole-run statistics, written to the `--stats-out` file
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    /// Unix timestamp (seconds) when the run started
    pub run_start: u64,
    pub total_processing_time_ms: u64,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub total_annotations_written: usize,
    /// Ordered by input position
    pub document_stats: Vec<DocumentStats>,
}

/// Highlighted output for one document
#[derive(Debug, Clone)]
pub struct Highlighted {
    pub html: String,
    pub xml: Option<String>,
    pub annotations_found: usize,
    pub annotations_selected: usize,
    pub annotations_accepted: usize,
    pub markup: MarkupStats,
    pub remapped: bool,
}

/// Select, resolve overlaps and insert markup for one annotated document.
///
/// Markup goes into the original content when the document has one (through
/// its repositioning mapping if preprocessing moved offsets) and into the
/// processed text otherwise.
pub fn highlight_document(
    doc: &Document,
    annotations: &AnnotationSet,
    selector: &AnnotationSelector,
    with_xml: bool,
) -> Result<Highlighted> {
    let selected = annotations.get(selector);
    let annotations_selected = selected.len();
    let accepted = SortedAnnotationList::from_candidates(selected);

    let (base, mapper) = doc.markup_base();
    let inserter = match mapper {
        Some(mapper) => MarkupInserter::with_mapper(mapper),
        None => MarkupInserter::new(),
    };
    let marked = inserter.insert(base, &accepted);

    let xml = if with_xml { Some(to_xml(doc, &accepted)?) } else { None };

    Ok(Highlighted {
        html: marked.text,
        xml,
        annotations_found: annotations.len(),
        annotations_selected,
        annotations_accepted: accepted.len(),
        markup: marked.stats,
        remapped: inserter.is_remapping(),
    })
}

/// Process one document end to end. Never fails: problems are recorded in the stats.
pub async fn process_document(
    index: usize,
    raw_locator: &str,
    engine: Arc<dyn AnnotationEngine>,
    reader: &DocumentReader,
    config: &PipelineConfig,
) -> DocumentStats {
    let start_time = Instant::now();
    let mut stats = DocumentStats::new(index, raw_locator);

    if let Err(e) = run_document(&mut stats, raw_locator, engine, reader, config).await {
        warn!("Failed to process {}: {:#}", raw_locator, e);
        stats.status = "failed".to_string();
        stats.error = Some(format!("{e:#}"));
    }

    stats.processing_time_ms = start_time.elapsed().as_millis() as u64;
    if !stats.is_failed() {
        info!(
            "Processed {}: {} of {} annotations highlighted in {}ms",
            raw_locator, stats.annotations_written, stats.annotations_selected, stats.processing_time_ms
        );
    }
    stats
}

async fn run_document(
    stats: &mut DocumentStats,
    raw_locator: &str,
    engine: Arc<dyn AnnotationEngine>,
    reader: &DocumentReader,
    config: &PipelineConfig,
) -> Result<()> {
    let locator = DocumentLocator::parse(raw_locator)?;
    let doc = Document::load(locator, reader).await?;

    let selector = config.selector.clone();
    let with_xml = config.write_xml;
    // Annotation and markup are CPU-bound
    let highlighted = tokio::task::spawn_blocking(move || -> Result<Highlighted> {
        let annotations = engine
            .annotate(&doc)
            .with_context(|| format!("{} engine failed on {}", engine.name(), doc.locator))?;
        highlight_document(&doc, &annotations, &selector, with_xml)
    })
    .await
    .context("Annotation task panicked")??;

    stats.annotations_found = highlighted.annotations_found;
    stats.annotations_selected = highlighted.annotations_selected;
    stats.annotations_accepted = highlighted.annotations_accepted;
    stats.annotations_written = highlighted.markup.written;
    stats.annotations_skipped = highlighted.markup.skipped;
    stats.remapped = highlighted.remapped;

    let html_path = output_path(&config.output_dir, stats.index);
    write_atomic(&html_path, highlighted.html).await?;
    stats.output_path = Some(html_path.display().to_string());

    if let Some(xml) = highlighted.xml {
        let xml_path = xml_output_path(&config.output_dir, stats.index);
        write_atomic(&xml_path, xml).await?;
        stats.xml_path = Some(xml_path.display().to_string());
    }
    Ok(())
}

/// Process every locator, `config.jobs` at a time
pub async fn process_documents(
    locators: &[String],
    engine: Arc<dyn AnnotationEngine>,
    config: &PipelineConfig,
    progress: Option<ProgressBar>,
) -> Result<RunStats> {
    let run_start = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let start_time = Instant::now();

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", config.output_dir.display()))?;
    let reader = DocumentReader::new(config.reader.clone())?;

    info!(
        "Processing {} documents with {} engine ({} jobs)",
        locators.len(),
        engine.name(),
        config.jobs.max(1)
    );

    let mut pending = stream::iter(locators.iter().enumerate())
        .map(|(i, raw)| process_document(i + 1, raw, Arc::clone(&engine), &reader, config))
        .buffer_unordered(config.jobs.max(1));

    let mut document_stats = Vec::with_capacity(locators.len());
    while let Some(stats) = pending.next().await {
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        if config.fail_fast {
            if let Some(error) = &stats.error {
                if let Some(pb) = &progress {
                    pb.abandon();
                }
                anyhow::bail!("Processing {} failed: {}", stats.locator, error);
            }
        }
        document_stats.push(stats);
    }
    if let Some(pb) = &progress {
        pb.finish_with_message("done");
    }

    document_stats.sort_by_key(|s| s.index);
    let documents_failed = document_stats.iter().filter(|s| s.is_failed()).count();
    let run = RunStats {
        run_start,
        total_processing_time_ms: start_time.elapsed().as_millis() as u64,
        documents_processed: document_stats.len() - documents_failed,
        documents_failed,
        total_annotations_written: document_stats.iter().map(|s| s.annotations_written).sum(),
        document_stats,
    };
    info!(
        "Run complete: {} processed, {} failed in {}ms",
        run.documents_processed, run.documents_failed, run.total_processing_time_ms
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::engine::{GazetteerConfig, GazetteerEngine, SidecarEngine};
    use std::path::Path;
    use tempfile::TempDir;

    fn gazetteer() -> Arc<dyn AnnotationEngine> {
        Arc::new(GazetteerEngine::new(&GazetteerConfig::default()).unwrap())
    }

    fn config(output_dir: &Path) -> PipelineConfig {
        PipelineConfig {
            output_dir: output_dir.to_path_buf(),
            jobs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_highlight_processed_text() {
        let doc = Document::from_processed(
            DocumentLocator::Path(PathBuf::from("story.txt")),
            "Paris Hilton visited Paris.".to_string(),
        );
        let annotations = AnnotationSet::from_annotations([
            Annotation::new(0, "Location", 0, 5),
            Annotation::new(1, "Person", 0, 12),
            Annotation::new(2, "Location", 21, 26),
            Annotation::new(3, "Date", 13, 20),
        ])
        .unwrap();

        let result = highlight_document(&doc, &annotations, &AnnotationSelector::default(), false).unwrap();
        assert_eq!(
            result.html,
            "<span id=\"1\" title=\"Person\" style=\"highlight\">Paris Hilton</span> visited \
             <span id=\"2\" title=\"Location\" style=\"highlight\">Paris</span>."
        );
        assert_eq!(result.annotations_found, 4);
        assert_eq!(result.annotations_selected, 3);
        assert_eq!(result.annotations_accepted, 2);
        assert_eq!(result.markup.written, 2);
        assert!(!result.remapped);
        assert!(result.xml.is_none());
    }

    #[test]
    fn test_highlight_remaps_into_original_markup() {
        let original = "<p>We met <b>Ada Lovelace</b> in London.</p>".to_string();
        let doc = Document::from_original(DocumentLocator::Path(PathBuf::from("story.html")), original).unwrap();
        let annotations = gazetteer().annotate(&doc).unwrap();

        let result = highlight_document(&doc, &annotations, &AnnotationSelector::default(), true).unwrap();
        assert!(result.remapped);
        assert_eq!(
            result.html,
            "<p>We met <span id=\"1\" title=\"Person\" style=\"highlight\"><b>Ada Lovelace</b></span> in \
             <span id=\"0\" title=\"Location\" style=\"highlight\">London</span>.</p>"
        );
        let xml = result.xml.unwrap();
        assert!(xml.contains("<Person id=\"1\" majorType=\"gazetteer\" phrase=\"Ada Lovelace\">Ada Lovelace</Person>"));
    }

    #[tokio::test]
    async fn test_process_documents_writes_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("story.txt");
        tokio::fs::write(&input, "Grace Hopper flew to Tokyo.").await.unwrap();
        let out_dir = temp_dir.path().join("out");

        let locators = vec![input.display().to_string()];
        let run = process_documents(&locators, gazetteer(), &config(&out_dir), None)
            .await
            .unwrap();

        assert_eq!(run.documents_processed, 1);
        assert_eq!(run.documents_failed, 0);
        assert_eq!(run.total_annotations_written, 2);

        let html = tokio::fs::read_to_string(out_dir.join("annotated_1.html")).await.unwrap();
        assert!(html.starts_with("<span id=\"1\" title=\"Person\" style=\"highlight\">Grace Hopper</span>"));
        assert!(out_dir.join("annotated_1.xml").exists());
    }

    #[tokio::test]
    async fn test_bad_documents_fail_alone() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.txt");
        tokio::fs::write(&good, "Rome").await.unwrap();
        let out_dir = temp_dir.path().join("out");

        let locators = vec![
            "ftp://example.com/doc.txt".to_string(),
            good.display().to_string(),
            temp_dir.path().join("missing.txt").display().to_string(),
        ];
        let mut cfg = config(&out_dir);
        cfg.write_xml = false;
        let run = process_documents(&locators, gazetteer(), &cfg, None).await.unwrap();

        assert_eq!(run.documents_processed, 1);
        assert_eq!(run.documents_failed, 2);
        let statuses: Vec<&str> = run.document_stats.iter().map(|s| s.status.as_str()).collect();
        assert_eq!(statuses, vec!["failed", "success", "failed"]);
        assert!(!out_dir.join("annotated_1.html").exists());
        assert!(out_dir.join("annotated_2.html").exists());
        assert!(!out_dir.join("annotated_2.xml").exists());
        assert!(!out_dir.join("annotated_3.html").exists());
    }

    #[tokio::test]
    async fn test_fail_fast_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(temp_dir.path());
        cfg.fail_fast = true;
        cfg.jobs = 1;

        let locators = vec![temp_dir.path().join("missing.txt").display().to_string()];
        let result = process_documents(&locators, Arc::new(SidecarEngine), &cfg, None).await;
        assert!(result.is_err());
    }
}
