// Documents as the annotation pipeline sees them: the original content, the
// processed text handed to the engine, and the mapping between the two.

pub mod locator;
pub mod preprocess;

pub use locator::DocumentLocator;
pub use preprocess::{preprocess, sniff_markup, Preprocessed};

use crate::reader::DocumentReader;
use crate::repositioning::{OffsetMapper, RepositioningInfo};
use anyhow::Result;
use tracing::debug;

/// A loaded document
#[derive(Debug, Clone)]
pub struct Document {
    pub locator: DocumentLocator,
    /// Source text before preprocessing; `None` when only processed text is known
    pub original_content: Option<String>,
    /// Text the annotation engine works on
    pub content: String,
    /// Present only when preprocessing moved offsets
    pub repositioning: Option<RepositioningInfo>,
}

impl Document {
    /// Build a document from its original text, preprocessing it.
    ///
    /// Markup handling applies when the locator names an HTML/XML document or
    /// the content itself looks like markup.
    pub fn from_original(locator: DocumentLocator, original: String) -> Result<Self> {
        let markup = locator.looks_like_markup() || sniff_markup(&original);
        let Preprocessed { content, repositioning } = preprocess(&original, markup)?;

        let repositioning = if repositioning.has_alterations() {
            debug!(
                "Preprocessing {} altered offsets ({} position blocks)",
                locator,
                repositioning.len()
            );
            Some(repositioning)
        } else {
            None
        };

        Ok(Self {
            locator,
            original_content: Some(original),
            content,
            repositioning,
        })
    }

    /// Build a document from already-processed text with no original source
    pub fn from_processed(locator: DocumentLocator, content: String) -> Self {
        Self {
            locator,
            original_content: None,
            content,
            repositioning: None,
        }
    }

    /// Fetch and preprocess the document behind `locator`
    pub async fn load(locator: DocumentLocator, reader: &DocumentReader) -> Result<Self> {
        let (original, stats) = reader.read(&locator).await?;
        debug!("Loaded {} ({} bytes in {}ms)", locator, stats.bytes_read, stats.duration_ms);
        Self::from_original(locator, original)
    }

    /// Text that receives markup, paired with the mapper to use for it.
    ///
    /// With original content and a repositioning mapping, markup goes into the
    /// original through the mapping. With original content that preprocessing
    /// left untouched, offsets apply to it directly. Without original content,
    /// markup goes into the processed text.
    pub fn markup_base(&self) -> (&str, Option<&dyn OffsetMapper>) {
        match (&self.original_content, &self.repositioning) {
            (Some(original), Some(info)) => (original.as_str(), Some(info as &dyn OffsetMapper)),
            (Some(original), None) => (original.as_str(), None),
            (None, _) => (self.content.as_str(), None),
        }
    }
}
