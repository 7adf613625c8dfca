// Markup inserter: splices highlight spans into a text buffer at the
// (possibly remapped) offsets of the accepted annotations.
//
// Annotations are walked from the highest start to the lowest, exactly as if
// every tag were inserted into the buffer in that order. Instead of shifting
// the buffer on each insertion, the walk collects (byte offset, fragment)
// edits and a single left-to-right pass builds the output.

use crate::annotation::Annotation;
use crate::repositioning::OffsetMapper;
use crate::sorted_list::SortedAnnotationList;
use std::borrow::Cow;
use tracing::debug;

pub const TAG_OPEN: &str = "<span id=\"";
pub const TAG_TITLE: &str = "\" title=\"";
pub const TAG_STYLE: &str = "\" style=\"highlight\">";
pub const TAG_CLOSE: &str = "</span>";

/// Opening tag for one annotation: `<span id="ID" title="TYPE" style="highlight">`
pub fn opening_tag(annotation: &Annotation) -> String {
    let title = html_escape::encode_double_quoted_attribute(&annotation.kind);
    let mut tag = String::with_capacity(TAG_OPEN.len() + TAG_TITLE.len() + TAG_STYLE.len() + title.len() + 20);
    tag.push_str(TAG_OPEN);
    tag.push_str(&annotation.id.to_string());
    tag.push_str(TAG_TITLE);
    tag.push_str(&title);
    tag.push_str(TAG_STYLE);
    tag
}

/// Counts from one markup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupStats {
    /// Annotations that received tags
    pub written: usize,
    /// Annotations dropped because an endpoint had no valid position
    pub skipped: usize,
}

/// Result of one markup pass
#[derive(Debug, Clone)]
pub struct MarkedUpText {
    pub text: String,
    pub stats: MarkupStats,
}

struct Edit<'t> {
    offset: usize,
    fragment: Cow<'t, str>,
}

/// Inserts highlight markup, optionally remapping offsets into original text
#[derive(Clone, Copy, Default)]
pub struct MarkupInserter<'m> {
    mapper: Option<&'m dyn OffsetMapper>,
}

impl<'m> MarkupInserter<'m> {
    /// Offsets are used as-is against the base buffer
    pub fn new() -> Self {
        Self { mapper: None }
    }

    /// Offsets are translated through `mapper` before use
    pub fn with_mapper(mapper: &'m dyn OffsetMapper) -> Self {
        Self { mapper: Some(mapper) }
    }

    pub fn is_remapping(&self) -> bool {
        self.mapper.is_some()
    }

    /// Produce `base` with a span around every accepted annotation whose
    /// endpoints resolve to valid positions in `base`. Invalid annotations are
    /// skipped without affecting the others.
    pub fn insert(&self, base: &str, accepted: &SortedAnnotationList<'_>) -> MarkedUpText {
        let boundaries = char_boundaries(base);
        let char_len = boundaries.len() - 1;

        let mut stats = MarkupStats::default();
        let mut edits: Vec<Edit<'static>> = Vec::with_capacity(accepted.len() * 2);
        // Lowest start placed so far; remapped ends never run past it
        let mut limit = char_len;

        for annotation in accepted.iter().rev() {
            let Some((start, end)) = self.resolve(annotation) else {
                debug!(
                    "Skipping annotation {} ({}) [{}, {}): no original position",
                    annotation.id, annotation.kind, annotation.start, annotation.end
                );
                stats.skipped += 1;
                continue;
            };
            if end > char_len || start > end.min(limit) {
                debug!(
                    "Skipping annotation {} ({}): resolved range [{}, {}) outside buffer of {} chars",
                    annotation.id, annotation.kind, start, end, char_len
                );
                stats.skipped += 1;
                continue;
            }
            let end = end.min(limit);

            edits.push(Edit {
                offset: boundaries[end],
                fragment: Cow::Borrowed(TAG_CLOSE),
            });
            edits.push(Edit {
                offset: boundaries[start],
                fragment: Cow::Owned(opening_tag(annotation)),
            });
            limit = start;
            stats.written += 1;
        }

        MarkedUpText {
            text: apply_edits(base, edits),
            stats,
        }
    }

    fn resolve(&self, annotation: &Annotation) -> Option<(usize, usize)> {
        match self.mapper {
            Some(mapper) => Some((
                mapper.map_offset(annotation.start, false)?,
                mapper.map_offset(annotation.end, true)?,
            )),
            None => Some((annotation.start, annotation.end)),
        }
    }
}

// A later insertion at an offset already holding a fragment lands in front of
// it, so same-offset fragments are emitted in reverse collection order.
fn apply_edits(base: &str, mut edits: Vec<Edit<'_>>) -> String {
    edits.reverse();
    edits.sort_by_key(|edit| edit.offset);

    let extra: usize = edits.iter().map(|edit| edit.fragment.len()).sum();
    let mut output = String::with_capacity(base.len() + extra);
    let mut cursor = 0;
    for edit in &edits {
        output.push_str(&base[cursor..edit.offset]);
        output.push_str(&edit.fragment);
        cursor = edit.offset;
    }
    output.push_str(&base[cursor..]);
    output
}

/// Byte index of every char offset in `text`, plus `text.len()` for the end
pub(crate) fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .collect()
}
