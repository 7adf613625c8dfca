// Annotation records produced by an annotation engine, and the selector that
// narrows a document's annotation set down to the entity types of interest.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A labeled span of processed text.
///
/// `start` and `end` are character offsets (Unicode scalar values) into the
/// processed text, half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub start: usize,
    pub end: usize,
    /// Engine-specific extras (e.g. `rule`, `majorType`), carried into the XML output only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(id: u64, kind: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            id,
            kind: kind.into(),
            start,
            end,
            features: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(name.into(), value.into());
        self
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open range intersection. Annotations that merely touch at a shared
    /// endpoint do not overlap; a zero-length annotation strictly inside another does.
    pub fn overlaps(&self, other: &Annotation) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Reject records that break `start <= end`
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            anyhow::bail!(
                "Annotation {} ({}) has start {} after end {}",
                self.id,
                self.kind,
                self.start,
                self.end
            );
        }
        Ok(())
    }
}

/// All annotations an engine produced for one document.
///
/// Ids are unique within a set. Records are kept in the order they were added,
/// which is the order the selector hands them on.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    ids: BTreeSet<u64>,
    next_id: u64,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from engine records, validating each one
    pub fn from_annotations<I: IntoIterator<Item = Annotation>>(annotations: I) -> Result<Self> {
        let mut set = Self::new();
        for annotation in annotations {
            set.insert(annotation)?;
        }
        Ok(set)
    }

    /// Add a new annotation, assigning the next free id
    pub fn add(&mut self, kind: impl Into<String>, start: usize, end: usize) -> Result<u64> {
        let id = self.next_id;
        self.insert(Annotation::new(id, kind, start, end))?;
        Ok(id)
    }

    /// Insert an annotation that already carries an id
    pub fn insert(&mut self, annotation: Annotation) -> Result<()> {
        annotation.validate()?;
        if !self.ids.insert(annotation.id) {
            anyhow::bail!("Duplicate annotation id {}", annotation.id);
        }
        self.next_id = self.next_id.max(annotation.id.saturating_add(1));
        self.annotations.push(annotation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// List the annotations whose type the selector wants
    pub fn get<'a>(&'a self, selector: &AnnotationSelector) -> Vec<&'a Annotation> {
        selector.select(self.annotations.iter())
    }
}

/// Filters annotations by type label. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSelector {
    wanted: BTreeSet<String>,
}

impl AnnotationSelector {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wanted: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn wanted_types(&self) -> impl Iterator<Item = &str> {
        self.wanted.iter().map(String::as_str)
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        self.wanted.contains(&annotation.kind)
    }

    pub fn select<'a, I>(&self, annotations: I) -> Vec<&'a Annotation>
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        annotations
            .into_iter()
            .filter(|annotation| self.matches(annotation))
            .collect()
    }
}

impl Default for AnnotationSelector {
    fn default() -> Self {
        Self::new(["Person", "Location"])
    }
}
