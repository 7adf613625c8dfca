// Overlap-resolving sorter: builds the accepted list of annotations that will
// receive markup. Accepted entries are pairwise non-overlapping and strictly
// increasing by start; once placed they are never moved or removed.

use crate::annotation::Annotation;
use std::cmp::Reverse;
use tracing::debug;

/// Start-sorted, non-overlapping list of borrowed annotations
#[derive(Debug, Clone, Default)]
pub struct SortedAnnotationList<'a> {
    accepted: Vec<&'a Annotation>,
}

impl<'a> SortedAnnotationList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed candidates in the deterministic order `(start, longest first, id)`.
    ///
    /// Among annotations competing for the same text the earliest-starting one
    /// wins; on equal starts the longer one wins, then the lower id.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        let mut ordered: Vec<&'a Annotation> = candidates.into_iter().collect();
        ordered.sort_by_key(|a| (a.start, Reverse(a.len()), a.id));

        let mut list = Self::new();
        let total = ordered.len();
        for candidate in ordered {
            list.insert_exclusive(candidate);
        }
        debug!("Accepted {} of {} candidate annotations", list.len(), total);
        list
    }

    /// Insert `candidate` unless it conflicts with an accepted annotation.
    ///
    /// First come, first served: whichever of two conflicting annotations is
    /// offered first stays. Returns whether the candidate was accepted.
    /// Linear in the list length.
    pub fn insert_exclusive(&mut self, candidate: &'a Annotation) -> bool {
        if let Some(blocker) = self.accepted.iter().find(|a| conflicts(a, candidate)) {
            debug!(
                "Rejected annotation {} [{}, {}) overlapping {} [{}, {})",
                candidate.id, candidate.start, candidate.end, blocker.id, blocker.start, blocker.end
            );
            return false;
        }

        let position = self
            .accepted
            .iter()
            .position(|a| a.start > candidate.start)
            .unwrap_or(self.accepted.len());
        self.accepted.insert(position, candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Annotation> {
        self.accepted.get(index).copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Annotation> + '_ {
        self.accepted.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'a Annotation] {
        &self.accepted
    }
}

// Equal starts conflict as well, keeping starts strictly increasing even for
// zero-length annotations that sit on another annotation's first character.
fn conflicts(accepted: &Annotation, candidate: &Annotation) -> bool {
    candidate.overlaps(accepted) || candidate.start == accepted.start
}
