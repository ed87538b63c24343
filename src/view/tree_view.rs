//! State of one pedigree view.
//!
//! The view shows the tree of whichever animal was requested last. Fetches are
//! tagged with a [`Generation`]; a response or failure for any earlier request
//! is ignored, so switching animals quickly never shows a stale tree.

use std::fmt;
use tracing::debug;

use super::layout::{PedigreeLayout, TreeLayout};
use crate::api::{Generation, RequestGeneration};
use crate::models::{AncestryPayload, PedigreeTree};

#[derive(Debug, Default)]
pub struct TreeView {
    generations: RequestGeneration,
    loading: bool,
    tree: Option<PedigreeTree>,
    error: Option<String>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, superseding any outstanding one.
    pub fn begin_fetch(&mut self) -> Generation {
        self.loading = true;
        self.error = None;
        self.generations.issue()
    }

    /// Build and show the tree from `payload` if `generation` is still current.
    ///
    /// Returns whether the payload was applied.
    pub fn apply(&mut self, generation: Generation, payload: &AncestryPayload) -> bool {
        if !self.generations.is_current(generation) {
            debug!(generation = generation.value(), "discarding stale ancestry response");
            return false;
        }
        self.tree = Some(payload.build());
        self.error = None;
        self.loading = false;
        true
    }

    /// Record a failed fetch if `generation` is still current.
    ///
    /// The previous tree is cleared so it is not mistaken for the requested one.
    pub fn fail(&mut self, generation: Generation, error: impl fmt::Display) -> bool {
        if !self.generations.is_current(generation) {
            debug!(generation = generation.value(), "discarding stale ancestry failure");
            return false;
        }
        self.tree = None;
        self.error = Some(error.to_string());
        self.loading = false;
        true
    }

    /// Drop the shown tree and cancel any outstanding fetch.
    pub fn clear(&mut self) {
        self.generations.invalidate();
        self.tree = None;
        self.error = None;
        self.loading = false;
    }

    /// Whether a response for `generation` would still be shown.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn tree(&self) -> Option<&PedigreeTree> {
        self.tree.as_ref()
    }

    /// User-visible message for the last failed fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lay out the shown tree.
    pub fn layout(&self, layout: &TreeLayout) -> Option<PedigreeLayout> {
        self.tree.as_ref().map(|tree| layout.layout(&tree.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AncestorRecord, FocalAnimal, Sex};

    fn payload(id: &str, sire: &str) -> AncestryPayload {
        AncestryPayload {
            animal: FocalAnimal::new(id, id, Sex::Male),
            ancestors: vec![AncestorRecord::new(sire, sire, Sex::Male, id)],
        }
    }

    #[test]
    fn test_apply_current_generation() {
        let mut view = TreeView::new();
        let generation = view.begin_fetch();
        assert!(view.is_loading());

        assert!(view.apply(generation, &payload("X", "A")));
        assert!(!view.is_loading());
        let tree = view.tree().unwrap();
        assert_eq!(tree.root.id, "X");
        assert_eq!(tree.root.child_ids(), vec!["A"]);
    }

    #[test]
    fn test_stale_response_does_not_overwrite() {
        let mut view = TreeView::new();
        let first = view.begin_fetch();
        let second = view.begin_fetch();

        assert!(view.apply(second, &payload("Y", "B")));
        assert!(!view.apply(first, &payload("X", "A")));
        assert_eq!(view.tree().unwrap().root.id, "Y");
        assert!(!view.is_current(first));
        assert!(view.is_current(second));
    }

    #[test]
    fn test_stale_failure_ignored() {
        let mut view = TreeView::new();
        let first = view.begin_fetch();
        let second = view.begin_fetch();
        assert!(view.apply(second, &payload("Y", "B")));

        assert!(!view.fail(first, "timed out"));
        assert!(view.error().is_none());
        assert!(view.tree().is_some());
    }

    #[test]
    fn test_current_failure_clears_tree() {
        let mut view = TreeView::new();
        let first = view.begin_fetch();
        view.apply(first, &payload("X", "A"));

        let second = view.begin_fetch();
        assert!(view.fail(second, "Not found: animal"));
        assert!(view.tree().is_none());
        assert_eq!(view.error(), Some("Not found: animal"));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_clear_cancels_outstanding() {
        let mut view = TreeView::new();
        let generation = view.begin_fetch();
        view.clear();
        assert!(!view.apply(generation, &payload("X", "A")));
        assert!(view.layout(&TreeLayout::default()).is_none());
    }
}
