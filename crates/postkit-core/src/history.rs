//! Snapshot-based undo/redo.
//!
//! The stack always keeps at least one entry: the state the editor was
//! opened with. Undo never goes past it.

use crate::layers::Layer;
use crate::resources::ResourceHandle;
use std::collections::{HashSet, VecDeque};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_DEPTH: usize = 60;

/// Linear history of layer-collection snapshots.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Vec<Layer>>,
    future: Vec<Vec<Layer>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Clear both stacks and start from `initial`.
    pub fn reset(&mut self, initial: &[Layer]) {
        self.past.clear();
        self.future.clear();
        self.past.push_back(initial.to_vec());
    }

    /// Record a new state. Drops the oldest entries beyond capacity and
    /// invalidates redo.
    pub fn checkpoint(&mut self, layers: &[Layer]) {
        self.past.push_back(layers.to_vec());
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Record `layers` unless it equals the current top.
    /// Returns whether a checkpoint was taken.
    pub fn checkpoint_if_changed(&mut self, layers: &[Layer]) -> bool {
        if self.top() == Some(layers) {
            return false;
        }
        self.checkpoint(layers);
        true
    }

    /// Step back. Returns the state to restore, or `None` at the floor.
    pub fn undo(&mut self) -> Option<&[Layer]> {
        if self.past.len() <= 1 {
            log::debug!("Nothing to undo");
            return None;
        }
        let current = self.past.pop_back()?;
        self.future.push(current);
        self.top()
    }

    /// Step forward. Returns the state to restore, or `None` if nothing was
    /// undone.
    pub fn redo(&mut self) -> Option<&[Layer]> {
        let Some(next) = self.future.pop() else {
            log::debug!("Nothing to redo");
            return None;
        };
        self.past.push_back(next);
        self.top()
    }

    pub fn top(&self) -> Option<&[Layer]> {
        self.past.back().map(Vec::as_slice)
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of entries on the undo stack, including the current state.
    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every resource handle some undo or redo snapshot still points at.
    /// Anything outside this set and the live document can never come back.
    pub fn referenced_handles(&self) -> HashSet<ResourceHandle> {
        self.past
            .iter()
            .chain(self.future.iter())
            .flatten()
            .filter_map(Layer::resource_handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::layers::{ImageLayer, TextLayer};
    use crate::resources::{ImageResource, ResourcePool};
    use kurbo::Point;

    fn state(n: usize) -> Vec<Layer> {
        let mut layers = vec![Layer::background(HexColor::white())];
        for i in 0..n {
            layers.push(Layer::text(Point::new(i as f64, 0.0), TextLayer::new("t")));
        }
        layers
    }

    #[test]
    fn test_undo_at_floor_is_noop() {
        let mut history = History::default();
        history.reset(&state(0));
        assert!(history.undo().is_none());
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::default();
        let s0 = state(0);
        let s1 = state(1);
        history.reset(&s0);
        history.checkpoint(&s1);

        assert_eq!(history.undo().unwrap(), s0.as_slice());
        assert!(history.can_redo());
        assert_eq!(history.redo().unwrap(), s1.as_slice());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_checkpoint_clears_future() {
        let mut history = History::default();
        history.reset(&state(0));
        history.checkpoint(&state(1));
        history.undo();
        history.checkpoint(&state(2));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(3);
        history.reset(&state(0));
        for n in 1..=5 {
            history.checkpoint(&state(n));
        }
        assert_eq!(history.len(), 3);
        history.undo();
        history.undo();
        assert!(history.undo().is_none());
        assert_eq!(history.top().unwrap().len(), 4);
    }

    #[test]
    fn test_checkpoint_if_changed() {
        let mut history = History::default();
        let s0 = state(0);
        history.reset(&s0);
        assert!(!history.checkpoint_if_changed(&s0));
        assert!(history.checkpoint_if_changed(&state(1)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_referenced_handles_follow_dropped_snapshots() {
        let mut pool = ResourcePool::new();
        let handle = pool.register(ImageResource::new(vec![1]));
        let mut with_image = state(0);
        with_image.push(Layer::image(Point::ZERO, ImageLayer::owned(handle)));

        let mut history = History::default();
        history.reset(&state(0));
        history.checkpoint(&with_image);
        history.undo();
        assert!(history.referenced_handles().contains(&handle));

        history.checkpoint(&state(1));
        assert!(history.referenced_handles().is_empty());
    }

    #[test]
    fn test_evicted_snapshot_drops_its_handles() {
        let mut pool = ResourcePool::new();
        let handle = pool.register(ImageResource::new(vec![1]));
        let mut with_image = state(0);
        with_image.push(Layer::image(Point::ZERO, ImageLayer::owned(handle)));

        let mut history = History::new(2);
        history.reset(&with_image);
        history.checkpoint(&state(1));
        assert!(history.referenced_handles().contains(&handle));
        history.checkpoint(&state(2));
        assert!(!history.referenced_handles().contains(&handle));
    }
}
