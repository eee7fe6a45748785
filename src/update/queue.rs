//! FIFO of update requests waiting for a transition to finish.

use crate::layout::LayoutConfiguration;
use crate::model::ElementId;
use crate::surface::Geometry;
use std::collections::VecDeque;
use std::sync::Arc;

/// One geometry write.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementUpdate {
    /// Target element.
    pub id: ElementId,
    /// Geometry to write.
    pub geometry: Geometry,
}

impl ElementUpdate {
    /// Write `geometry` to `id`.
    pub fn new(id: ElementId, geometry: Geometry) -> Self {
        Self { id, geometry }
    }
}

/// A deferred call to `apply_configuration` or `apply_batch`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    /// A full layout.
    Configuration(Arc<LayoutConfiguration>),
    /// Individual writes.
    Batch(Vec<ElementUpdate>),
}

/// Strict arrival-order queue.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    requests: VecDeque<UpdateRequest>,
}

impl UpdateQueue {
    /// Append a request; returns its 1-based position.
    pub fn push(&mut self, request: UpdateRequest) -> usize {
        self.requests.push_back(request);
        self.requests.len()
    }

    /// Oldest request.
    pub fn pop(&mut self) -> Option<UpdateRequest> {
        self.requests.pop_front()
    }

    /// Requests waiting.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop every waiting request.
    pub fn clear(&mut self) {
        self.requests.clear();
    }
}
