//! Bounded stability-history buffer for UI diagnostics.
//!
//! Each processed frame contributes one similarity vector (its score
//! against every frame in the rolling window). The history keeps the most
//! recent [`HISTORY_CAP`] vectors, padded to uniform width so a chart
//! widget can plot them directly, and fans out update events to
//! subscribers over channels instead of a GUI observable property.

use crate::types::{SimilarityScore, HISTORY_CAP};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

/// Notification that the stability history changed.
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    /// A new similarity vector was recorded. Carries the padded row so
    /// subscribers can update incrementally without re-reading everything.
    Recorded { row: Vec<SimilarityScore> },
    /// The history was cleared (detector reset).
    Cleared,
}

/// Fixed-capacity FIFO of per-frame similarity vectors.
pub struct StabilityHistory {
    rows: VecDeque<Vec<SimilarityScore>>,
    row_width: usize,
    capacity: usize,
    subscribers: Vec<Sender<HistoryEvent>>,
}

impl StabilityHistory {
    /// Create a history whose rows are padded to `row_width` entries.
    pub fn new(row_width: usize) -> Self {
        Self::with_capacity(row_width, HISTORY_CAP)
    }

    pub fn with_capacity(row_width: usize, capacity: usize) -> Self {
        Self {
            rows: VecDeque::with_capacity(capacity.min(1024)),
            row_width,
            capacity: capacity.max(1),
            subscribers: Vec::new(),
        }
    }

    /// Subscribe to history updates.
    ///
    /// Dropped receivers are pruned lazily on the next notification; a
    /// slow subscriber never blocks the detector.
    pub fn subscribe(&mut self) -> Receiver<HistoryEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Record one similarity vector, padding the front with zeros up to
    /// the configured row width. Evicts the oldest row when full.
    pub fn record(&mut self, similarities: &[SimilarityScore]) {
        let pad = self.row_width.saturating_sub(similarities.len());
        let mut row = Vec::with_capacity(self.row_width);
        row.extend(std::iter::repeat(0.0).take(pad));
        row.extend_from_slice(similarities);
        row.truncate(self.row_width);

        if self.rows.len() >= self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back(row.clone());
        self.notify(HistoryEvent::Recorded { row });
    }

    /// Drop all rows, e.g. when the detector is reset.
    pub fn clear(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.rows.clear();
        self.notify(HistoryEvent::Cleared);
    }

    /// Copy of the retained rows, oldest first. Intended for plotting.
    pub fn snapshot(&self) -> Vec<Vec<SimilarityScore>> {
        self.rows.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    fn notify(&mut self, event: HistoryEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
