use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SelectionConfig;
use crate::geometry::{NormalizedRect, Point};

/// Stable identifier assigned to each candidate when it enters the engine.
///
/// Two candidates with identical boxes still get distinct ids, so "is this
/// object selected" never depends on geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A detection result as delivered by the external detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: NormalizedRect,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: NormalizedRect) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }
}

/// A candidate held by the selection engine.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedObject {
    pub id: ObjectId,
    pub label: String,
    pub bbox: NormalizedRect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionState {
    Idle,
    Drawing { anchor: Point },
    Complete,
}

/// Result of releasing a freehand draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawOutcome {
    /// The rectangle is kept and the crop is complete.
    Completed(NormalizedRect),
    /// Too small on at least one axis; treated as an accidental click.
    Discarded,
    /// No draw was in progress.
    NotDrawing,
}

/// Crop rectangle plus the detected candidates it can be picked from.
#[derive(Clone, Debug)]
pub struct SelectionEngine {
    min_size: f32,
    state: SelectionState,
    rect: Option<NormalizedRect>,
    candidates: Vec<DetectedObject>,
    selected: Option<ObjectId>,
    next_id: u64,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(&SelectionConfig::default())
    }
}

impl SelectionEngine {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            min_size: config.min_size,
            state: SelectionState::Idle,
            rect: None,
            candidates: Vec::new(),
            selected: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn rect(&self) -> Option<NormalizedRect> {
        self.rect
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, SelectionState::Drawing { .. })
    }

    pub fn begin_draw(&mut self, anchor: Point) {
        self.state = SelectionState::Drawing { anchor };
        self.rect = Some(NormalizedRect::at(anchor));
        self.selected = None;
    }

    /// Stretch the rectangle between the anchor and `current`. Ignored
    /// unless a draw is in progress.
    pub fn update_draw(&mut self, current: Point) -> Option<NormalizedRect> {
        let SelectionState::Drawing { anchor } = self.state else {
            return None;
        };
        let rect = NormalizedRect::from_corners(anchor, current);
        self.rect = Some(rect);
        Some(rect)
    }

    pub fn end_draw(&mut self) -> DrawOutcome {
        if !self.is_drawing() {
            return DrawOutcome::NotDrawing;
        }
        match self.rect {
            Some(rect) if rect.width >= self.min_size && rect.height >= self.min_size => {
                self.state = SelectionState::Complete;
                debug!(?rect, "Crop complete");
                DrawOutcome::Completed(rect)
            }
            _ => {
                self.state = SelectionState::Idle;
                self.rect = None;
                DrawOutcome::Discarded
            }
        }
    }

    /// Replace the candidate list. Each detection gets a fresh id; the ids
    /// are returned in input order.
    pub fn set_candidates(&mut self, detections: Vec<Detection>) -> Vec<ObjectId> {
        let mut next_id = self.next_id;
        let candidates: Vec<DetectedObject> = detections
            .into_iter()
            .map(|d| {
                let id = ObjectId(next_id);
                next_id += 1;
                DetectedObject {
                    id,
                    label: d.label,
                    bbox: d.bbox,
                }
            })
            .collect();
        self.next_id = next_id;
        self.selected = None;
        self.candidates = candidates;
        self.candidates.iter().map(|c| c.id).collect()
    }

    pub fn candidates(&self) -> &[DetectedObject] {
        &self.candidates
    }

    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn candidate(&self, id: ObjectId) -> Option<&DetectedObject> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Take a candidate's box as the crop rectangle. Unknown ids change nothing.
    pub fn select_candidate(&mut self, id: ObjectId) -> Option<&DetectedObject> {
        let idx = self.candidates.iter().position(|c| c.id == id)?;
        self.rect = Some(self.candidates[idx].bbox);
        self.selected = Some(id);
        self.state = SelectionState::Complete;
        Some(&self.candidates[idx])
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected == Some(id)
    }

    pub fn selected(&self) -> Option<&DetectedObject> {
        self.selected.and_then(|id| self.candidate(id))
    }

    /// Drop the rectangle, the selection and all candidates.
    pub fn clear(&mut self) {
        self.state = SelectionState::Idle;
        self.rect = None;
        self.candidates.clear();
        self.selected = None;
    }

    /// Candidates in paint order: largest first, so nested (smaller) boxes
    /// end up on top.
    pub fn candidates_by_area(&self) -> Vec<&DetectedObject> {
        let mut sorted: Vec<&DetectedObject> = self.candidates.iter().collect();
        sorted.sort_by(|a, b| {
            b.bbox
                .area()
                .partial_cmp(&a.bbox.area())
                .unwrap_or(Ordering::Equal)
        });
        sorted
    }

    /// Top-most candidate under `point`, i.e. the smallest box containing it.
    pub fn candidate_at(&self, point: Point) -> Option<&DetectedObject> {
        self.candidates_by_area()
            .into_iter()
            .rev()
            .find(|c| c.bbox.contains(point))
    }
}
