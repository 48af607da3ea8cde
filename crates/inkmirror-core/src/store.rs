//! Stroke store: sealed strokes plus the gesture being drawn.

use crate::bounds;
use crate::outline::{self, OutlineOptions};
use crate::path::to_svg_path;
use crate::stroke::{Stroke, StrokeColor, StrokeId, StrokePoint};
use kurbo::{Point, Rect};
use std::borrow::Cow;

/// A gesture that has started but not yet been sealed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStroke {
    points: Vec<StrokePoint>,
    color: StrokeColor,
    size: f64,
}

impl PendingStroke {
    /// Samples captured so far.
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Fill color.
    pub fn color(&self) -> StrokeColor {
        self.color
    }

    /// Base width.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Live outline; the last point is still being smoothed toward.
    pub fn preview_outline(&self, template: &OutlineOptions) -> Vec<Point> {
        let reported = self.points.iter().any(StrokePoint::has_pressure);
        let mut options = template.with_size(self.size).for_device_pressure(reported);
        options.last = false;
        outline::outline(&self.points, &options)
    }

    /// Live SVG path data.
    pub fn preview_path(&self, template: &OutlineOptions) -> String {
        to_svg_path(&self.preview_outline(template), true)
    }
}

/// Ordered drawing state owned by a single context.
///
/// Insertion order is paint order. Ids increase by one per sealed stroke and
/// are never reused, except that undoing the most recent seal hands its id
/// back so that undo exactly reverses it.
#[derive(Debug, Clone)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    pending: Option<PendingStroke>,
    next_id: u64,
    options: OutlineOptions,
    revision: u64,
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self::new(OutlineOptions::default())
    }
}

impl StrokeStore {
    /// Create an empty store. `options` is the outline template; each
    /// stroke's own size replaces `options.size`.
    pub fn new(options: OutlineOptions) -> Self {
        Self {
            strokes: Vec::new(),
            pending: None,
            next_id: 1,
            options,
            revision: 0,
        }
    }

    /// Outline template used for every stroke in this store.
    pub fn options(&self) -> &OutlineOptions {
        &self.options
    }

    /// Start a gesture.
    ///
    /// Returns `false` without changing anything if a gesture is already in
    /// progress, the size is not a positive finite number, or the point is
    /// not finite.
    pub fn begin_stroke(&mut self, point: StrokePoint, color: StrokeColor, size: f64) -> bool {
        if self.pending.is_some() {
            log::debug!("begin_stroke ignored: a stroke is already in progress");
            return false;
        }
        if !(size.is_finite() && size > 0.0) || !point.is_finite() {
            log::debug!("begin_stroke ignored: invalid size {size} or point {point:?}");
            return false;
        }
        self.pending = Some(PendingStroke {
            points: vec![point],
            color,
            size,
        });
        true
    }

    /// Append a sample to the gesture in progress. No-op without one.
    pub fn extend_stroke(&mut self, point: StrokePoint) {
        if !point.is_finite() {
            return;
        }
        if let Some(pending) = &mut self.pending {
            pending.points.push(point);
        }
    }

    /// Seal the gesture in progress.
    ///
    /// Gestures with fewer than two points are discarded and yield `None`.
    pub fn end_stroke(&mut self) -> Option<StrokeId> {
        let pending = self.pending.take()?;
        if pending.points.len() < 2 {
            log::debug!("Discarding stroke with {} point(s)", pending.points.len());
            return None;
        }

        let id = StrokeId(self.next_id);
        self.next_id += 1;

        let stroke = Stroke::new(id, pending.points, pending.color, pending.size);
        stroke.geometry(&self.options);
        self.strokes.push(stroke);
        self.revision += 1;
        Some(id)
    }

    /// Drop the gesture in progress without sealing it.
    pub fn cancel_stroke(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Remove the most recently sealed stroke.
    pub fn undo(&mut self) -> Option<Stroke> {
        let stroke = self.strokes.pop()?;
        if stroke.id().0 + 1 == self.next_id {
            self.next_id = stroke.id().0;
        }
        self.revision += 1;
        Some(stroke)
    }

    /// Remove every stroke, including the one in progress.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.pending = None;
        self.revision += 1;
    }

    /// Canonical copy of the sealed strokes, without cached geometry.
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.strokes.iter().map(Stroke::canonical).collect()
    }

    /// Replace the whole state with strokes received from elsewhere.
    ///
    /// Geometry is recomputed with this store's outline template.
    pub fn load_snapshot(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes.iter().map(Stroke::canonical).collect();
        self.pending = None;
        for stroke in &self.strokes {
            stroke.geometry(&self.options);
        }
        self.next_id = self
            .strokes
            .iter()
            .map(|s| s.id().0 + 1)
            .max()
            .unwrap_or(1);
        self.revision += 1;
    }

    /// Sealed strokes in paint order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// The gesture currently being drawn, if any.
    pub fn in_progress(&self) -> Option<&PendingStroke> {
        self.pending.as_ref()
    }

    /// Path data for the gesture in progress.
    pub fn in_progress_path(&self) -> Option<String> {
        self.pending
            .as_ref()
            .map(|pending| pending.preview_path(&self.options))
    }

    /// Memoized path data of every sealed stroke, in paint order.
    pub fn render_paths(&self) -> impl Iterator<Item = (&Stroke, Cow<'_, str>)> {
        self.strokes
            .iter()
            .map(|stroke| (stroke, stroke.render_path(&self.options)))
    }

    /// Number of sealed strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Whether there are no sealed strokes.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Incremented on every change to the sealed strokes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Id the next sealed stroke will receive.
    pub fn next_id(&self) -> StrokeId {
        StrokeId(self.next_id)
    }

    /// Padded bounds of the sealed strokes.
    pub fn bounds(&self) -> Option<Rect> {
        bounds::bounds(&self.strokes)
    }
}
