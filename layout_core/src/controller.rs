//! Pointer-driven select, drag and resize for one section's canvas.
//!
//! The controller never owns fields or the selection. It reads both through
//! [`CanvasHost`] and reports every change back through the same trait, so the
//! host decides what actually happens to its data.
//!
//! Pointer positions are canvas pixels. Document positions are pixels divided
//! by the zoom factor.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::field::PlacedField;
use crate::geometry::{self, Handle, MIN_FIELD_SIZE, Rect};

/// Pointer travel (pixels, either axis) that turns a click into a drag.
pub const CLICK_DRAG_THRESHOLD: f32 = 5.0;

pub const MIN_ZOOM: f32 = 0.1;

/// Callbacks a canvas host implements. Every method has a fixed signature;
/// the controller calls nothing else.
pub trait CanvasHost {
    fn fields(&self) -> &[PlacedField];
    fn selection(&self) -> &BTreeSet<String>;

    fn on_select(&mut self, selection: BTreeSet<String>);
    fn on_move(&mut self, field_id: &str, x: f32, y: f32);
    fn on_resize(&mut self, field_id: &str, rect: Rect);
    fn on_delete(&mut self, field_id: &str);

    fn field(&self, field_id: &str) -> Option<&PlacedField> {
        self.fields().iter().find(|f| f.id == field_id)
    }
}

fn default_grid_size() -> f32 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_zoom() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    #[serde(default = "default_grid_size")]
    pub grid_size: f32,

    #[serde(default = "default_true")]
    pub snap_to_grid: bool,

    #[serde(default = "default_true")]
    pub show_grid: bool,

    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            snap_to_grid: true,
            show_grid: true,
            zoom: default_zoom(),
        }
    }
}

impl CanvasSettings {
    /// Grid size usable for snapping and drawing: at least
    /// [`MIN_GRID_SIZE`](geometry::MIN_GRID_SIZE), the default for
    /// non-positive or non-finite values.
    pub fn effective_grid(&self) -> f32 {
        if self.grid_size.is_finite() && self.grid_size > 0.0 {
            self.grid_size.max(geometry::MIN_GRID_SIZE)
        } else {
            default_grid_size()
        }
    }

    pub fn snap(&self, value: f32) -> f32 {
        geometry::snap(value, self.effective_grid(), self.snap_to_grid)
    }

    /// Zoom factor usable as a divisor.
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom.max(MIN_ZOOM)
        } else {
            1.0
        }
    }

    pub fn to_document(&self, pointer: Vec2) -> Vec2 {
        pointer / self.effective_zoom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// At most one selected field; the multi-select modifier is ignored.
    #[default]
    Single,
    /// Ctrl/Cmd toggles membership in a selection set.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasKey {
    Delete,
    Backspace,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
enum Interaction {
    Idle,
    Dragging {
        field_id: String,
        /// Pointer minus field origin, in document points.
        anchor: Vec2,
    },
    Resizing {
        field_id: String,
        handle: Handle,
        start_pointer: Vec2,
        start: Rect,
    },
}

/// New origin for a dragged field: snapped, then clamped to the section's
/// top-left corner.
pub fn drag_origin(pointer_doc: Vec2, anchor: Vec2, settings: &CanvasSettings) -> Vec2 {
    let raw = pointer_doc - anchor;
    Vec2::new(
        settings.snap(raw.x).max(0.0),
        settings.snap(raw.y).max(0.0),
    )
}

/// Apply a resize `delta` (document points) on `handle` to `start`.
///
/// Sizes are snapped first, then floored at [`MIN_FIELD_SIZE`]. A west/north
/// handle keeps the opposite edge fixed; if that would push the origin below
/// zero the origin stops at zero and the size shrinks by the overflow.
pub fn resize_rect(start: Rect, handle: Handle, delta: Vec2, settings: &CanvasSettings) -> Rect {
    let (x, width) = resize_axis(
        start.x,
        start.width,
        delta.x,
        handle.east(),
        handle.west(),
        settings,
    );
    let (y, height) = resize_axis(
        start.y,
        start.height,
        delta.y,
        handle.south(),
        handle.north(),
        settings,
    );
    Rect::new(x, y, width, height)
}

fn resize_axis(
    origin: f32,
    size: f32,
    delta: f32,
    far_edge: bool,
    near_edge: bool,
    settings: &CanvasSettings,
) -> (f32, f32) {
    if far_edge {
        let size = settings.snap(size + delta).max(MIN_FIELD_SIZE);
        (origin.max(0.0), size)
    } else if near_edge {
        let far = origin + size;
        let size = settings.snap(size - delta).max(MIN_FIELD_SIZE);
        let origin = far - size;
        if origin < 0.0 {
            (0.0, far.max(MIN_FIELD_SIZE))
        } else {
            (origin, size)
        }
    } else {
        (origin.max(0.0), size.max(MIN_FIELD_SIZE))
    }
}

/// Interaction state for one canvas: idle, dragging or resizing, plus the
/// click-vs-drag bookkeeping.
#[derive(Debug, Clone)]
pub struct CanvasController {
    pub mode: SelectionMode,
    interaction: Interaction,
    pointer_origin: Option<Vec2>,
    has_moved: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

impl CanvasController {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            interaction: Interaction::Idle,
            pointer_origin: None,
            has_moved: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.interaction == Interaction::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.interaction, Interaction::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.interaction, Interaction::Resizing { .. })
    }

    /// Field being dragged or resized.
    pub fn active_field(&self) -> Option<&str> {
        match &self.interaction {
            Interaction::Idle => None,
            Interaction::Dragging { field_id, .. } | Interaction::Resizing { field_id, .. } => {
                Some(field_id)
            }
        }
    }

    /// Whether the current (or last) gesture travelled past the click threshold.
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    fn multi(&self, modifier: bool) -> bool {
        modifier && self.mode == SelectionMode::Multi
    }

    /// Replace, toggle or clear the selection.
    pub fn select(&mut self, host: &mut impl CanvasHost, target: Option<&str>, multi: bool) {
        let multi = self.multi(multi);
        let next = match target {
            None => BTreeSet::new(),
            Some(id) if multi => {
                let mut set = host.selection().clone();
                if !set.remove(id) {
                    set.insert(id.to_string());
                }
                set
            }
            Some(id) => BTreeSet::from([id.to_string()]),
        };

        debug!(?target, multi, selected = next.len(), "select");
        host.on_select(next);
    }

    /// Pointer pressed on `target` (or on empty canvas). Selection is applied
    /// first; a drag starts only for a plain (non multi-select) press on a field.
    pub fn pointer_down(
        &mut self,
        host: &mut impl CanvasHost,
        settings: &CanvasSettings,
        target: Option<&str>,
        pointer: Vec2,
        multi: bool,
    ) {
        self.interaction = Interaction::Idle;
        self.pointer_origin = Some(pointer);
        self.has_moved = false;

        self.select(host, target, multi);

        if let Some(field_id) = target
            && !self.multi(multi)
        {
            self.begin_drag(&*host, settings, field_id, pointer);
        }
    }

    pub fn begin_drag(
        &mut self,
        host: &impl CanvasHost,
        settings: &CanvasSettings,
        field_id: &str,
        pointer: Vec2,
    ) {
        let Some(field) = host.field(field_id) else {
            trace!(field = %field_id, "drag on unknown field ignored");
            return;
        };

        let anchor = settings.to_document(pointer) - field.rect().origin();
        debug!(field = %field_id, ?anchor, "begin drag");
        self.interaction = Interaction::Dragging {
            field_id: field_id.to_string(),
            anchor,
        };
    }

    pub fn begin_resize(
        &mut self,
        host: &impl CanvasHost,
        field_id: &str,
        handle: Handle,
        pointer: Vec2,
    ) {
        let Some(field) = host.field(field_id) else {
            trace!(field = %field_id, "resize on unknown field ignored");
            return;
        };

        debug!(field = %field_id, %handle, "begin resize");
        self.pointer_origin = Some(pointer);
        self.has_moved = false;
        self.interaction = Interaction::Resizing {
            field_id: field_id.to_string(),
            handle,
            start_pointer: pointer,
            start: field.rect(),
        };
    }

    /// Every pointer-move: track click displacement, then continue any drag or resize.
    pub fn pointer_move(
        &mut self,
        host: &mut impl CanvasHost,
        settings: &CanvasSettings,
        pointer: Vec2,
    ) {
        if let Some(origin) = self.pointer_origin {
            let d = (pointer - origin).abs();
            if d.x > CLICK_DRAG_THRESHOLD || d.y > CLICK_DRAG_THRESHOLD {
                self.has_moved = true;
            }
        }

        match self.interaction {
            Interaction::Idle => {}
            Interaction::Dragging { .. } => self.drag(host, settings, pointer),
            Interaction::Resizing { .. } => self.resize(host, settings, pointer),
        }
    }

    pub fn drag(&mut self, host: &mut impl CanvasHost, settings: &CanvasSettings, pointer: Vec2) {
        let Interaction::Dragging { field_id, anchor } = &self.interaction else {
            return;
        };

        let to = drag_origin(settings.to_document(pointer), *anchor, settings);
        trace!(field = %field_id, x = to.x, y = to.y, "drag");
        host.on_move(field_id, to.x, to.y);
    }

    pub fn resize(&mut self, host: &mut impl CanvasHost, settings: &CanvasSettings, pointer: Vec2) {
        let Interaction::Resizing {
            field_id,
            handle,
            start_pointer,
            start,
        } = &self.interaction
        else {
            return;
        };

        let delta = (pointer - *start_pointer) / settings.effective_zoom();
        let rect = resize_rect(*start, *handle, delta, settings);
        trace!(field = %field_id, %handle, ?rect, "resize");
        host.on_resize(field_id, rect);
    }

    /// Drop any drag/resize. The click-suppression flag survives until the
    /// following click or pointer-down.
    pub fn end_interaction(&mut self) {
        if !self.is_idle() {
            debug!(field = ?self.active_field(), "end interaction");
        }
        self.interaction = Interaction::Idle;
        self.pointer_origin = None;
    }

    pub fn pointer_up(&mut self) {
        self.end_interaction();
    }

    /// Pointer left the canvas with a button held.
    pub fn pointer_leave(&mut self) {
        self.end_interaction();
    }

    /// Click delivered after pointer-up. A click on empty canvas clears the
    /// selection, unless the gesture was a drag. Returns false when the click
    /// was swallowed.
    pub fn click(&mut self, host: &mut impl CanvasHost, target: Option<&str>) -> bool {
        if std::mem::take(&mut self.has_moved) {
            debug!(?target, "click after drag suppressed");
            return false;
        }

        if target.is_none() && !host.selection().is_empty() {
            host.on_select(BTreeSet::new());
        }
        true
    }

    /// Delete `field_id` unless it is unknown or required. Returns whether the
    /// host was asked to delete it.
    pub fn delete(&mut self, host: &mut impl CanvasHost, field_id: &str) -> bool {
        let Some(field) = host.field(field_id) else {
            return false;
        };
        if field.is_required {
            debug!(field = %field_id, "required field kept");
            return false;
        }

        if self.active_field() == Some(field_id) {
            self.end_interaction();
        }

        debug!(field = %field_id, "delete");
        host.on_delete(field_id);

        if host.selection().contains(field_id) {
            let mut set = host.selection().clone();
            set.remove(field_id);
            host.on_select(set);
        }
        true
    }

    /// Delete/Backspace removes every deletable selected field.
    pub fn key_down(&mut self, host: &mut impl CanvasHost, key: CanvasKey) -> usize {
        if !matches!(key, CanvasKey::Delete | CanvasKey::Backspace) {
            return 0;
        }

        let ids: Vec<String> = host.selection().iter().cloned().collect();
        let mut deleted = 0;
        for id in &ids {
            if self.delete(host, id) {
                deleted += 1;
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldPosition, PositionPatch};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestCanvas {
        fields: Vec<PlacedField>,
        selection: BTreeSet<String>,
        select_calls: usize,
    }

    impl TestCanvas {
        fn with(fields: &[(&str, f32, f32, f32, f32)]) -> Self {
            let fields = fields
                .iter()
                .map(|&(id, x, y, width, height)| PlacedField {
                    id: id.to_string(),
                    field_key: "payee_name".to_string(),
                    label: id.to_uppercase(),
                    kind: Default::default(),
                    format: None,
                    position: FieldPosition {
                        x,
                        y,
                        width,
                        height,
                        ..Default::default()
                    },
                    value: None,
                    is_required: false,
                })
                .collect();
            Self {
                fields,
                ..Default::default()
            }
        }

        fn rect(&self, id: &str) -> Rect {
            self.field(id).map(|f| f.rect()).unwrap_or_default()
        }

        fn patch(&mut self, id: &str, patch: PositionPatch) {
            if let Some(f) = self.fields.iter_mut().find(|f| f.id == id) {
                f.position.apply_patch(&patch);
            }
        }
    }

    impl CanvasHost for TestCanvas {
        fn fields(&self) -> &[PlacedField] {
            &self.fields
        }

        fn selection(&self) -> &BTreeSet<String> {
            &self.selection
        }

        fn on_select(&mut self, selection: BTreeSet<String>) {
            self.select_calls += 1;
            self.selection = selection;
        }

        fn on_move(&mut self, field_id: &str, x: f32, y: f32) {
            self.patch(field_id, PositionPatch::moved_to(x, y));
        }

        fn on_resize(&mut self, field_id: &str, rect: Rect) {
            self.patch(field_id, PositionPatch::from_rect(rect));
        }

        fn on_delete(&mut self, field_id: &str) {
            self.fields.retain(|f| f.id != field_id);
        }
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    fn grid10() -> CanvasSettings {
        CanvasSettings::default()
    }

    #[test]
    fn se_resize_snaps_then_clamps() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = grid10();

        c.begin_resize(&host, "f1", Handle::SE, Vec2::new(200.0, 130.0));
        c.pointer_move(&mut host, &s, Vec2::new(223.0, 137.0));

        assert_eq!(host.rect("f1"), Rect::new(100.0, 100.0, 120.0, 40.0));
    }

    #[test]
    fn resize_does_not_change_selection() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);

        c.begin_resize(&host, "f1", Handle::E, Vec2::new(200.0, 115.0));
        c.pointer_move(&mut host, &grid10(), Vec2::new(240.0, 115.0));

        assert_eq!(host.select_calls, 0);
        assert_eq!(host.rect("f1").width, 140.0);
    }

    #[test]
    fn west_resize_moves_origin_by_width_change() {
        let s = grid10();
        let start = Rect::new(100.0, 100.0, 100.0, 30.0);

        for dx in [-30.0, -23.0, 17.0, 40.0] {
            let r = resize_rect(start, Handle::W, Vec2::new(dx, 0.0), &s);
            assert_eq!(r.width - start.width, -(r.x - start.x), "dx={dx}");
            assert_eq!(r.right(), start.right(), "dx={dx}");
            assert_eq!(r.x % 10.0, 0.0, "dx={dx}");
        }
    }

    #[test]
    fn north_resize_past_top_clamps_origin_and_size_together() {
        let start = Rect::new(40.0, 10.0, 100.0, 30.0);
        let r = resize_rect(start, Handle::N, Vec2::new(0.0, -50.0), &grid10());

        assert_eq!(r, Rect::new(40.0, 0.0, 100.0, 40.0));
    }

    #[test]
    fn nw_resize_past_corner() {
        let start = Rect::new(10.0, 10.0, 50.0, 50.0);
        let r = resize_rect(start, Handle::NW, Vec2::new(-500.0, -500.0), &grid10());

        assert_eq!(r, Rect::new(0.0, 0.0, 60.0, 60.0));
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let s = grid10();
        let start = Rect::new(100.0, 100.0, 100.0, 30.0);

        for handle in Handle::ALL {
            for delta in [
                Vec2::new(-500.0, -500.0),
                Vec2::new(500.0, 500.0),
                Vec2::new(-500.0, 500.0),
                Vec2::new(f32::NAN, 3.0),
            ] {
                let r = resize_rect(start, handle, delta, &s);
                assert!(r.width >= MIN_FIELD_SIZE, "{handle} {delta:?} -> {r:?}");
                assert!(r.height >= MIN_FIELD_SIZE, "{handle} {delta:?} -> {r:?}");
                assert!(r.x >= 0.0 && r.y >= 0.0, "{handle} {delta:?} -> {r:?}");
            }
        }
    }

    #[test]
    fn resize_delta_is_scaled_by_zoom() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = CanvasSettings {
            zoom: 2.0,
            ..grid10()
        };

        c.begin_resize(&host, "f1", Handle::SE, Vec2::new(400.0, 260.0));
        c.pointer_move(&mut host, &s, Vec2::new(440.0, 280.0));

        assert_eq!(host.rect("f1"), Rect::new(100.0, 100.0, 120.0, 40.0));
    }

    #[test]
    fn drag_snaps_and_never_goes_negative() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("f1"), Vec2::new(110.0, 105.0), false);
        assert!(c.is_dragging());

        c.pointer_move(&mut host, &s, Vec2::new(153.0, 127.0));
        assert_eq!(host.rect("f1").origin(), Vec2::new(140.0, 120.0));

        for p in [
            Vec2::new(5.0, 3.0),
            Vec2::new(-400.0, 50.0),
            Vec2::new(60.0, -1000.0),
        ] {
            c.pointer_move(&mut host, &s, p);
            let r = host.rect("f1");
            assert!(r.x >= 0.0 && r.y >= 0.0, "{p:?} -> {r:?}");
            assert_eq!(r.x % 10.0, 0.0);
            assert_eq!(r.y % 10.0, 0.0);
        }
    }

    #[test]
    fn drag_without_snap_follows_pointer() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = CanvasSettings {
            snap_to_grid: false,
            ..grid10()
        };

        c.pointer_down(&mut host, &s, Some("f1"), Vec2::new(110.0, 105.0), false);
        c.pointer_move(&mut host, &s, Vec2::new(113.5, 108.0));

        assert_eq!(host.rect("f1").origin(), Vec2::new(103.5, 103.0));
    }

    #[test]
    fn pointer_leave_ends_drag() {
        let mut host = TestCanvas::with(&[("f1", 100.0, 100.0, 100.0, 30.0)]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("f1"), Vec2::new(110.0, 105.0), false);
        c.pointer_leave();
        c.pointer_move(&mut host, &s, Vec2::new(300.0, 300.0));

        assert!(c.is_idle());
        assert_eq!(host.rect("f1").origin(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn ctrl_click_toggles_membership() {
        let mut host = TestCanvas::with(&[
            ("a", 0.0, 0.0, 50.0, 20.0),
            ("b", 100.0, 0.0, 50.0, 20.0),
        ]);
        let mut c = CanvasController::new(SelectionMode::Multi);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(10.0, 10.0), false);
        c.pointer_up();
        assert_eq!(ids(&host.selection), vec!["a"]);

        c.pointer_down(&mut host, &s, Some("b"), Vec2::new(110.0, 10.0), true);
        assert!(c.is_idle(), "multi-select must not start a drag");
        c.pointer_up();
        assert_eq!(ids(&host.selection), vec!["a", "b"]);

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(10.0, 10.0), true);
        c.pointer_up();
        assert_eq!(ids(&host.selection), vec!["b"]);
    }

    #[test]
    fn single_mode_ignores_modifier() {
        let mut host = TestCanvas::with(&[
            ("a", 0.0, 0.0, 50.0, 20.0),
            ("b", 100.0, 0.0, 50.0, 20.0),
        ]);
        let mut c = CanvasController::new(SelectionMode::Single);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(10.0, 10.0), false);
        c.pointer_up();
        c.pointer_down(&mut host, &s, Some("b"), Vec2::new(110.0, 10.0), true);

        assert_eq!(ids(&host.selection), vec!["b"]);
        assert!(c.is_dragging());
    }

    #[test]
    fn click_after_drag_keeps_selection() {
        let mut host = TestCanvas::with(&[("a", 100.0, 100.0, 50.0, 20.0)]);
        let mut c = CanvasController::new(SelectionMode::Multi);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(110.0, 110.0), false);
        c.pointer_move(&mut host, &s, Vec2::new(130.0, 112.0));
        c.pointer_up();
        let calls = host.select_calls;

        assert!(!c.click(&mut host, None));
        assert_eq!(ids(&host.selection), vec!["a"]);
        assert_eq!(host.select_calls, calls);
    }

    #[test]
    fn click_without_drag_on_background_clears() {
        let mut host = TestCanvas::with(&[("a", 100.0, 100.0, 50.0, 20.0)]);
        let mut c = CanvasController::new(SelectionMode::Multi);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(110.0, 110.0), false);
        c.pointer_move(&mut host, &s, Vec2::new(113.0, 112.0));
        c.pointer_up();
        assert!(!c.has_moved());
        assert!(c.click(&mut host, Some("a")));
        assert_eq!(ids(&host.selection), vec!["a"]);

        c.pointer_down(&mut host, &s, None, Vec2::new(400.0, 400.0), false);
        c.pointer_up();
        assert!(c.click(&mut host, None));
        assert!(host.selection.is_empty());
    }

    #[test]
    fn required_field_is_not_deleted() {
        let mut host = TestCanvas::with(&[
            ("micr", 0.0, 200.0, 400.0, 20.0),
            ("a", 0.0, 0.0, 50.0, 20.0),
        ]);
        host.fields[0].is_required = true;
        let mut c = CanvasController::new(SelectionMode::Single);

        assert!(!c.delete(&mut host, "micr"));
        assert!(!c.delete(&mut host, "missing"));
        assert_eq!(host.fields.len(), 2);

        assert!(c.delete(&mut host, "a"));
        assert_eq!(host.fields.len(), 1);
    }

    #[test]
    fn delete_key_removes_selected_fields() {
        let mut host = TestCanvas::with(&[
            ("a", 0.0, 0.0, 50.0, 20.0),
            ("b", 100.0, 0.0, 50.0, 20.0),
            ("c", 200.0, 0.0, 50.0, 20.0),
        ]);
        host.fields[1].is_required = true;
        host.selection = BTreeSet::from(["a".to_string(), "b".to_string()]);
        let mut c = CanvasController::new(SelectionMode::Multi);

        assert_eq!(c.key_down(&mut host, CanvasKey::Other), 0);
        assert_eq!(c.key_down(&mut host, CanvasKey::Backspace), 1);

        let left: Vec<&str> = host.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(left, vec!["b", "c"]);
        assert_eq!(ids(&host.selection), vec!["b"]);
    }

    #[test]
    fn settings_fall_back_on_bad_zoom() {
        let s = CanvasSettings {
            zoom: 0.0,
            ..Default::default()
        };
        assert_eq!(s.effective_zoom(), 1.0);

        let s = CanvasSettings {
            zoom: 0.01,
            ..Default::default()
        };
        assert_eq!(s.effective_zoom(), MIN_ZOOM);
    }

    #[test]
    fn settings_floor_tiny_grid() {
        let s = CanvasSettings {
            grid_size: 1e-30,
            ..Default::default()
        };
        assert_eq!(s.effective_grid(), geometry::MIN_GRID_SIZE);
        assert_eq!(s.snap(12.4), 12.0);

        let s = CanvasSettings {
            grid_size: f32::NAN,
            ..Default::default()
        };
        assert_eq!(s.effective_grid(), 10.0);
        assert_eq!(s.snap(14.0), 10.0);
    }

    #[test]
    fn exactly_five_pixels_is_still_a_click() {
        let mut host = TestCanvas::with(&[("a", 100.0, 100.0, 50.0, 20.0)]);
        let mut c = CanvasController::new(SelectionMode::Multi);
        let s = grid10();

        c.pointer_down(&mut host, &s, Some("a"), Vec2::new(110.0, 110.0), false);
        c.pointer_move(&mut host, &s, Vec2::new(115.0, 105.0));
        assert!(!c.has_moved());

        c.pointer_move(&mut host, &s, Vec2::new(110.0, 115.1));
        assert!(c.has_moved());
        c.pointer_up();
        assert!(!c.click(&mut host, None));
        assert_eq!(ids(&host.selection), vec!["a"]);
    }
}
