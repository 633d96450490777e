//! Document-space geometry: rectangles, snapping, resize handles and grid lines.
//!
//! Document coordinates are points at 72 per inch. Canvas (pointer) coordinates
//! are pixels, which are document points scaled by the zoom factor.

use anyhow::bail;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const POINTS_PER_INCH: f32 = 72.0;

/// Smallest width/height a field can be resized to.
pub const MIN_FIELD_SIZE: f32 = 20.0;

/// Side length of a resize handle in canvas pixels.
pub const HANDLE_SIZE: f32 = 8.0;

/// Finest usable grid, in points.
pub const MIN_GRID_SIZE: f32 = 1.0;

/// Upper bound on grid lines per axis.
pub const MAX_GRID_LINES: usize = 10_000;

pub fn inches_to_points(inches: f32) -> f32 {
    inches * POINTS_PER_INCH
}

/// Round `value` to the nearest multiple of `grid_size`.
/// Identity when snapping is off or the grid is degenerate. Grids finer than
/// [`MIN_GRID_SIZE`] snap as if they were [`MIN_GRID_SIZE`].
pub fn snap(value: f32, grid_size: f32, enabled: bool) -> f32 {
    if !enabled || grid_size <= 0.0 || !grid_size.is_finite() {
        return value;
    }
    let grid_size = grid_size.max(MIN_GRID_SIZE);
    (value / grid_size).round() * grid_size
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Same rectangle in canvas pixels.
    pub fn scaled(&self, zoom: f32) -> Rect {
        Rect::new(
            self.x * zoom,
            self.y * zoom,
            self.width * zoom,
            self.height * zoom,
        )
    }
}

/// One of the eight resize handles on a selected field's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Handle::N => "n",
            Handle::S => "s",
            Handle::E => "e",
            Handle::W => "w",
            Handle::NE => "ne",
            Handle::NW => "nw",
            Handle::SE => "se",
            Handle::SW => "sw",
        }
    }

    pub fn north(self) -> bool {
        matches!(self, Handle::N | Handle::NE | Handle::NW)
    }

    pub fn south(self) -> bool {
        matches!(self, Handle::S | Handle::SE | Handle::SW)
    }

    pub fn east(self) -> bool {
        matches!(self, Handle::E | Handle::NE | Handle::SE)
    }

    pub fn west(self) -> bool {
        matches!(self, Handle::W | Handle::NW | Handle::SW)
    }

    /// Center of this handle on `rect`.
    pub fn position(self, rect: &Rect) -> Vec2 {
        let x = if self.west() {
            rect.x
        } else if self.east() {
            rect.right()
        } else {
            rect.x + rect.width / 2.0
        };
        let y = if self.north() {
            rect.y
        } else if self.south() {
            rect.bottom()
        } else {
            rect.y + rect.height / 2.0
        };
        Vec2::new(x, y)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let h = match s.to_ascii_lowercase().as_str() {
            "n" => Handle::N,
            "s" => Handle::S,
            "e" => Handle::E,
            "w" => Handle::W,
            "ne" => Handle::NE,
            "nw" => Handle::NW,
            "se" => Handle::SE,
            "sw" => Handle::SW,
            other => bail!("unknown resize handle '{other}' (expected n|s|e|w|ne|nw|se|sw)"),
        };
        Ok(h)
    }
}

/// Handle under `p` for a field drawn at `rect_px` (both in canvas pixels).
/// Corners win over edges when they overlap on tiny fields.
pub fn handle_at(rect_px: &Rect, p: Vec2) -> Option<Handle> {
    let half = HANDLE_SIZE / 2.0;
    Handle::ALL
        .iter()
        .copied()
        .filter(|h| {
            let c = h.position(rect_px);
            (p.x - c.x).abs() <= half && (p.y - c.y).abs() <= half
        })
        .min_by_key(|h| match h {
            Handle::NE | Handle::NW | Handle::SE | Handle::SW => 0,
            _ => 1,
        })
}

/// Grid line offsets (document points) for a section of the given size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLines {
    pub vertical: Vec<f32>,
    pub horizontal: Vec<f32>,
}

pub fn grid_lines(width: f32, height: f32, grid_size: f32) -> GridLines {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return GridLines::default();
    }

    let grid_size = grid_size.max(MIN_GRID_SIZE);

    let steps = |extent: f32| {
        if !extent.is_finite() || extent < 0.0 {
            return Vec::new();
        }
        let n = ((extent / grid_size).floor() as usize).min(MAX_GRID_LINES);
        (0..=n).map(|i| i as f32 * grid_size).collect::<Vec<_>>()
    };

    GridLines {
        vertical: steps(width),
        horizontal: steps(height),
    }
}
