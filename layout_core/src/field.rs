use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::{MIN_FIELD_SIZE, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Text,
    Line,
    Box,
    Micr,
    Static,
}

impl ElementKind {
    /// Lines and boxes are drawn, not filled with text.
    pub fn is_visual(self) -> bool {
        matches!(self, ElementKind::Line | ElementKind::Box)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Currency,
    Date,
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const OPTIONS: &'static [&'static str] = &["left", "center", "right"];

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl FromStr for Alignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => anyhow::bail!("unknown alignment '{other}'"),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub const OPTIONS: &'static [&'static str] = &["solid", "dashed", "dotted"];

    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }
}

impl FromStr for LineStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            other => anyhow::bail!("unknown line style '{other}'"),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry (document points) and style of a placed field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl FieldPosition {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Merge: only overwrite attributes that are Some() in `patch`,
    /// then pull geometry back inside the valid range.
    pub fn apply_patch(&mut self, patch: &PositionPatch) {
        if let Some(v) = patch.x {
            self.x = v;
        }
        if let Some(v) = patch.y {
            self.y = v;
        }
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.font_size {
            self.font_size = Some(v);
        }
        if let Some(v) = &patch.font_family {
            self.font_family = Some(v.clone());
        }
        if let Some(v) = patch.alignment {
            self.alignment = Some(v);
        }
        if let Some(v) = patch.underline {
            self.underline = Some(v);
        }
        if let Some(v) = patch.border {
            self.border = Some(v);
        }
        if let Some(v) = patch.border_width {
            self.border_width = Some(v);
        }
        if let Some(v) = patch.line_width {
            self.line_width = Some(v);
        }
        if let Some(v) = &patch.line_color {
            self.line_color = Some(v.clone());
        }
        if let Some(v) = patch.line_style {
            self.line_style = Some(v);
        }
        if let Some(v) = &patch.text_content {
            self.text_content = Some(v.clone());
        }

        self.clamp_geometry();
    }

    fn clamp_geometry(&mut self) {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        self.x = finite_or(self.x, 0.0).max(0.0);
        self.y = finite_or(self.y, 0.0).max(0.0);
        self.width = finite_or(self.width, MIN_FIELD_SIZE).max(MIN_FIELD_SIZE);
        self.height = finite_or(self.height, MIN_FIELD_SIZE).max(MIN_FIELD_SIZE);
    }
}

/// Partial update of a [`FieldPosition`]. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub alignment: Option<Alignment>,
    pub underline: Option<bool>,
    pub border: Option<bool>,
    pub border_width: Option<f32>,
    pub line_width: Option<f32>,
    pub line_color: Option<String>,
    pub line_style: Option<LineStyle>,
    pub text_content: Option<String>,
}

impl PositionPatch {
    pub fn moved_to(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PositionPatch::default()
    }
}

/// A field instance on a section's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedField {
    pub id: String,
    pub field_key: String,
    pub label: String,

    #[serde(default)]
    pub kind: ElementKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,

    pub position: FieldPosition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub is_required: bool,
}

impl PlacedField {
    pub fn rect(&self) -> Rect {
        self.position.rect()
    }

    /// Text shown inside the field box: bound value, static text, or the label.
    pub fn display_text(&self) -> &str {
        if let Some(v) = &self.value {
            return v;
        }
        if self.kind == ElementKind::Static
            && let Some(t) = &self.position.text_content
        {
            return t;
        }
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn position() -> FieldPosition {
        FieldPosition {
            x: 100.0,
            y: 100.0,
            width: 100.0,
            height: 30.0,
            font_size: Some(12.0),
            alignment: Some(Alignment::Left),
            ..Default::default()
        }
    }

    #[test]
    fn patch_only_touches_some_fields() {
        let mut pos = position();
        pos.apply_patch(&PositionPatch {
            font_size: Some(14.0),
            underline: Some(true),
            ..Default::default()
        });

        let mut expected = position();
        expected.font_size = Some(14.0);
        expected.underline = Some(true);
        assert_eq!(pos, expected);
    }

    #[test]
    fn patch_keeps_geometry_valid() {
        let mut pos = position();
        pos.apply_patch(&PositionPatch {
            x: Some(-15.0),
            width: Some(3.0),
            height: Some(f32::NAN),
            ..Default::default()
        });

        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.width, MIN_FIELD_SIZE);
        assert_eq!(pos.height, MIN_FIELD_SIZE);
        assert_eq!(pos.y, 100.0);
    }

    #[test]
    fn empty_patch() {
        assert!(PositionPatch::default().is_empty());
        assert!(!PositionPatch::moved_to(1.0, 2.0).is_empty());
    }

    #[test]
    fn enums_parse_from_panel_strings() -> anyhow::Result<()> {
        assert_eq!("Center".parse::<Alignment>()?, Alignment::Center);
        assert_eq!("dotted".parse::<LineStyle>()?, LineStyle::Dotted);
        assert!("diagonal".parse::<LineStyle>().is_err());
        Ok(())
    }
}
