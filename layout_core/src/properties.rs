//! Properties panel model: which controls a selected field exposes, and how raw
//! control input becomes a merge patch.

use anyhow::bail;
use std::str::FromStr;

use crate::catalog::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, FONT_FAMILIES};
use crate::field::{Alignment, ElementKind, LineStyle, PlacedField, PositionPatch};

pub const PLACEHOLDER: &str = "Select a field on the canvas to edit its properties.";

/// Receives panel edits. Updates are merge patches, never full replacements.
pub trait PropertiesHost {
    fn on_field_update(&mut self, field_id: &str, patch: PositionPatch);
    fn on_field_delete(&mut self, field_id: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    X,
    Y,
    Width,
    Height,
    FontSize,
    FontFamily,
    Alignment,
    Underline,
    Border,
    BorderWidth,
    LineWidth,
    LineColor,
    LineStyle,
    TextContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f32),
    Text(String),
    Toggle(bool),
    Choice {
        selected: String,
        options: &'static [&'static str],
    },
}

impl PropertyValue {
    /// Value as the panel would show it in a text box.
    pub fn display(&self) -> String {
        match self {
            PropertyValue::Number(v) => format!("{v}"),
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Toggle(b) => b.to_string(),
            PropertyValue::Choice { selected, .. } => selected.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyControl {
    pub key: PropertyKey,
    pub label: &'static str,
    pub value: PropertyValue,
}

impl PropertyKey {
    pub fn label(self) -> &'static str {
        match self {
            PropertyKey::X => "X",
            PropertyKey::Y => "Y",
            PropertyKey::Width => "Width",
            PropertyKey::Height => "Height",
            PropertyKey::FontSize => "Font size",
            PropertyKey::FontFamily => "Font family",
            PropertyKey::Alignment => "Alignment",
            PropertyKey::Underline => "Underline",
            PropertyKey::Border => "Border",
            PropertyKey::BorderWidth => "Border width",
            PropertyKey::LineWidth => "Line width",
            PropertyKey::LineColor => "Line color",
            PropertyKey::LineStyle => "Line style",
            PropertyKey::TextContent => "Text",
        }
    }

    /// Current value of this property on `field`, with the panel's defaults
    /// for attributes the field has never set.
    pub fn value(self, field: &PlacedField) -> PropertyValue {
        let p = &field.position;
        match self {
            PropertyKey::X => PropertyValue::Number(p.x),
            PropertyKey::Y => PropertyValue::Number(p.y),
            PropertyKey::Width => PropertyValue::Number(p.width),
            PropertyKey::Height => PropertyValue::Number(p.height),
            PropertyKey::FontSize => {
                PropertyValue::Number(p.font_size.unwrap_or(DEFAULT_FONT_SIZE))
            }
            PropertyKey::FontFamily => PropertyValue::Choice {
                selected: p
                    .font_family
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
                options: FONT_FAMILIES,
            },
            PropertyKey::Alignment => PropertyValue::Choice {
                selected: p.alignment.unwrap_or_default().as_str().to_string(),
                options: Alignment::OPTIONS,
            },
            PropertyKey::Underline => PropertyValue::Toggle(p.underline.unwrap_or(false)),
            PropertyKey::Border => PropertyValue::Toggle(p.border.unwrap_or(false)),
            PropertyKey::BorderWidth => PropertyValue::Number(p.border_width.unwrap_or(1.0)),
            PropertyKey::LineWidth => PropertyValue::Number(p.line_width.unwrap_or(1.0)),
            PropertyKey::LineColor => PropertyValue::Text(
                p.line_color.clone().unwrap_or_else(|| "#000000".to_string()),
            ),
            PropertyKey::LineStyle => PropertyValue::Choice {
                selected: p.line_style.unwrap_or_default().as_str().to_string(),
                options: LineStyle::OPTIONS,
            },
            PropertyKey::TextContent => {
                PropertyValue::Text(p.text_content.clone().unwrap_or_default())
            }
        }
    }

    /// Turn raw control input into a patch for this one property.
    /// Unparseable input keeps the field's previous value.
    pub fn patch(self, field: &PlacedField, input: &str) -> PositionPatch {
        let mut patch = PositionPatch::default();
        let previous = self.value(field);

        let number = || match &previous {
            PropertyValue::Number(prev) => parse_number(input, *prev),
            _ => parse_number(input, 0.0),
        };
        let toggle = || match &previous {
            PropertyValue::Toggle(prev) => parse_toggle(input, *prev),
            _ => parse_toggle(input, false),
        };

        match self {
            PropertyKey::X => patch.x = Some(number()),
            PropertyKey::Y => patch.y = Some(number()),
            PropertyKey::Width => patch.width = Some(number()),
            PropertyKey::Height => patch.height = Some(number()),
            PropertyKey::FontSize => patch.font_size = Some(number()),
            PropertyKey::BorderWidth => patch.border_width = Some(number()),
            PropertyKey::LineWidth => patch.line_width = Some(number()),
            PropertyKey::Underline => patch.underline = Some(toggle()),
            PropertyKey::Border => patch.border = Some(toggle()),
            PropertyKey::FontFamily => {
                let family = input.trim();
                if !family.is_empty() {
                    patch.font_family = Some(family.to_string());
                }
            }
            PropertyKey::LineColor => {
                let color = input.trim();
                if !color.is_empty() {
                    patch.line_color = Some(color.to_string());
                }
            }
            PropertyKey::TextContent => patch.text_content = Some(input.to_string()),
            PropertyKey::Alignment => {
                patch.alignment = Some(
                    input
                        .parse()
                        .unwrap_or_else(|_| field.position.alignment.unwrap_or_default()),
                )
            }
            PropertyKey::LineStyle => {
                patch.line_style = Some(
                    input
                        .parse()
                        .unwrap_or_else(|_| field.position.line_style.unwrap_or_default()),
                )
            }
        }
        patch
    }
}

impl FromStr for PropertyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let key = match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "x" => PropertyKey::X,
            "y" => PropertyKey::Y,
            "width" | "w" => PropertyKey::Width,
            "height" | "h" => PropertyKey::Height,
            "fontsize" | "size" => PropertyKey::FontSize,
            "fontfamily" | "font" => PropertyKey::FontFamily,
            "alignment" | "align" => PropertyKey::Alignment,
            "underline" => PropertyKey::Underline,
            "border" => PropertyKey::Border,
            "borderwidth" => PropertyKey::BorderWidth,
            "linewidth" => PropertyKey::LineWidth,
            "linecolor" | "color" => PropertyKey::LineColor,
            "linestyle" | "style" => PropertyKey::LineStyle,
            "textcontent" | "text" => PropertyKey::TextContent,
            _ => bail!("unknown property '{s}'"),
        };
        Ok(key)
    }
}

fn parse_number(input: &str, fallback: f32) -> f32 {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

fn parse_toggle(input: &str, fallback: bool) -> bool {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        _ => fallback,
    }
}

/// Controls for `field`, in panel order.
pub fn controls(field: &PlacedField) -> Vec<PropertyControl> {
    use PropertyKey as K;

    let mut keys = vec![K::X, K::Y, K::Width, K::Height];
    match field.kind {
        ElementKind::Text | ElementKind::Micr => {
            keys.extend([K::FontSize, K::FontFamily, K::Alignment, K::Underline, K::Border]);
        }
        ElementKind::Static => {
            keys.extend([K::TextContent, K::FontSize, K::FontFamily, K::Alignment]);
        }
        ElementKind::Line => {
            keys.extend([K::LineWidth, K::LineColor, K::LineStyle]);
        }
        ElementKind::Box => {
            keys.extend([K::LineWidth, K::LineColor, K::LineStyle, K::BorderWidth]);
        }
    }

    keys.into_iter()
        .map(|key| PropertyControl {
            key,
            label: key.label(),
            value: key.value(field),
        })
        .collect()
}

/// Apply raw input for `key` to `field` through the host.
pub fn edit(host: &mut impl PropertiesHost, field: &PlacedField, key: PropertyKey, input: &str) {
    let patch = key.patch(field, input);
    if patch.is_empty() {
        return;
    }
    tracing::debug!(field = %field.id, ?key, "property edit");
    host.on_field_update(&field.id, patch);
}

/// The panel's delete button. Required fields stay.
pub fn delete(host: &mut impl PropertiesHost, field: &PlacedField) -> bool {
    if field.is_required {
        return false;
    }
    host.on_field_delete(&field.id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        updates: Vec<(String, PositionPatch)>,
        deletes: Vec<String>,
    }

    impl PropertiesHost for Recorder {
        fn on_field_update(&mut self, field_id: &str, patch: PositionPatch) {
            self.updates.push((field_id.to_string(), patch));
        }

        fn on_field_delete(&mut self, field_id: &str) {
            self.deletes.push(field_id.to_string());
        }
    }

    fn field(id: &str) -> PlacedField {
        default_catalog()
            .instantiate(id)
            .unwrap_or_else(|| panic!("{id} missing from catalog"))
    }

    #[test]
    fn numeric_input_falls_back_to_previous() {
        let f = field("payee_name");

        let patch = PropertyKey::Width.patch(&f, "abc");
        assert_eq!(patch.width, Some(f.position.width));

        let patch = PropertyKey::X.patch(&f, " 42.5 ");
        assert_eq!(patch, PositionPatch { x: Some(42.5), ..Default::default() });

        let patch = PropertyKey::FontSize.patch(&f, "inf");
        assert_eq!(patch.font_size, f.position.font_size);
    }

    #[test]
    fn edit_sends_merge_patch() {
        let f = field("memo");
        let mut host = Recorder::default();

        edit(&mut host, &f, PropertyKey::Underline, "on");
        edit(&mut host, &f, PropertyKey::Alignment, "right");

        assert_eq!(
            host.updates,
            vec![
                (f.id.clone(), PositionPatch { underline: Some(true), ..Default::default() }),
                (
                    f.id.clone(),
                    PositionPatch { alignment: Some(Alignment::Right), ..Default::default() }
                ),
            ]
        );
    }

    #[test]
    fn blank_font_family_sends_nothing() {
        let f = field("memo");
        let mut host = Recorder::default();

        edit(&mut host, &f, PropertyKey::FontFamily, "   ");
        assert!(host.updates.is_empty());
    }

    #[test]
    fn controls_depend_on_kind() {
        let keys = |f: &PlacedField| controls(f).into_iter().map(|c| c.key).collect::<Vec<_>>();

        let text = keys(&field("payee_name"));
        assert!(text.contains(&PropertyKey::Underline));
        assert!(!text.contains(&PropertyKey::LineWidth));

        let line = keys(&field("signature_line"));
        assert!(line.contains(&PropertyKey::LineStyle));
        assert!(!line.contains(&PropertyKey::FontSize));

        let label = keys(&field("static_text"));
        assert_eq!(label[4], PropertyKey::TextContent);

        assert_eq!(
            &text[..4],
            &[
                PropertyKey::X,
                PropertyKey::Y,
                PropertyKey::Width,
                PropertyKey::Height
            ]
        );
    }

    #[test]
    fn delete_respects_required() {
        let mut host = Recorder::default();
        assert!(!delete(&mut host, &field("micr_line")));
        let memo = field("memo");
        assert!(delete(&mut host, &memo));
        assert_eq!(host.deletes, vec![memo.id]);
    }

    #[test]
    fn property_names_parse() -> anyhow::Result<()> {
        assert_eq!("font-size".parse::<PropertyKey>()?, PropertyKey::FontSize);
        assert_eq!("line_color".parse::<PropertyKey>()?, PropertyKey::LineColor);
        assert!("colour".parse::<PropertyKey>().is_err());
        Ok(())
    }
}
