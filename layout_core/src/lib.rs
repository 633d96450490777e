use anyhow::Context;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub mod catalog;
pub mod controller;
pub mod field;
pub mod geometry;
pub mod page;
pub mod properties;

pub use catalog::{Catalog, FieldDefinition, add_field, default_catalog};
pub use controller::{CanvasController, CanvasHost, CanvasKey, CanvasSettings, SelectionMode};
pub use field::{
    Alignment, ElementKind, FieldFormat, FieldPosition, LineStyle, PlacedField, PositionPatch,
};
pub use geometry::{Handle, Rect};
pub use page::{LayoutPage, SectionCanvas};
pub use properties::{PropertiesHost, PropertyKey};

pub fn version() -> &'static str {
    "0.1.0"
}

/// A template is the document we save/load: sections with their placed
/// fields, plus the canvas settings used to edit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,

    #[serde(default)]
    pub canvas: CanvasSettings,

    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            canvas: CanvasSettings::default(),
            sections: Vec::new(),
        }
    }

    /// Standard voucher cheque: cheque body on top, one stub below, with the
    /// MICR line already placed on the body.
    pub fn cheque(name: impl Into<String>) -> Self {
        let mut template = Self::new(name);
        let mut body = Section::new("body", "Cheque", 8.5, 3.5);
        let mut stub = Section::new("stub", "Stub", 8.5, 3.5);

        let catalog = default_catalog();
        if let Some(mut micr) = catalog.instantiate("micr_line") {
            micr.position.x = 100.0;
            micr.position.y = 220.0;
            body.fields.push(micr);
        }
        if let Some(mut memo) = catalog.instantiate("memo") {
            memo.position.y = 40.0;
            stub.fields.push(memo);
        }

        template.sections.push(body);
        template.sections.push(stub);
        template
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn add_section(&mut self, section: Section) -> anyhow::Result<()> {
        if self.section(&section.id).is_some() {
            anyhow::bail!("Section '{}' already exists", section.id);
        }
        self.sections.push(section);
        Ok(())
    }

    /// Save the template to JSON.
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize template to json")?;
        fs::write(path.as_ref(), json).context("write template json file")?;
        Ok(())
    }

    /// Load the template from JSON.
    pub fn load_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref()).context("read template json file")?;
        let template = serde_json::from_str::<Template>(&text).context("parse template json")?;
        Ok(template)
    }
}

/// A bounded area of the document (cheque body, stub) with its own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub width_in: f32,
    pub height_in: f32,

    /// Drawing order: later fields sit on top.
    #[serde(default)]
    pub fields: Vec<PlacedField>,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        width_in: f32,
        height_in: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width_in,
            height_in,
            fields: Vec::new(),
        }
    }

    pub fn width_points(&self) -> f32 {
        geometry::inches_to_points(self.width_in)
    }

    pub fn height_points(&self) -> f32 {
        geometry::inches_to_points(self.height_in)
    }

    pub fn field(&self, id: &str) -> Option<&PlacedField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut PlacedField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    pub fn add_field(&mut self, field: PlacedField) -> anyhow::Result<()> {
        if self.field(&field.id).is_some() {
            anyhow::bail!("Field id {} already exists in section '{}'", field.id, self.id);
        }
        self.fields.push(field);
        Ok(())
    }

    /// Merge `patch` into a field. Returns false for unknown ids.
    pub fn update_field(&mut self, id: &str, patch: &PositionPatch) -> bool {
        match self.field_mut(id) {
            Some(f) => {
                f.position.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove_field(&mut self, id: &str) -> Option<PlacedField> {
        let idx = self.fields.iter().position(|f| f.id == id)?;
        Some(self.fields.remove(idx))
    }

    /// Topmost field containing `p` (document points).
    pub fn field_at(&self, p: Vec2) -> Option<&PlacedField> {
        self.fields.iter().rev().find(|f| f.rect().contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cheque_template_has_body_and_stub() {
        let t = Template::cheque("Test");
        let ids: Vec<&str> = t.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["body", "stub"]);

        let body = t.section("body").expect("body");
        assert_eq!(body.width_points(), 612.0);
        assert_eq!(body.height_points(), 252.0);
        assert!(body.fields.iter().any(|f| f.field_key == "micr_line" && f.is_required));
    }

    #[test]
    fn duplicate_ids_are_rejected() -> anyhow::Result<()> {
        let mut t = Template::cheque("Test");
        assert!(t.add_section(Section::new("body", "Again", 1.0, 1.0)).is_err());

        let section = t.section_mut("stub").expect("stub");
        let existing = section.fields[0].clone();
        assert!(section.add_field(existing).is_err());

        let fresh = default_catalog()
            .instantiate("memo")
            .context("memo missing")?;
        section.add_field(fresh)?;
        assert_eq!(section.fields.len(), 2);
        Ok(())
    }

    #[test]
    fn field_at_prefers_topmost() -> anyhow::Result<()> {
        let catalog = default_catalog();
        let mut s = Section::new("body", "Cheque", 8.5, 3.5);
        let a = catalog.instantiate("box").context("box")?;
        let b = catalog.instantiate("memo").context("memo")?;
        let b_id = b.id.clone();
        s.add_field(a)?;
        s.add_field(b)?;

        let hit = s.field_at(Vec2::new(30.0, 30.0)).map(|f| f.id.clone());
        assert_eq!(hit, Some(b_id));
        assert!(s.field_at(Vec2::new(500.0, 200.0)).is_none());
        Ok(())
    }

    #[test]
    fn json_round_trip_keeps_fields_and_settings() -> anyhow::Result<()> {
        let mut t = Template::cheque("Round Trip");
        t.canvas.grid_size = 5.0;
        t.canvas.snap_to_grid = false;

        let path = std::env::temp_dir().join(format!("layout-{}.json", uuid::Uuid::new_v4()));
        t.save_json_file(&path)?;
        let loaded = Template::load_json_file(&path)?;
        fs::remove_file(&path)?;

        assert_eq!(loaded.name, "Round Trip");
        assert_eq!(loaded.canvas, t.canvas);
        assert_eq!(loaded.sections[0].fields, t.sections[0].fields);
        Ok(())
    }

    #[test]
    fn older_files_without_canvas_settings_load() -> anyhow::Result<()> {
        let json = r#"{ "name": "Old", "sections": [
            { "id": "body", "name": "Cheque", "width_in": 8.5, "height_in": 3.5 }
        ] }"#;
        let t: Template = serde_json::from_str(json)?;
        assert_eq!(t.canvas, CanvasSettings::default());
        assert!(t.sections[0].fields.is_empty());
        Ok(())
    }
}
