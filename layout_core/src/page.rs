//! Page-level editor state: the template being edited, one selection set and
//! one canvas controller per section.

use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::Template;
use crate::catalog::{self, FieldDefinition};
use crate::controller::{CanvasController, CanvasHost, CanvasSettings, SelectionMode};
use crate::field::{PlacedField, PositionPatch};
use crate::geometry::Rect;
use crate::properties::PropertiesHost;

static NO_SELECTION: BTreeSet<String> = BTreeSet::new();

#[derive(Debug)]
pub struct LayoutPage {
    pub template: Template,
    pub active_section: Option<String>,
    mode: SelectionMode,
    selections: BTreeMap<String, BTreeSet<String>>,
    controllers: BTreeMap<String, CanvasController>,
}

impl LayoutPage {
    pub fn new(template: Template) -> Self {
        Self::with_mode(template, SelectionMode::Multi)
    }

    pub fn with_mode(template: Template, mode: SelectionMode) -> Self {
        let active_section = template.sections.first().map(|s| s.id.clone());
        Self {
            template,
            active_section,
            mode,
            selections: BTreeMap::new(),
            controllers: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn settings(&self) -> CanvasSettings {
        self.template.canvas
    }

    pub fn set_active_section(&mut self, section_id: &str) -> anyhow::Result<()> {
        if self.template.section(section_id).is_none() {
            anyhow::bail!("unknown section '{section_id}'");
        }
        self.active_section = Some(section_id.to_string());
        Ok(())
    }

    pub fn selection(&self, section_id: &str) -> &BTreeSet<String> {
        self.selections.get(section_id).unwrap_or(&NO_SELECTION)
    }

    /// The field the properties panel edits: only when exactly one is selected.
    pub fn selected_field(&self, section_id: &str) -> Option<&PlacedField> {
        let sel = self.selection(section_id);
        if sel.len() != 1 {
            return None;
        }
        let id = sel.iter().next()?;
        self.template.section(section_id)?.field(id)
    }

    /// Section-keyed select callback. Ids not present in the section are dropped,
    /// and other sections' selections are untouched. A single-select page keeps
    /// at most one id.
    pub fn on_section_select(&mut self, section_id: &str, ids: BTreeSet<String>) {
        let Some(section) = self.template.section(section_id) else {
            return;
        };
        let limit = match self.mode {
            SelectionMode::Single => 1,
            SelectionMode::Multi => usize::MAX,
        };
        let ids: BTreeSet<String> = ids
            .into_iter()
            .filter(|id| section.field(id).is_some())
            .take(limit)
            .collect();

        debug!(section = %section_id, selected = ids.len(), "section select");
        self.selections.insert(section_id.to_string(), ids);
    }

    /// Section-keyed update callback: merge `patch` into one field.
    pub fn on_section_update(
        &mut self,
        section_id: &str,
        field_id: &str,
        patch: &PositionPatch,
    ) -> bool {
        let Some(section) = self.template.section_mut(section_id) else {
            return false;
        };
        section.update_field(field_id, patch)
    }

    pub fn add_field(
        &mut self,
        section_id: &str,
        definition: &FieldDefinition,
    ) -> anyhow::Result<String> {
        let section = self
            .template
            .section_mut(section_id)
            .with_context(|| format!("unknown section '{section_id}'"))?;

        let field = catalog::add_field(definition);
        let id = field.id.clone();
        section.add_field(field)?;
        debug!(section = %section_id, field = %id, key = %definition.id, "field added");
        Ok(id)
    }

    pub fn remove_field(&mut self, section_id: &str, field_id: &str) -> Option<PlacedField> {
        let removed = self
            .template
            .section_mut(section_id)?
            .remove_field(field_id)?;
        if let Some(sel) = self.selections.get_mut(section_id) {
            sel.remove(field_id);
        }
        debug!(section = %section_id, field = %field_id, "field removed");
        Some(removed)
    }

    pub fn controller(&self, section_id: &str) -> Option<&CanvasController> {
        self.controllers.get(section_id)
    }

    /// Run `f` with the section's controller and a host view of the section.
    /// Returns None for unknown sections.
    pub fn with_canvas<R>(
        &mut self,
        section_id: &str,
        f: impl FnOnce(&mut CanvasController, &mut SectionCanvas<'_>, &CanvasSettings) -> R,
    ) -> Option<R> {
        self.template.section(section_id)?;

        let settings = self.template.canvas;
        let mode = self.mode;
        let mut controller = self
            .controllers
            .remove(section_id)
            .unwrap_or_else(|| CanvasController::new(mode));

        let out = {
            let mut canvas = SectionCanvas {
                page: &mut *self,
                section_id: section_id.to_string(),
            };
            f(&mut controller, &mut canvas, &settings)
        };

        self.controllers.insert(section_id.to_string(), controller);
        Some(out)
    }

    /// Host view of one section, for property edits outside a canvas gesture.
    pub fn section_canvas(&mut self, section_id: &str) -> Option<SectionCanvas<'_>> {
        self.template.section(section_id)?;
        Some(SectionCanvas {
            page: self,
            section_id: section_id.to_string(),
        })
    }
}

/// One section of a [`LayoutPage`] seen as a canvas host. Every callback is
/// routed through the page's section-keyed callbacks.
pub struct SectionCanvas<'a> {
    page: &'a mut LayoutPage,
    section_id: String,
}

impl SectionCanvas<'_> {
    pub fn section_id(&self) -> &str {
        &self.section_id
    }
}

impl CanvasHost for SectionCanvas<'_> {
    fn fields(&self) -> &[PlacedField] {
        self.page
            .template
            .section(&self.section_id)
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    fn selection(&self) -> &BTreeSet<String> {
        self.page.selection(&self.section_id)
    }

    fn on_select(&mut self, selection: BTreeSet<String>) {
        self.page.on_section_select(&self.section_id, selection);
    }

    fn on_move(&mut self, field_id: &str, x: f32, y: f32) {
        self.page
            .on_section_update(&self.section_id, field_id, &PositionPatch::moved_to(x, y));
    }

    fn on_resize(&mut self, field_id: &str, rect: Rect) {
        self.page
            .on_section_update(&self.section_id, field_id, &PositionPatch::from_rect(rect));
    }

    fn on_delete(&mut self, field_id: &str) {
        self.page.remove_field(&self.section_id, field_id);
    }
}

impl PropertiesHost for SectionCanvas<'_> {
    fn on_field_update(&mut self, field_id: &str, patch: PositionPatch) {
        self.page.on_section_update(&self.section_id, field_id, &patch);
    }

    fn on_field_delete(&mut self, field_id: &str) {
        self.page.remove_field(&self.section_id, field_id);
    }
}
