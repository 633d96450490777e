use anyhow::Context;
use eframe::egui;
use glam::Vec2;
use layout_core::controller::CanvasKey;
use layout_core::geometry::{self, HANDLE_SIZE, Handle, Rect};
use layout_core::properties::{self, PropertyKey, PropertyValue};
use layout_core::{Catalog, ElementKind, LayoutPage, PlacedField, Section, Template};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let template_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "template.json".to_string());

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Template Layout",
        options,
        Box::new(|_cc| Ok(Box::new(LayoutApp::new(template_path)?))),
    )
}

const GRID_COLOR: egui::Color32 = egui::Color32::from_gray(225);
const FIELD_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(70, 130, 230, 24);
const FIELD_STROKE: egui::Color32 = egui::Color32::from_rgb(110, 140, 190);
const SELECTED_STROKE: egui::Color32 = egui::Color32::from_rgb(30, 100, 230);
const REQUIRED_STROKE: egui::Color32 = egui::Color32::from_rgb(200, 90, 40);

struct LayoutApp {
    template_path: String,
    page: LayoutPage,
    catalog: Catalog,

    // UI state
    pressed_on_canvas: bool,
    last_error: Option<String>,
    status: Option<String>,
}

impl LayoutApp {
    fn new(template_path: String) -> anyhow::Result<Self> {
        let template = if Path::new(&template_path).exists() {
            Template::load_json_file(&template_path)
                .with_context(|| format!("load template file: {template_path}"))?
        } else {
            info!(path = %template_path, "no template file, starting from default cheque");
            Template::cheque("Cheque")
        };

        Ok(Self {
            template_path,
            page: LayoutPage::new(template),
            catalog: layout_core::default_catalog(),
            pressed_on_canvas: false,
            last_error: None,
            status: None,
        })
    }

    fn active_section(&self) -> Option<String> {
        self.page.active_section.clone()
    }

    fn safe_save(&mut self) {
        match self.page.template.save_json_file(&self.template_path) {
            Ok(()) => {
                info!(path = %self.template_path, "template saved");
                self.status = Some(format!("Saved {}", self.template_path));
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(format!("{e:#}")),
        }
    }

    fn safe_add(&mut self, catalog_id: &str) {
        let Some(section_id) = self.active_section() else {
            return;
        };
        let Some(def) = self.catalog.get(catalog_id) else {
            return;
        };
        match self.page.add_field(&section_id, def) {
            Ok(id) => self
                .page
                .on_section_select(&section_id, BTreeSet::from([id])),
            Err(e) => self.last_error = Some(format!("{e:#}")),
        }
    }

    fn target_at(&self, section_id: &str, pointer: Vec2) -> Option<String> {
        let doc = self.page.settings().to_document(pointer);
        self.page
            .template
            .section(section_id)?
            .field_at(doc)
            .map(|f| f.id.clone())
    }

    fn handle_at(&self, section_id: &str, pointer: Vec2) -> Option<(String, Handle)> {
        let zoom = self.page.settings().effective_zoom();
        let section = self.page.template.section(section_id)?;
        self.page.selection(section_id).iter().find_map(|id| {
            let rect = section.field(id)?.rect().scaled(zoom);
            geometry::handle_at(&rect, pointer).map(|h| (id.clone(), h))
        })
    }

    fn press(&mut self, section_id: &str, pointer: Vec2, multi: bool) {
        if !multi && let Some((id, handle)) = self.handle_at(section_id, pointer) {
            self.page.with_canvas(section_id, |c, canvas, _| {
                c.begin_resize(&*canvas, &id, handle, pointer)
            });
            return;
        }

        let target = self.target_at(section_id, pointer);
        self.page.with_canvas(section_id, |c, canvas, settings| {
            c.pointer_down(canvas, settings, target.as_deref(), pointer, multi)
        });
    }

    fn delete_key(&mut self, key: CanvasKey) {
        let Some(section_id) = self.active_section() else {
            return;
        };
        let deleted = self
            .page
            .with_canvas(&section_id, |c, canvas, _| c.key_down(canvas, key))
            .unwrap_or(0);
        if deleted > 0 {
            self.status = Some(format!("Deleted {deleted} field(s)"));
        }
    }

    /// Feed this frame's pointer events for the canvas at `canvas_rect`.
    fn canvas_input(&mut self, ui: &egui::Ui, section_id: &str, canvas_rect: egui::Rect) {
        let (pressed, released, moving, pos, multi) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.interact_pos(),
                i.modifiers.command,
            )
        });
        let to_canvas = |p: egui::Pos2| {
            let local = p - canvas_rect.min;
            Vec2::new(local.x, local.y)
        };

        if pressed
            && let Some(p) = pos
            && canvas_rect.contains(p)
        {
            self.press(section_id, to_canvas(p), multi);
            self.pressed_on_canvas = true;
        }

        if !self.pressed_on_canvas {
            return;
        }

        if moving && let Some(p) = pos {
            if canvas_rect.contains(p) {
                self.page.with_canvas(section_id, |c, canvas, settings| {
                    c.pointer_move(canvas, settings, to_canvas(p))
                });
            } else {
                self.page
                    .with_canvas(section_id, |c, _, _| c.pointer_leave());
            }
        }

        if released {
            self.pressed_on_canvas = false;
            self.page.with_canvas(section_id, |c, _, _| c.pointer_up());

            // Released outside the canvas: no click.
            if let Some(p) = pos
                && canvas_rect.contains(p)
            {
                let target = self.target_at(section_id, to_canvas(p));
                self.page
                    .with_canvas(section_id, |c, canvas, _| c.click(canvas, target.as_deref()));
            }
        }
    }

    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");
        ui.separator();

        let Some(section_id) = self.active_section() else {
            return;
        };
        let Some(field) = self.page.selected_field(&section_id).cloned() else {
            ui.label(properties::PLACEHOLDER);
            return;
        };

        ui.strong(&field.label);
        ui.label(format!("{} ({:?})", field.field_key, field.kind));
        ui.add_space(6.0);

        let mut edits: Vec<(PropertyKey, String)> = Vec::new();
        egui::Grid::new("properties_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for control in properties::controls(&field) {
                    ui.label(control.label);
                    match control.value {
                        PropertyValue::Number(mut v) => {
                            if ui.add(egui::DragValue::new(&mut v).speed(1.0)).changed() {
                                edits.push((control.key, v.to_string()));
                            }
                        }
                        PropertyValue::Text(mut s) => {
                            if ui.text_edit_singleline(&mut s).changed() {
                                edits.push((control.key, s));
                            }
                        }
                        PropertyValue::Toggle(mut b) => {
                            if ui.checkbox(&mut b, "").changed() {
                                edits.push((control.key, b.to_string()));
                            }
                        }
                        PropertyValue::Choice { selected, options } => {
                            egui::ComboBox::from_id_salt(("property", control.label))
                                .selected_text(&selected)
                                .show_ui(ui, |ui| {
                                    for option in options {
                                        let on = selected == *option;
                                        if ui.selectable_label(on, *option).clicked() && !on {
                                            edits.push((control.key, option.to_string()));
                                        }
                                    }
                                });
                        }
                    }
                    ui.end_row();
                }
            });

        if let Some(mut canvas) = self.page.section_canvas(&section_id) {
            for (key, input) in &edits {
                // Each edit patches against the field as it was this frame.
                properties::edit(&mut canvas, &field, *key, input);
            }
        }

        ui.add_space(10.0);
        let delete = ui.add_enabled(!field.is_required, egui::Button::new("Delete field"));
        if field.is_required {
            ui.small("Required fields cannot be deleted.");
        }
        if delete.clicked()
            && let Some(mut canvas) = self.page.section_canvas(&section_id)
            && !properties::delete(&mut canvas, &field)
        {
            warn!(field = %field.id, "required field kept");
        }
    }

    fn catalog_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Fields");
        ui.separator();

        let mut add: Option<String> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (category, defs) in self.catalog.list_fields() {
                egui::CollapsingHeader::new(category)
                    .default_open(true)
                    .show(ui, |ui| {
                        for d in defs {
                            if ui.button(&d.label).on_hover_text(&d.id).clicked() {
                                add = Some(d.id.clone());
                            }
                        }
                    });
            }
        });

        if let Some(id) = add {
            self.safe_add(&id);
        }
    }
}

fn to_screen(origin: egui::Pos2, r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(r.x, r.y),
        egui::vec2(r.width, r.height),
    )
}

fn paint_field(painter: &egui::Painter, rect: egui::Rect, field: &PlacedField, zoom: f32) {
    let p = &field.position;
    match field.kind {
        ElementKind::Line => {
            let w = p.line_width.unwrap_or(1.0) * zoom;
            let y = rect.center().y;
            painter.line_segment(
                [egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)],
                egui::Stroke::new(w.max(1.0), egui::Color32::BLACK),
            );
        }
        ElementKind::Box => {
            let w = p.line_width.unwrap_or(1.0) * zoom;
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(w.max(1.0), egui::Color32::BLACK));
        }
        ElementKind::Text | ElementKind::Micr | ElementKind::Static => {
            painter.rect_filled(rect, 2.0, FIELD_FILL);
            let stroke = if field.is_required {
                REQUIRED_STROKE
            } else {
                FIELD_STROKE
            };
            painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, stroke));

            let size = (p.font_size.unwrap_or(12.0) * zoom).max(6.0);
            painter.text(
                rect.left_center() + egui::vec2(4.0, 0.0),
                egui::Align2::LEFT_CENTER,
                field.display_text(),
                egui::FontId::proportional(size),
                egui::Color32::DARK_GRAY,
            );
        }
    }
}

fn paint_section(
    painter: &egui::Painter,
    origin: egui::Pos2,
    section: &Section,
    selection: &BTreeSet<String>,
    page: &LayoutPage,
) {
    let settings = page.settings();
    let zoom = settings.effective_zoom();
    let bounds = egui::Rect::from_min_size(
        origin,
        egui::vec2(section.width_points() * zoom, section.height_points() * zoom),
    );
    painter.rect_filled(bounds, 0.0, egui::Color32::WHITE);

    if settings.show_grid {
        let lines = geometry::grid_lines(
            section.width_points(),
            section.height_points(),
            settings.effective_grid(),
        );
        let stroke = egui::Stroke::new(1.0, GRID_COLOR);
        for x in lines.vertical {
            let x = origin.x + x * zoom;
            let line = [egui::pos2(x, bounds.top()), egui::pos2(x, bounds.bottom())];
            painter.line_segment(line, stroke);
        }
        for y in lines.horizontal {
            let y = origin.y + y * zoom;
            let line = [egui::pos2(bounds.left(), y), egui::pos2(bounds.right(), y)];
            painter.line_segment(line, stroke);
        }
    }

    for field in &section.fields {
        let r = field.rect().scaled(zoom);
        let rect = to_screen(origin, r);
        paint_field(painter, rect, field, zoom);

        if selection.contains(&field.id) {
            painter.rect_stroke(rect.expand(1.0), 0.0, egui::Stroke::new(2.0, SELECTED_STROKE));
            for handle in Handle::ALL {
                let c = handle.position(&r);
                let square = egui::Rect::from_center_size(
                    origin + egui::vec2(c.x, c.y),
                    egui::vec2(HANDLE_SIZE, HANDLE_SIZE),
                );
                painter.rect_filled(square, 0.0, egui::Color32::WHITE);
                painter.rect_stroke(square, 0.0, egui::Stroke::new(1.0, SELECTED_STROKE));
            }
        }
    }

    painter.rect_stroke(bounds, 0.0, egui::Stroke::new(1.0, egui::Color32::GRAY));
}

impl eframe::App for LayoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Delete/Backspace only when no text box has focus
        if ctx.memory(|m| m.focused().is_none()) {
            let key = ctx.input(|i| {
                if i.key_pressed(egui::Key::Delete) {
                    Some(CanvasKey::Delete)
                } else if i.key_pressed(egui::Key::Backspace) {
                    Some(CanvasKey::Backspace)
                } else {
                    None
                }
            });
            if let Some(key) = key {
                self.delete_key(key);
            }
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&self.page.template.name);
                ui.separator();
                ui.label(format!("File: {}", self.template_path));
                if ui.button("Save").clicked() {
                    self.safe_save();
                }
            });

            ui.horizontal(|ui| {
                // section tabs
                let sections: Vec<(String, String)> = self
                    .page
                    .template
                    .sections
                    .iter()
                    .map(|s| (s.id.clone(), s.name.clone()))
                    .collect();
                for (id, name) in sections {
                    let active = self.page.active_section.as_deref() == Some(id.as_str());
                    if ui.selectable_label(active, name).clicked()
                        && let Err(e) = self.page.set_active_section(&id)
                    {
                        self.last_error = Some(format!("{e:#}"));
                    }
                }

                ui.separator();

                let canvas = &mut self.page.template.canvas;
                ui.checkbox(&mut canvas.show_grid, "Grid");
                ui.checkbox(&mut canvas.snap_to_grid, "Snap");
                ui.label("Size:");
                ui.add(egui::DragValue::new(&mut canvas.grid_size).range(1.0..=100.0));
                ui.label("Zoom:");
                ui.add(egui::Slider::new(&mut canvas.zoom, 0.25..=4.0).logarithmic(true));
            });

            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("Error: {err}"));
            } else if let Some(status) = &self.status {
                ui.label(status);
            }
        });

        egui::SidePanel::left("catalog")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| self.catalog_panel(ui));

        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| self.properties_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(section_id) = self.active_section() else {
                ui.label("(template has no sections)");
                return;
            };

            egui::ScrollArea::both().show(ui, |ui| {
                let zoom = self.page.settings().effective_zoom();
                let Some(size) = self
                    .page
                    .template
                    .section(&section_id)
                    .map(|s| egui::vec2(s.width_points() * zoom, s.height_points() * zoom))
                else {
                    return;
                };

                let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
                self.canvas_input(ui, &section_id, response.rect);

                if let Some(section) = self.page.template.section(&section_id) {
                    let selection = self.page.selection(&section_id);
                    paint_section(&painter, response.rect.min, section, selection, &self.page);
                }
            });
        });
    }
}
