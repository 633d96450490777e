use serde::{Deserialize, Serialize};

use crate::field::{Alignment, ElementKind, FieldFormat, FieldPosition, LineStyle, PlacedField};

/// Where a freshly added field lands before the user moves it.
pub const DEFAULT_PLACEMENT: (f32, f32) = (20.0, 20.0);

pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";
pub const MICR_FONT_FAMILY: &str = "MICR E-13B";
pub const FONT_FAMILIES: &[&str] = &["Helvetica", "Times", "Courier", MICR_FONT_FAMILY];

/// A placeable field type. Catalog entries are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    pub category: String,
    pub default_width: f32,
    pub default_height: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,

    /// Required fields can be placed but never deleted.
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: impl Into<String>,
        default_width: f32,
        default_height: f32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: category.into(),
            default_width,
            default_height,
            format: None,
            kind: None,
            required: false,
        }
    }

    pub fn format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn element_kind(&self) -> ElementKind {
        self.kind.unwrap_or_default()
    }
}

/// Instantiate `definition` as a new field with a fresh id at the default placement.
pub fn add_field(definition: &FieldDefinition) -> PlacedField {
    let kind = definition.element_kind();
    let (x, y) = DEFAULT_PLACEMENT;

    let mut position = FieldPosition {
        x,
        y,
        width: definition.default_width,
        height: definition.default_height,
        ..Default::default()
    };

    match kind {
        ElementKind::Text => {
            position.font_size = Some(DEFAULT_FONT_SIZE);
            position.font_family = Some(DEFAULT_FONT_FAMILY.to_string());
            position.alignment = Some(Alignment::Left);
        }
        ElementKind::Static => {
            position.font_size = Some(DEFAULT_FONT_SIZE);
            position.font_family = Some(DEFAULT_FONT_FAMILY.to_string());
            position.alignment = Some(Alignment::Left);
            position.text_content = Some(definition.label.clone());
        }
        ElementKind::Micr => {
            position.font_size = Some(DEFAULT_FONT_SIZE);
            position.font_family = Some(MICR_FONT_FAMILY.to_string());
            position.alignment = Some(Alignment::Left);
        }
        ElementKind::Line => {
            position.line_width = Some(1.0);
            position.line_color = Some("#000000".to_string());
            position.line_style = Some(LineStyle::Solid);
        }
        ElementKind::Box => {
            position.line_width = Some(1.0);
            position.line_color = Some("#000000".to_string());
            position.line_style = Some(LineStyle::Solid);
            position.border_width = Some(1.0);
        }
    }

    PlacedField {
        id: uuid::Uuid::new_v4().to_string(),
        field_key: definition.id.clone(),
        label: definition.label.clone(),
        kind,
        format: definition.format,
        position,
        value: None,
        is_required: definition.required,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<FieldDefinition>,
}

impl Catalog {
    pub fn new(definitions: Vec<FieldDefinition>) -> Self {
        Self { definitions }
    }

    pub fn get(&self, id: &str) -> Option<&FieldDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions grouped by category. Categories appear in the order their
    /// first entry was defined; entries keep their definition order.
    pub fn list_fields(&self) -> Vec<(&str, Vec<&FieldDefinition>)> {
        let mut groups: Vec<(&str, Vec<&FieldDefinition>)> = Vec::new();
        for def in &self.definitions {
            match groups.iter_mut().find(|(cat, _)| *cat == def.category) {
                Some((_, entries)) => entries.push(def),
                None => groups.push((def.category.as_str(), vec![def])),
            }
        }
        groups
    }

    /// Look up `id` and instantiate it.
    pub fn instantiate(&self, id: &str) -> Option<PlacedField> {
        self.get(id).map(add_field)
    }
}

/// Built-in cheque and invoice fields.
pub fn default_catalog() -> Catalog {
    Catalog::new(vec![
        FieldDefinition::new("payee_name", "Payee Name", "Payee", 260.0, 20.0)
            .format(FieldFormat::Text),
        FieldDefinition::new("payee_address", "Payee Address", "Payee", 200.0, 50.0)
            .format(FieldFormat::Text),
        FieldDefinition::new("amount_numeric", "Amount", "Amount", 100.0, 20.0)
            .format(FieldFormat::Currency),
        FieldDefinition::new("amount_words", "Amount in Words", "Amount", 380.0, 20.0)
            .format(FieldFormat::Text),
        FieldDefinition::new("cheque_date", "Date", "Cheque", 100.0, 20.0)
            .format(FieldFormat::Date),
        FieldDefinition::new("cheque_number", "Cheque Number", "Cheque", 80.0, 20.0)
            .format(FieldFormat::Number),
        FieldDefinition::new("memo", "Memo", "Cheque", 200.0, 20.0).format(FieldFormat::Text),
        FieldDefinition::new("company_name", "Company Name", "Company", 200.0, 20.0),
        FieldDefinition::new("company_address", "Company Address", "Company", 200.0, 50.0),
        FieldDefinition::new("bank_name", "Bank Name", "Bank", 160.0, 20.0),
        FieldDefinition::new("micr_line", "MICR Line", "Bank", 400.0, 20.0)
            .kind(ElementKind::Micr)
            .required(),
        FieldDefinition::new("invoice_number", "Invoice Number", "Line Items", 100.0, 20.0)
            .format(FieldFormat::Text),
        FieldDefinition::new("line_item_description", "Description", "Line Items", 220.0, 20.0)
            .format(FieldFormat::Text),
        FieldDefinition::new("line_item_amount", "Line Amount", "Line Items", 80.0, 20.0)
            .format(FieldFormat::Currency),
        FieldDefinition::new("signature_line", "Signature Line", "Visual", 180.0, 20.0)
            .kind(ElementKind::Line),
        FieldDefinition::new("horizontal_line", "Horizontal Line", "Visual", 200.0, 20.0)
            .kind(ElementKind::Line),
        FieldDefinition::new("box", "Box", "Visual", 120.0, 60.0).kind(ElementKind::Box),
        FieldDefinition::new("static_text", "Static Text", "Visual", 120.0, 20.0)
            .kind(ElementKind::Static),
    ])
}
