use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use layout_core::controller::CanvasKey;
use layout_core::geometry::{self, Handle};
use layout_core::properties::{self, PropertyKey};
use layout_core::{LayoutPage, SelectionMode, Template};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cheque and invoice template layout editor
#[derive(Parser, Debug)]
#[command(name = "layout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default two-section cheque template
    New {
        template: PathBuf,
        #[arg(long, default_value = "Cheque")]
        name: String,
    },
    /// List sections and fields of a template
    List { template: PathBuf },
    /// Show the field catalog grouped by category
    Catalog,
    /// Place a catalog field into a section and save
    Add {
        template: PathBuf,
        section: String,
        field: String,
    },
    /// Interactive editor driven by pointer commands
    Repl {
        template: PathBuf,
        /// Single-select canvas (modifier clicks do not build a selection)
        #[arg(long)]
        single: bool,
    },
}

fn print_template(template: &Template) {
    println!(
        "Template: {} | grid={} snap={} zoom={}",
        template.name,
        template.canvas.grid_size,
        template.canvas.snap_to_grid,
        template.canvas.zoom
    );
    for section in &template.sections {
        println!(
            "Section '{}' ({}) {}in x {}in, {} fields",
            section.id,
            section.name,
            section.width_in,
            section.height_in,
            section.fields.len()
        );
    }
}

fn print_catalog() {
    let catalog = layout_core::default_catalog();
    for (category, defs) in catalog.list_fields() {
        println!("{category}:");
        for d in defs {
            let required = if d.required { " (required)" } else { "" };
            println!(
                "  {:<22} | {:<16} | {}x{}{}",
                d.id, d.label, d.default_width, d.default_height, required
            );
        }
    }
}

/// Session state for the REPL. Pointer coordinates typed by the user are
/// canvas pixels, exactly as a mouse would report them.
struct Session {
    path: PathBuf,
    page: LayoutPage,
}

impl Session {
    fn section_id(&self) -> anyhow::Result<String> {
        self.page.active_section.clone().context("template has no sections")
    }

    /// Resolve a full field id or a unique prefix of one.
    fn resolve_field(&self, token: &str) -> anyhow::Result<String> {
        let section_id = self.section_id()?;
        let section = self
            .page
            .template
            .section(&section_id)
            .with_context(|| format!("unknown section '{section_id}'"))?;

        let matches: Vec<&str> = section
            .fields
            .iter()
            .filter(|f| f.id.starts_with(token))
            .map(|f| f.id.as_str())
            .collect();
        match matches.as_slice() {
            [id] => Ok(id.to_string()),
            [] => anyhow::bail!("no field '{token}' in section '{section_id}'"),
            _ => anyhow::bail!("field prefix '{token}' is ambiguous"),
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

    /// Resize handle of a selected field under the pointer.
    fn handle_at(&self, section_id: &str, pointer: Vec2) -> Option<(String, Handle)> {
        let zoom = self.page.settings().effective_zoom();
        let section = self.page.template.section(section_id)?;
        self.page.selection(section_id).iter().find_map(|id| {
            let rect = section.field(id)?.rect().scaled(zoom);
            geometry::handle_at(&rect, pointer).map(|h| (id.clone(), h))
        })
    }

    fn print_fields(&self) -> anyhow::Result<()> {
        let section_id = self.section_id()?;
        let Some(section) = self.page.template.section(&section_id) else {
            return Ok(());
        };
        let selection = self.page.selection(&section_id);

        if section.fields.is_empty() {
            println!("(no fields in '{section_id}')");
            return Ok(());
        }
        for f in &section.fields {
            let mark = if selection.contains(&f.id) { "*" } else { " " };
            let p = &f.position;
            println!(
                "{mark} {} | {:<18} | {:?} | x={} y={} w={} h={}",
                short_id(&f.id),
                f.label,
                f.kind,
                p.x,
                p.y,
                p.width,
                p.height
            );
        }
        Ok(())
    }

    fn print_properties(&self) -> anyhow::Result<()> {
        let section_id = self.section_id()?;
        let Some(field) = self.page.selected_field(&section_id) else {
            println!("{}", properties::PLACEHOLDER);
            return Ok(());
        };

        println!("{} ({})", field.label, field.field_key);
        for c in properties::controls(field) {
            println!("  {:<14} {}", c.label, c.value.display());
        }
        Ok(())
    }
}

/// Leading characters of a field id, for display.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn parse_point(x: &str, y: &str) -> anyhow::Result<Vec2> {
    let x: f32 = x.parse().with_context(|| format!("bad x '{x}'"))?;
    let y: f32 = y.parse().with_context(|| format!("bad y '{y}'"))?;
    Ok(Vec2::new(x, y))
}

fn has_ctrl(parts: &[&str], from: usize) -> bool {
    parts
        .get(from)
        .is_some_and(|m| m.eq_ignore_ascii_case("ctrl") || m.eq_ignore_ascii_case("cmd"))
}

const HELP: &str = r#"Commands:
    sections                 list sections
    section <id>             switch active section
    fields                   list fields (* = selected)
    catalog                  list placeable fields
    add <catalog_id>         place a field and select it
    down <x> <y> [ctrl]      pointer down (on a selected field's handle: resize)
    grab <handle> <x> <y>    begin resize of the selected field
    move <x> <y>             pointer move
    up                       pointer up
    leave                    pointer leaves the canvas
    click [<x> <y>]          click after pointer up
    select <id>|none [ctrl]  select without dragging
    delete [id]              delete a field (default: selected)
    key delete|backspace     keyboard delete
    props                    show properties of the selected field
    set <property> <value>   edit a property of the selected field
    grid <size>              grid size in points
    snap on|off              snap to grid
    zoom <factor>            canvas zoom
    save                     write the template file
    quit
"#;

fn handle_line(s: &mut Session, line: &str) -> anyhow::Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let cmd = parts[0].to_lowercase();

    match cmd.as_str() {
        "help" => println!("{HELP}"),
        "quit" | "exit" => return Ok(false),

        "sections" => {
            for section in &s.page.template.sections {
                let mark = if s.page.active_section.as_deref() == Some(section.id.as_str()) {
                    " <=="
                } else {
                    ""
                };
                println!(
                    "  {} | {} | {} fields{}",
                    section.id,
                    section.name,
                    section.fields.len(),
                    mark
                );
            }
        }

        "section" => {
            if parts.len() != 2 {
                println!("Usage: section <id>");
                return Ok(true);
            }
            s.page.set_active_section(parts[1])?;
            println!("Active section: {}", parts[1]);
        }

        "fields" => s.print_fields()?,
        "catalog" => print_catalog(),

        "add" => {
            if parts.len() != 2 {
                println!("Usage: add <catalog_id>");
                return Ok(true);
            }
            let catalog = layout_core::default_catalog();
            let def = catalog
                .get(parts[1])
                .with_context(|| format!("unknown catalog field '{}'", parts[1]))?;
            let section_id = s.section_id()?;
            let id = s.page.add_field(&section_id, def)?;
            s.page
                .on_section_select(&section_id, [id.clone()].into_iter().collect());
            println!("Added {} as {}", def.label, short_id(&id));
        }

        "down" => {
            if parts.len() < 3 {
                println!("Usage: down <x> <y> [ctrl]");
                return Ok(true);
            }
            let p = parse_point(parts[1], parts[2])?;
            let multi = has_ctrl(&parts, 3);
            let section_id = s.section_id()?;

            if !multi && let Some((id, handle)) = s.handle_at(&section_id, p) {
                s.page.with_canvas(&section_id, |c, canvas, _| {
                    c.begin_resize(&*canvas, &id, handle, p)
                });
                println!("Resizing {} from {handle}", short_id(&id));
                return Ok(true);
            }

            let target = s.target_at(&section_id, p);
            s.page.with_canvas(&section_id, |c, canvas, settings| {
                c.pointer_down(canvas, settings, target.as_deref(), p, multi)
            });
        }

        "grab" => {
            if parts.len() != 4 {
                println!("Usage: grab <handle> <x> <y>");
                return Ok(true);
            }
            let handle: Handle = parts[1].parse()?;
            let p = parse_point(parts[2], parts[3])?;
            let section_id = s.section_id()?;
            let Some(field) = s.page.selected_field(&section_id) else {
                println!("Select exactly one field first.");
                return Ok(true);
            };
            let id = field.id.clone();
            s.page
                .with_canvas(&section_id, |c, canvas, _| c.begin_resize(&*canvas, &id, handle, p));
        }

        "move" => {
            if parts.len() != 3 {
                println!("Usage: move <x> <y>");
                return Ok(true);
            }
            let p = parse_point(parts[1], parts[2])?;
            let section_id = s.section_id()?;
            s.page.with_canvas(&section_id, |c, canvas, settings| {
                c.pointer_move(canvas, settings, p)
            });
        }

        "up" | "leave" => {
            let section_id = s.section_id()?;
            s.page.with_canvas(&section_id, |c, _, _| {
                if cmd == "up" {
                    c.pointer_up()
                } else {
                    c.pointer_leave()
                }
            });
        }

        "click" => {
            let section_id = s.section_id()?;
            let target = if parts.len() == 3 {
                let p = parse_point(parts[1], parts[2])?;
                s.target_at(&section_id, p)
            } else {
                None
            };
            let handled = s
                .page
                .with_canvas(&section_id, |c, canvas, _| c.click(canvas, target.as_deref()))
                .unwrap_or(false);
            if !handled {
                println!("(click after drag ignored)");
            }
        }

        "select" => {
            if parts.len() < 2 {
                println!("Usage: select <id>|none [ctrl]");
                return Ok(true);
            }
            let target = if parts[1].eq_ignore_ascii_case("none") {
                None
            } else {
                Some(s.resolve_field(parts[1])?)
            };
            let multi = has_ctrl(&parts, 2);
            let section_id = s.section_id()?;
            s.page.with_canvas(&section_id, |c, canvas, _| {
                c.select(canvas, target.as_deref(), multi)
            });
        }

        "delete" => {
            let section_id = s.section_id()?;
            let id = match parts.get(1) {
                Some(token) => s.resolve_field(token)?,
                None => match s.page.selected_field(&section_id) {
                    Some(f) => f.id.clone(),
                    None => {
                        println!("Usage: delete <id>  (or select exactly one field)");
                        return Ok(true);
                    }
                },
            };
            let deleted = s
                .page
                .with_canvas(&section_id, |c, canvas, _| c.delete(canvas, &id))
                .unwrap_or(false);
            if deleted {
                println!("Deleted {}", short_id(&id));
            } else {
                println!("Field {} is required and was kept.", short_id(&id));
            }
        }

        "key" => {
            let key = match parts.get(1).map(|k| k.to_lowercase()).as_deref() {
                Some("delete") | Some("del") => CanvasKey::Delete,
                Some("backspace") => CanvasKey::Backspace,
                _ => CanvasKey::Other,
            };
            let section_id = s.section_id()?;
            let n = s
                .page
                .with_canvas(&section_id, |c, canvas, _| c.key_down(canvas, key))
                .unwrap_or(0);
            println!("Deleted {n} field(s)");
        }

        "props" => s.print_properties()?,

        "set" => {
            if parts.len() < 3 {
                println!("Usage: set <property> <value>");
                return Ok(true);
            }
            let key: PropertyKey = parts[1].parse()?;
            let input = parts[2..].join(" ");
            let section_id = s.section_id()?;
            let Some(field) = s.page.selected_field(&section_id).cloned() else {
                println!("{}", properties::PLACEHOLDER);
                return Ok(true);
            };
            if let Some(mut canvas) = s.page.section_canvas(&section_id) {
                properties::edit(&mut canvas, &field, key, &input);
            }
            s.print_properties()?;
        }

        "grid" => {
            if parts.len() != 2 {
                println!("Usage: grid <size>");
                return Ok(true);
            }
            let size: f32 = parts[1].parse().context("grid size must be a number")?;
            if !size.is_finite() || size < geometry::MIN_GRID_SIZE {
                anyhow::bail!("grid size must be at least {}", geometry::MIN_GRID_SIZE);
            }
            s.page.template.canvas.grid_size = size;
            println!("Grid size = {}", s.page.template.canvas.grid_size);
        }

        "snap" => {
            match parts.get(1).map(|v| v.to_lowercase()).as_deref() {
                Some("on") => s.page.template.canvas.snap_to_grid = true,
                Some("off") => s.page.template.canvas.snap_to_grid = false,
                _ => {
                    println!("Usage: snap on|off");
                    return Ok(true);
                }
            }
            println!("Snap to grid = {}", s.page.template.canvas.snap_to_grid);
        }

        "zoom" => {
            if parts.len() != 2 {
                println!("Usage: zoom <factor>");
                return Ok(true);
            }
            s.page.template.canvas.zoom = parts[1].parse().context("zoom must be a number")?;
            println!("Zoom = {}", s.page.settings().effective_zoom());
        }

        "save" => {
            s.page.template.save_json_file(&s.path)?;
            info!(path = %s.path.display(), "template saved");
            println!("Saved template: {}", s.path.display());
        }

        _ => println!("Unknown command. Type 'help'."),
    }

    Ok(true)
}

fn repl(path: &Path, single: bool) -> anyhow::Result<()> {
    let template = Template::load_json_file(path)
        .with_context(|| format!("load template file: {}", path.display()))?;
    let mode = if single {
        SelectionMode::Single
    } else {
        SelectionMode::Multi
    };

    let mut session = Session {
        path: path.to_path_buf(),
        page: LayoutPage::with_mode(template, mode),
    };

    println!("Loaded template: {}", session.page.template.name);
    println!("Type 'help' for commands. 'quit' to exit.");

    loop {
        let active = session.page.active_section.clone().unwrap_or_default();
        print!("{active}> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF (Ctrl+D)
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_line(&mut session, line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {e:#}"),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::New { template, name } => {
            let t = Template::cheque(name);
            t.save_json_file(&template)?;
            println!("Saved default template to: {}", template.display());
        }
        Commands::List { template } => {
            let t = Template::load_json_file(&template)?;
            print_template(&t);
            for section in &t.sections {
                for f in &section.fields {
                    let p = &f.position;
                    println!(
                        "  [{}] {:<18} {:<22} x={} y={} w={} h={}",
                        section.id, f.label, f.field_key, p.x, p.y, p.width, p.height
                    );
                }
            }
        }
        Commands::Catalog => print_catalog(),
        Commands::Add {
            template,
            section,
            field,
        } => {
            let mut page = LayoutPage::new(
                Template::load_json_file(&template)
                    .with_context(|| format!("failed to load template '{}'", template.display()))?,
            );
            let catalog = layout_core::default_catalog();
            let def = catalog
                .get(&field)
                .with_context(|| format!("unknown catalog field '{field}'"))?;
            let id = page.add_field(&section, def)?;
            page.template.save_json_file(&template)?;
            println!("Added {} ({id}) to '{section}' and saved", def.label);
        }
        Commands::Repl { template, single } => repl(&template, single)?,
    }

    Ok(())
}
