use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::backend::CategoryBackend;
use crate::io::config_io::{self, ConfigError};
use crate::io::http::HttpBackend;
use crate::io::memory::MemoryBackend;
use crate::model::category::{CategoryDraft, CategoryId};
use crate::model::config::Config;
use crate::ops::delete::{DeleteDialog, DeleteOutcome};
use crate::ops::editor::{CategoryEditor, EditorOutcome};
use crate::ops::flatten::flatten;
use crate::ops::parents::parent_options;
use crate::ops::search::filter_tree;
use crate::ops::session::CategorySession;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything resolved from flags, environment and the config file
pub struct Settings {
    pub config: Config,
    pub config_path: PathBuf,
    /// Whether `config_path` existed when it was read
    pub config_found: bool,
    pub demo: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let config_path = config_io::resolve_config_path(cli.config.as_deref());
        let config_found = config_path.is_file();
        let mut config = config_io::load_config(&config_path)?;
        config_io::apply_overrides(
            &mut config,
            std::env::var(config_io::API_URL_ENV).ok(),
            cli.api_url.as_deref(),
        );
        Ok(Settings {
            config,
            config_path,
            config_found,
            demo: cli.demo,
        })
    }

    /// Report where the settings came from. Call once logging is up.
    pub fn log_resolved(&self) {
        if self.config_found {
            tracing::debug!(path = %self.config_path.display(), "config loaded");
        } else {
            tracing::debug!(path = %self.config_path.display(), "no config file; using defaults");
        }
        tracing::debug!(url = %self.config.backend.url, demo = self.demo, "backend selected");
    }

    pub fn backend(&self) -> Box<dyn CategoryBackend> {
        if self.demo {
            tracing::info!("using the built-in demo catalog");
            Box::new(MemoryBackend::seeded())
        } else {
            Box::new(HttpBackend::new(
                &self.config.backend.url,
                self.config.backend.timeout(),
            ))
        }
    }

    fn open_session(&self, include_empty: Option<bool>) -> Result<CategorySession, Box<dyn std::error::Error>> {
        let include_empty = include_empty.unwrap_or(self.config.tree.include_empty);
        Ok(CategorySession::open(self.backend(), include_empty)?)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(command: Commands, json: bool, settings: &Settings) -> CmdResult {
    match command {
        // Read commands
        Commands::Tree(args) => cmd_tree(args, json, settings),
        Commands::Flat(args) => cmd_flat(args, json, settings),
        Commands::Find(args) => cmd_find(args, json, settings),
        Commands::Show(args) => cmd_show(args, json, settings),
        Commands::Parents(args) => cmd_parents(args, json, settings),

        // Write commands
        Commands::Add(args) => cmd_add(args, json, settings),
        Commands::Edit(args) => cmd_edit(args, json, settings),
        Commands::Rm(args) => cmd_rm(args, json, settings),

        // Config doesn't touch the backend
        Commands::Config(cmd) => cmd_config(cmd, json, settings),
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tree(args: TreeArgs, json: bool, settings: &Settings) -> CmdResult {
    let session = settings.open_session(args.include_empty())?;
    if json {
        return print_json(&forest_to_json(session.tree()));
    }
    print_lines(format_tree(session.tree()));
    Ok(())
}

fn cmd_flat(args: TreeArgs, json: bool, settings: &Settings) -> CmdResult {
    let session = settings.open_session(args.include_empty())?;
    let options = flatten(session.tree());
    if json {
        return print_json(&options);
    }
    print_lines(format_flat(&options));
    Ok(())
}

fn cmd_find(args: FindArgs, json: bool, settings: &Settings) -> CmdResult {
    let session = settings.open_session(None)?;
    let filtered = filter_tree(session.tree(), &args.query);
    tracing::debug!(query = %args.query, shown = filtered.len(), "filtered tree");
    if json {
        return print_json(&forest_to_json(&filtered));
    }
    if filtered.is_empty() {
        eprintln!("no categories match '{}'", args.query.trim());
        return Ok(());
    }
    print_lines(format_tree(&filtered));
    Ok(())
}

fn cmd_show(args: ShowArgs, json: bool, settings: &Settings) -> CmdResult {
    let session = settings.open_session(None)?;
    let tree = session.tree();
    let id = CategoryId::from(args.id.as_str());
    let idx = tree
        .index_of(&id)
        .ok_or_else(|| format!("category not found: {}", id))?;
    if json {
        return print_json(&category_to_json(tree, idx, false));
    }
    print_lines(format_category_detail(tree, idx));
    Ok(())
}

fn cmd_parents(args: ParentsArgs, json: bool, settings: &Settings) -> CmdResult {
    let session = settings.open_session(None)?;
    let editing = args.editing.as_deref().map(CategoryId::from);
    if let Some(id) = &editing
        && !session.tree().contains(id)
    {
        return Err(format!("category not found: {}", id).into());
    }
    let options = parent_options(session.tree(), editing.as_ref());
    if json {
        return print_json(&options);
    }
    print_lines(format_flat(&options));
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn save(mut editor: CategoryEditor, session: &mut CategorySession, json: bool, verb: &str) -> CmdResult {
    match editor.submit(session)? {
        EditorOutcome::Saved(node) => {
            let tree = session.tree();
            match tree.index_of(&node.id) {
                Some(idx) if json => print_json(&category_to_json(tree, idx, false))?,
                Some(idx) => println!("{} {}", verb, format_category_line(tree, idx)),
                // hidden by include_empty, or the reload failed
                None if json => print_json(&node)?,
                None => println!("{} {} [{}]", verb, node.name, node.id),
            }
            Ok(())
        }
        EditorOutcome::Failed(message) => Err(message.into()),
    }
}

fn cmd_add(args: AddArgs, json: bool, settings: &Settings) -> CmdResult {
    let mut session = settings.open_session(None)?;
    let parent = args
        .parent
        .as_deref()
        .map(|p| session.tree().canonical_id(CategoryId::from(p)));
    let mut editor = CategoryEditor::create(parent.clone());
    editor.draft = CategoryDraft {
        name: args.name,
        description: args.description,
        parent_id: parent,
        color: args.color,
        icon: args.icon,
        sort_order: args.sort_order,
    };
    save(editor, &mut session, json, "created")
}

fn cmd_edit(args: EditArgs, json: bool, settings: &Settings) -> CmdResult {
    let mut session = settings.open_session(Some(true))?;
    let id = CategoryId::from(args.id.as_str());
    let mut editor = CategoryEditor::edit(session.tree(), &id)
        .ok_or_else(|| format!("category not found: {}", id))?;

    let draft = &mut editor.draft;
    if let Some(name) = args.name {
        draft.name = name;
    }
    if args.root {
        draft.parent_id = None;
    } else if let Some(parent) = args.parent {
        draft.parent_id = Some(session.tree().canonical_id(CategoryId::from(parent)));
    }
    if let Some(description) = args.description {
        draft.description = Some(description);
    }
    if let Some(color) = args.color {
        draft.color = Some(color);
    }
    if let Some(icon) = args.icon {
        draft.icon = Some(icon);
    }
    if let Some(sort_order) = args.sort_order {
        draft.sort_order = sort_order;
    }
    save(editor, &mut session, json, "updated")
}

fn cmd_rm(args: RmArgs, json: bool, settings: &Settings) -> CmdResult {
    // components can only be moved to categories we can see
    let mut session = settings.open_session(Some(true))?;
    let id = CategoryId::from(args.id.as_str());
    let mut dialog = DeleteDialog::new();
    dialog.request(session.tree(), &id)?;
    let (name, moved) = dialog
        .target()
        .map(|t| (t.name.clone(), t.component_count))
        .ok_or_else(|| format!("category not found: {}", id))?;
    if let Some(target) = &args.reassign_to {
        dialog.choose_target(session.tree(), &CategoryId::from(target.as_str()))?;
    }
    let target_label = dialog
        .reassign_to()
        .and_then(|t| session.tree().get(t))
        .map(|r| format!("{} [{}]", r.name, r.id));
    let reassigned_to = dialog.reassign_to().cloned();

    match dialog.submit(&mut session)? {
        DeleteOutcome::Deleted(deleted) => {
            let components_moved = if reassigned_to.is_some() { moved } else { 0 };
            if json {
                return print_json(&DeletedJson {
                    deleted,
                    reassigned_to,
                    components_moved,
                });
            }
            match target_label {
                Some(label) => println!(
                    "deleted {} [{}]; moved {} components to {}",
                    name, deleted, components_moved, label
                ),
                None => println!("deleted {} [{}]", name, deleted),
            }
            Ok(())
        }
        DeleteOutcome::Failed(message) => Err(message.into()),
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(cmd: ConfigCmd, json: bool, settings: &Settings) -> CmdResult {
    match cmd.action {
        ConfigAction::Show => {
            if json {
                return print_json(&settings.config);
            }
            println!("# {}", settings.config_path.display());
            print!("{}", toml::to_string_pretty(&settings.config)?);
            Ok(())
        }
        ConfigAction::SetUrl(args) => {
            let url = args.url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("not an http(s) url: {}", url).into());
            }
            let (_config, mut doc) = config_io::read_config(&settings.config_path)?;
            config_io::set_backend_url(&mut doc, url);
            config_io::write_config(&settings.config_path, &doc)?;
            tracing::info!(path = %settings.config_path.display(), %url, "backend url saved");
            println!("backend url set to {} in {}", url, settings.config_path.display());
            Ok(())
        }
    }
}
