use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shelf", about = concat!("shelf v", env!("CARGO_PKG_VERSION"), " - browse and edit parts inventory categories"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: $SHELF_CONFIG, then ./shelf.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Inventory API base URL, overriding config and $SHELF_API_URL
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Use a built-in sample catalog instead of the backend
    #[arg(long, global = true)]
    pub demo: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the category tree with component counts
    Tree(TreeArgs),
    /// List every category with its breadcrumb
    Flat(TreeArgs),
    /// Show categories matching a query, with their ancestors
    Find(FindArgs),
    /// Show category details
    Show(ShowArgs),
    /// List valid parents for a new or edited category
    Parents(ParentsArgs),
    /// Create a category
    Add(AddArgs),
    /// Change a category
    Edit(EditArgs),
    /// Delete a category, moving its components elsewhere
    Rm(RmArgs),
    /// View or change configuration
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TreeArgs {
    /// Include categories without components
    #[arg(long, conflicts_with = "hide_empty")]
    pub include_empty: bool,
    /// Hide categories without components
    #[arg(long)]
    pub hide_empty: bool,
}

impl TreeArgs {
    /// The flag's choice, if either flag was given
    pub fn include_empty(&self) -> Option<bool> {
        if self.include_empty {
            Some(true)
        } else if self.hide_empty {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args)]
pub struct FindArgs {
    /// Case-insensitive text to look for in names and descriptions
    pub query: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Category ID to show
    pub id: String,
}

#[derive(Args)]
pub struct ParentsArgs {
    /// Category being edited; it and its subcategories are left out
    #[arg(long)]
    pub editing: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Category name
    pub name: String,
    /// Parent category ID (default: top level)
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Color as #RRGGBB
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub sort_order: i32,
}

#[derive(Args)]
pub struct EditArgs {
    /// Category ID to change
    pub id: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// Move under this category
    #[arg(long, conflicts_with = "root")]
    pub parent: Option<String>,
    /// Move to the top level
    #[arg(long)]
    pub root: bool,
    /// New description (empty string clears it)
    #[arg(long)]
    pub description: Option<String>,
    /// New color as #RRGGBB (empty string clears it)
    #[arg(long)]
    pub color: Option<String>,
    /// New icon (empty string clears it)
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub sort_order: Option<i32>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Category ID to delete
    pub id: String,
    /// Category that receives the deleted category's components
    #[arg(long)]
    pub reassign_to: Option<String>,
}

// ---------------------------------------------------------------------------
// Config args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Store the backend URL in the config file
    SetUrl(SetUrlArgs),
}

#[derive(Args)]
pub struct SetUrlArgs {
    pub url: String,
}
