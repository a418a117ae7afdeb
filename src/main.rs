use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use prmpt::cli::{self, App};
use prmpt::config::Config;

#[derive(Parser)]
#[command(name = "prmpt", version)]
#[command(about = "Local-first library for prompts, skills and agent anatomies", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./prmpt.toml or ~/.config/prmpt/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the library data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List library items, newest first
    List {
        /// Only items of this type (prompt, skill, anatomy)
        #[arg(long = "type")]
        item_type: Option<String>,

        /// Include archived items
        #[arg(long)]
        archived: bool,

        /// Only favorites
        #[arg(long)]
        favorites: bool,

        /// Case-insensitive search over title, description and tags
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Print an item as JSON, or rendered as markdown
    Show {
        id: String,

        #[arg(long)]
        markdown: bool,
    },

    /// Import one item or an array of items from a JSON file
    Import { file: String },

    /// Export an item as JSON
    Export {
        id: String,

        /// Write to a file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Print a URL-safe share token for a prompt
    Share { id: String },

    /// Copy an item under a new id
    Duplicate { id: String },

    /// Delete an item
    Delete { id: String },

    /// Toggle the favorite flag
    Favorite { id: String },

    /// Toggle the archived flag
    Archive { id: String },

    /// Record that an item was just used
    Touch { id: String },

    /// Lint a prompt item (non-zero exit on errors)
    Lint {
        id: String,

        /// Lowest severity to report: error, warning or info
        #[arg(long, default_value = "info")]
        min_severity: String,
    },

    /// Cloud sync controls
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Show sync settings and mirror state
    Status,

    /// Push the local library, merge the remote one and turn mirroring on
    Enable {
        /// Report what would be pushed without touching the remote
        #[arg(long)]
        dry_run: bool,
    },

    /// Turn mirroring off
    Disable,

    /// Merge the remote library into the local one
    Pull,
}

fn init_logging(config_path: Option<String>) {
    let level = Config::load_with_path(config_path)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            item_type,
            archived,
            favorites,
            query,
        } => cli::library::list(app, item_type, archived, favorites, query),
        Commands::Show { id, markdown } => cli::library::show(app, &id, markdown),
        Commands::Import { file } => cli::library::import(app, &file).map(|_| ()),
        Commands::Export { id, output } => cli::library::export(app, &id, output),
        Commands::Share { id } => cli::library::share(app, &id),
        Commands::Duplicate { id } => cli::library::duplicate(app, &id),
        Commands::Delete { id } => cli::library::delete(app, &id),
        Commands::Favorite { id } => cli::library::favorite(app, &id),
        Commands::Archive { id } => cli::library::archive(app, &id),
        Commands::Touch { id } => cli::library::touch(app, &id),
        Commands::Lint { id, min_severity } => {
            cli::lint::run(app, &id, &min_severity).map(|_| ())
        }
        Commands::Sync { command } => match command {
            SyncCommand::Status => cli::sync::status(app),
            SyncCommand::Enable { dry_run } => cli::sync::enable(app, dry_run).await,
            SyncCommand::Disable => cli::sync::disable(app),
            SyncCommand::Pull => cli::sync::pull(app).await,
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.config.clone());

    let app = App::boot(cli.config, cli.data_dir).await?;
    let result = dispatch(&app, cli.command).await;
    app.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["prmpt", "list"]).unwrap();
        match cli.command {
            Commands::List {
                item_type,
                archived,
                favorites,
                query,
            } => {
                assert!(item_type.is_none());
                assert!(!archived);
                assert!(!favorites);
                assert!(query.is_none());
            }
            _ => panic!("expected List"),
        }
        assert!(cli.config.is_none());
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::try_parse_from([
            "prmpt",
            "list",
            "--type",
            "skill",
            "--archived",
            "--favorites",
            "-q",
            "apex",
        ])
        .unwrap();
        match cli.command {
            Commands::List {
                item_type,
                archived,
                favorites,
                query,
            } => {
                assert_eq!(item_type.unwrap(), "skill");
                assert!(archived);
                assert!(favorites);
                assert_eq!(query.unwrap(), "apex");
            }
            _ => panic!("expected List"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "prmpt",
            "show",
            "skill-sf-apex",
            "--markdown",
            "--data-dir",
            "/tmp/lib",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/lib")));
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        match cli.command {
            Commands::Show { id, markdown } => {
                assert_eq!(id, "skill-sf-apex");
                assert!(markdown);
            }
            _ => panic!("expected Show"),
        }
    }

    #[test]
    fn test_parse_export_output() {
        let cli = Cli::try_parse_from(["prmpt", "export", "prompt-1", "-o", "out.json"]).unwrap();
        match cli.command {
            Commands::Export { id, output } => {
                assert_eq!(id, "prompt-1");
                assert_eq!(output.unwrap(), "out.json");
            }
            _ => panic!("expected Export"),
        }
    }

    #[test]
    fn test_parse_sync_enable_dry_run() {
        let cli = Cli::try_parse_from(["prmpt", "sync", "enable", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Sync {
                command: SyncCommand::Enable { dry_run },
            } => assert!(dry_run),
            _ => panic!("expected sync enable"),
        }
    }

    #[test]
    fn test_parse_sync_requires_subcommand() {
        assert!(Cli::try_parse_from(["prmpt", "sync"]).is_err());
        assert!(Cli::try_parse_from(["prmpt", "delete"]).is_err());
    }

    #[test]
    fn test_parse_single_id_commands() {
        for cmd in ["duplicate", "delete", "favorite", "archive", "touch", "lint", "share"] {
            let cli = Cli::try_parse_from(["prmpt", cmd, "x-1"]).unwrap();
            let id = match cli.command {
                Commands::Duplicate { id }
                | Commands::Delete { id }
                | Commands::Favorite { id }
                | Commands::Archive { id }
                | Commands::Touch { id }
                | Commands::Lint { id, .. }
                | Commands::Share { id } => id,
                _ => panic!("unexpected command for {}", cmd),
            };
            assert_eq!(id, "x-1");
        }
    }

    #[test]
    fn test_parse_lint_min_severity() {
        let cli = Cli::try_parse_from(["prmpt", "lint", "prompt-1"]).unwrap();
        match cli.command {
            Commands::Lint { min_severity, .. } => assert_eq!(min_severity, "info"),
            _ => panic!("expected Lint"),
        }

        let cli =
            Cli::try_parse_from(["prmpt", "lint", "prompt-1", "--min-severity", "warning"]).unwrap();
        match cli.command {
            Commands::Lint { id, min_severity } => {
                assert_eq!(id, "prompt-1");
                assert_eq!(min_severity, "warning");
            }
            _ => panic!("expected Lint"),
        }
    }

    #[test]
    fn test_list_query_help_names_searched_fields() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let list = cmd.find_subcommand_mut("list").unwrap();
        let query = list
            .get_arguments()
            .find(|arg| arg.get_id() == "query")
            .unwrap();
        let help = query.get_help().unwrap().to_string();
        assert_eq!(help, "Case-insensitive search over title, description and tags");
    }
}
