//! Category tree manager.
//!
//! Manages a flat category list (`.categories/categories.json`) where each
//! category references its parent. Moves are planned so that every sibling
//! group stays densely ranked and no category ends up inside its own subtree.

use std::path::PathBuf;

use anyhow::Result;
use categories::catalog::{
    MoveRequest, create_category, exit_code, move_category, show_tree, validate_catalog,
};
use categories::category::NewCategory;
use categories::core::types::DropPosition;
use categories::exit_codes;
use categories::io::init::{InitOptions, init_catalog};
use categories::logging;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "categories",
    version,
    about = "Hierarchical category tree manager"
)]
struct Cli {
    /// Project root containing `.categories/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.categories/` with an empty store, schema and config if missing.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Check the store against the schema and tree invariants.
    Validate,
    /// Print the category tree as an indented outline.
    Tree,
    /// Move a category before, after, or inside another.
    Move {
        /// Category being dragged.
        drag: String,
        /// Category the drag is dropped on.
        target: String,
        /// Drop zone relative to the target.
        #[arg(short, long, default_value_t = DropPosition::Inside)]
        position: DropPosition,
        /// Print the planned updates without saving them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a category after its current siblings.
    Create {
        #[arg(long)]
        name: String,
        /// Defaults to a slug derived from the name.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Parent category id; omit for a top-level category.
        #[arg(long)]
        parent: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let code = match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { force } => {
            let paths = init_catalog(&cli.root, &InitOptions { force })?;
            println!("initialized {}", paths.state_dir.display());
        }
        Command::Validate => {
            let outcome = validate_catalog(&cli.root)?;
            for orphan in &outcome.orphans {
                eprintln!("warning: category '{orphan}' has a missing parent");
            }
            println!("ok: {} categories", outcome.categories);
        }
        Command::Tree => print!("{}", show_tree(&cli.root).await?),
        Command::Move {
            drag,
            target,
            position,
            dry_run,
        } => {
            let request = MoveRequest {
                drag_id: drag,
                target_id: target,
                position,
                dry_run,
            };
            let report = move_category(&cli.root, &request).await?;
            if report.updates.is_empty() {
                println!("unchanged");
            }
            for update in &report.updates {
                println!(
                    "{} parent={} sort_order={}",
                    update.id,
                    update.parent_id.as_deref().unwrap_or("-"),
                    update.sort_order
                );
            }
            if let Some(path) = report.path {
                println!("{}: {path}", if dry_run { "would move to" } else { "moved to" });
            }
        }
        Command::Create {
            name,
            slug,
            description,
            parent,
        } => {
            let created = create_category(
                &cli.root,
                NewCategory {
                    name,
                    slug,
                    description,
                    parent_id: parent,
                },
            )
            .await?;
            println!("{}", created.id);
        }
    }
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["categories", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["categories", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_move_defaults_to_inside() {
        let cli = Cli::parse_from(["categories", "move", "4", "2"]);
        match cli.command {
            Command::Move {
                drag,
                target,
                position,
                dry_run,
            } => {
                assert_eq!((drag.as_str(), target.as_str()), ("4", "2"));
                assert_eq!(position, DropPosition::Inside);
                assert!(!dry_run);
            }
            _ => panic!("expected move"),
        }
    }

    #[test]
    fn parse_move_with_position_and_root() {
        let cli = Cli::parse_from([
            "categories",
            "move",
            "4",
            "2",
            "--position",
            "after",
            "--dry-run",
            "--root",
            "/tmp/shop",
        ]);
        assert_eq!(cli.root, PathBuf::from("/tmp/shop"));
        assert!(matches!(
            cli.command,
            Command::Move {
                position: DropPosition::After,
                dry_run: true,
                ..
            }
        ));
    }

    #[test]
    fn parse_move_rejects_unknown_position() {
        let result = Cli::try_parse_from(["categories", "move", "4", "2", "-p", "below"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_create() {
        let cli = Cli::parse_from(["categories", "create", "--name", "Shoes", "--parent", "1"]);
        match cli.command {
            Command::Create { name, parent, slug, .. } => {
                assert_eq!(name, "Shoes");
                assert_eq!(parent.as_deref(), Some("1"));
                assert!(slug.is_none());
            }
            _ => panic!("expected create"),
        }
    }
}
