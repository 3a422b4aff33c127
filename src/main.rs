//! CLI Entry Point for block-graph
//!
//! Provides command-line access to saved projects:
//! - Validate a project file against the block registry
//! - Print blocks, properties and link geometry of a project
//! - Write a small demo project
//!
//! # Usage
//!
//! ```bash
//! block-graph validate project.blockgraph
//! block-graph inspect project.blockgraph
//! block-graph --log-level debug demo --out demo.blockgraph
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use block_graph::config::EditorConfig;
use block_graph::geometry::project_links;
use block_graph::interaction::{Interaction, PointerEvent, PointerTarget};
use block_graph::persistence;
use block_graph::project::{Node, Point};
use block_graph::tracing_setup;
use block_graph::Store;

#[derive(Parser)]
#[command(name = "block-graph")]
#[command(about = "Inspect and validate block graph projects", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a project file decodes and is structurally consistent
    Validate {
        /// Path to the project file
        file: PathBuf,
    },

    /// Print the blocks, properties and links of a project
    Inspect {
        /// Path to the project file
        file: PathBuf,
    },

    /// Write a demo project with two linked blocks
    Demo {
        /// Output path
        #[arg(long, default_value = "demo.blockgraph")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load_from(path)?,
        None => EditorConfig::load()?,
    };
    if let Some(level) = &cli.log_level {
        config.application.log_level = level.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;
    tracing_setup::init_from_config(&config).map_err(anyhow::Error::msg)?;

    let store = Store::new(config)?;

    match cli.command {
        Commands::Validate { file } => validate(store, &file).await,
        Commands::Inspect { file } => inspect(store, &file).await,
        Commands::Demo { out } => demo(store, &out),
    }
}

async fn open_into(store: &mut Store, path: &Path) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    persistence::load_into(store, file)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

async fn validate(mut store: Store, path: &Path) -> Result<()> {
    open_into(&mut store, path).await?;
    let project = store.project();
    println!(
        "{}: ok ({} blocks, {} links, {} node slots)",
        path.display(),
        project.block_order.len(),
        project.links().len(),
        project.nodes.len()
    );
    Ok(())
}

async fn inspect(mut store: Store, path: &Path) -> Result<()> {
    open_into(&mut store, path).await?;
    let project = store.project();

    for (id, block) in project.blocks() {
        println!(
            "block {id} [{}] at ({}, {})",
            block.kind, block.position.x, block.position.y
        );
        for prop_id in &block.properties {
            if let Some(Node::Property(prop)) = project.nodes.get(*prop_id) {
                let link = prop
                    .link
                    .map(|source| format!(" <- {source}"))
                    .unwrap_or_default();
                println!("  {prop_id} {} = {:?}{link}", prop.key, prop.value);
            }
        }
    }

    let lines = project_links(&store.snapshot(), &store.config().layout)?;
    for (sink, line) in lines {
        println!(
            "link -> {sink}: ({}, {}) -> ({}, {})",
            line.from.x, line.from.y, line.to.x, line.to.y
        );
    }
    Ok(())
}

fn demo(mut store: Store, out: &Path) -> Result<()> {
    let add = store.add_block("add")?;
    let multiply = store.add_block("multiply")?;

    let c = store.block(add)?.properties[2];
    let a = store.block(multiply)?.properties[0];
    store.link_properties(c, a)?;

    // Drag the second block the way a pointer would.
    let mut ui = Interaction::new();
    let grab = store.effective_position(multiply)?;
    ui.handle(
        &mut store,
        PointerEvent::Down {
            position: grab,
            target: Some(PointerTarget::BlockHeader(multiply)),
        },
    )?;
    ui.handle(
        &mut store,
        PointerEvent::Move {
            position: grab + Point::new(50.0, -20.0),
        },
    )?;
    ui.handle(
        &mut store,
        PointerEvent::Up {
            position: grab + Point::new(50.0, -20.0),
            target: None,
        },
    )?;

    persistence::save_to_path(out, store.project())?;
    info!(path = %out.display(), "Demo project written");
    println!("Wrote {}", out.display());
    Ok(())
}
