mod tank;

use std::path::PathBuf;

use aquaria_registry::CatalogConfig;
use aquaria_render::{TextSurface, Viewport};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::tank::{Tank, standard_catalog};

#[derive(Parser)]
#[command(name = "aquaria-cli", about = "Drive the aquaria entity registry from the command line")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the demo tank for a number of frames
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f64,
        /// Seed for deterministic spawning
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Number of fish at start
        #[arg(long, default_value = "6")]
        fish: usize,
        /// Log a summary every N frames (0 disables)
        #[arg(long, default_value = "60")]
        every: u64,
        /// Catalog layer overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the draw calls of the final frame
        #[arg(long)]
        show_frame: bool,
    },
    /// Show the draw order the tank would use
    Layers {
        /// Catalog layer overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the effective layers to this JSON file
        #[arg(short, long)]
        write: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("aquaria-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("registry: {}", aquaria_registry::crate_info());
            println!("render: {}", aquaria_render::crate_info());
            let catalog = standard_catalog();
            println!("categories: {}", catalog.len());
        }
        Commands::Simulate {
            frames,
            dt,
            seed,
            fish,
            every,
            config,
            show_frame,
        } => {
            let viewport = Viewport::default();
            let mut tank = Tank::new(seed, fish, viewport);
            if let Some(path) = config {
                let config = CatalogConfig::load(&path)?;
                let touched = tank.registry.apply_config(&config);
                tracing::info!(path = %path.display(), touched, "applied catalog config");
            }

            let mut surface = TextSurface::new(viewport);
            for _ in 0..frames {
                tank.step(dt);
                surface.clear();
                tank.draw(&mut surface);
                if every > 0 && tank.frame() % every == 0 {
                    tracing::info!(
                        draw_calls = surface.ops().len(),
                        removed = tank.registry.stats().entities_removed,
                        "{}",
                        tank.summary()
                    );
                }
            }

            tracing::info!(bank = tank.bank(), frames, "simulation finished");
            println!("{}", tank.summary());
            if show_frame {
                print!("{}", surface.render_frame(tank.frame()));
            }
        }
        Commands::Layers { config, write } => {
            let mut tank = Tank::new(0, 1, Viewport::default());
            if let Some(path) = config {
                let config = CatalogConfig::load(&path)?;
                tank.registry.apply_config(&config);
            }

            println!("Draw order (first drawn first):");
            for (name, layer) in tank.registry.planned_draw_order() {
                let category = tank.registry.category_of(name).unwrap_or("?");
                println!("  {layer:>3}  {name:<10} ({category})");
            }

            if let Some(path) = write {
                CatalogConfig::capture(tank.registry.catalog()).save(&path)?;
                println!("Wrote layers to {}", path.display());
            }
        }
    }

    Ok(())
}
