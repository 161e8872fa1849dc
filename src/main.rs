#![warn(non_snake_case)]
//! # rust_bsp command line
//!
//! Builds BSP nodes for a JSON map or a WAD level and prints the build
//! statistics, or writes a procedurally generated map.
//!
//! ```text
//! rust_bsp build maps/e1m1.wad --level E1M1 --steps-per-tick 64
//! rust_bsp generate --seed 3 --width 12 --height 8 --output grid.json
//! ```
//!
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=debug`).

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

use rust_bsp::bsp::{BspLevel, BuildConfig, GeneratorConfig, Point2D, ProceduralGenerator};
use rust_bsp::document::Document;
use rust_bsp::error::MapError;
use rust_bsp::map::MapGeometry;

#[derive(Debug, Parser)]
#[command(name = "rust_bsp", version, about = "BSP node builder for Doom-style maps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the node tree for a map and print its statistics as JSON.
    Build {
        /// A `.wad` file or a JSON map description.
        map: PathBuf,
        /// Level marker to load from a WAD (defaults to the first level).
        #[arg(long)]
        level: Option<String>,
        /// JSON build config; missing fields take their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Run the build this many jobs at a time, logging progress.
        #[arg(long)]
        steps_per_tick: Option<usize>,
        /// Report the sector containing X,Y.
        #[arg(long, value_parser = parse_point)]
        locate: Option<Point2D>,
    },
    /// Write a seeded grid map as JSON.
    Generate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 8)]
        width: usize,
        #[arg(long, default_value_t = 8)]
        height: usize,
        #[arg(long, default_value_t = 64)]
        cell_size: i32,
        #[arg(long, default_value_t = 0.2)]
        dividers: f64,
        /// Output file (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_point(text: &str) -> Result<Point2D, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{text}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Point2D::new(x, y))
}

fn load_map(path: &Path, level: Option<&str>) -> Result<MapGeometry, MapError> {
    let is_wad = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wad"));
    if !is_wad {
        return MapGeometry::load_json(path);
    }

    let doc = Document::open(path)?;
    let name = match level {
        Some(name) => name.to_string(),
        None => doc
            .available_levels()
            .into_iter()
            .next()
            .ok_or_else(|| MapError::InvalidWad("WAD contains no levels".into()))?,
    };
    doc.load_level(&name)
}

fn run_build(
    map: &Path,
    level: Option<&str>,
    config: Option<&Path>,
    steps_per_tick: Option<usize>,
    locate: Option<Point2D>,
) -> Result<(), Box<dyn Error>> {
    let config = match config {
        Some(path) => BuildConfig::from_json_file(path)?,
        None => BuildConfig::default(),
    };
    let mut bsp = BspLevel::new(load_map(map, level)?, config)?;

    match steps_per_tick {
        Some(steps) => {
            let mut tick = 0;
            while !bsp.step(steps.max(1))? {
                tick += 1;
                info!("tick {}: {:?}", tick, bsp.state());
            }
        }
        None => {
            bsp.build()?;
        }
    }

    let Some(tree) = bsp.tree() else {
        return Err("build finished without a tree".into());
    };
    println!("{}", serde_json::to_string_pretty(tree.stats())?);

    if let Some(point) = locate {
        let leaf = tree.locate(point);
        let report = json!({
            "x": point.x,
            "y": point.y,
            "sector": leaf.sector(),
            "segs": leaf.segs.len(),
            "area": leaf.area(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging.
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build {
            map,
            level,
            config,
            steps_per_tick,
            locate,
        } => run_build(&map, level.as_deref(), config.as_deref(), steps_per_tick, locate),
        Command::Generate {
            seed,
            width,
            height,
            cell_size,
            dividers,
            output,
        } => {
            let mut generator = ProceduralGenerator::new(GeneratorConfig {
                width,
                height,
                cell_size,
                divider_probability: dividers,
                seed,
                ..GeneratorConfig::default()
            });
            let map = generator.generate();
            match output {
                Some(path) => {
                    map.save_json(&path)?;
                    info!("Wrote {} ({:?})", path.display(), generator.stats());
                }
                None => println!("{}", map.to_json_string()?),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("12.5, -3").unwrap(), Point2D::new(12.5, -3.0));
        assert!(parse_point("12").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::parse_from(["rust_bsp", "build", "map.json", "--locate", "1,2", "--steps-per-tick", "4"]);
        match cli.command {
            Command::Build { map, steps_per_tick, locate, .. } => {
                assert_eq!(map, PathBuf::from("map.json"));
                assert_eq!(steps_per_tick, Some(4));
                assert_eq!(locate, Some(Point2D::new(1.0, 2.0)));
            }
            Command::Generate { .. } => panic!("expected build"),
        }
    }
}
