use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use loam_field::config::ShapeKind;

/// Mesh a grid of density-field chunks on background workers and hand the
/// results to a fixed-rate presentation loop.
#[derive(Parser, Debug)]
#[command(name = "loam", version, about)]
pub struct Cli {
    /// TOML config file; flags given here override it.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub grid_width: Option<usize>,

    #[arg(long)]
    pub grid_height: Option<usize>,

    /// Cells per chunk edge.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// height | sphere | plane
    #[arg(long)]
    pub shape: Option<ShapeKind>,

    /// Noise seed for the height field.
    #[arg(long)]
    pub seed: Option<i32>,

    /// Worker threads (0 = one per core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Handoff channel bound (0 = unbounded).
    #[arg(long)]
    pub channel_capacity: Option<usize>,

    /// Give up after this many presentation ticks.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Presentation ticks per second (0 = unthrottled).
    #[arg(long)]
    pub tick_hz: Option<f32>,

    /// Max packages applied per tick (0 = all ready).
    #[arg(long)]
    pub budget: Option<usize>,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
