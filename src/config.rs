use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use loam_field::config::FieldConfig;
use loam_runtime::PoolConfig;
use serde::Deserialize;

use crate::cli::Cli;

/// Everything the host needs, read from `[pool]`, `[field]` and `[tick]`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub tick: TickConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TickConfig {
    #[serde(default = "default_hz")]
    pub hz: f32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    /// Packages applied per tick; 0 takes everything ready.
    #[serde(default)]
    pub budget: usize,
}
fn default_hz() -> f32 {
    60.0
}
fn default_max_ticks() -> u32 {
    600
}
impl Default for TickConfig {
    fn default() -> Self {
        Self {
            hz: default_hz(),
            max_ticks: default_max_ticks(),
            budget: 0,
        }
    }
}

impl TickConfig {
    /// Time between ticks; `None` runs unthrottled (`hz = 0`).
    pub fn period(&self) -> Result<Option<Duration>, String> {
        if self.hz == 0.0 {
            return Ok(None);
        }
        if !self.hz.is_finite() || self.hz < 0.0 {
            return Err(format!("tick rate {} must be a finite number >= 0", self.hz));
        }
        Duration::try_from_secs_f32(1.0 / self.hz)
            .map(Some)
            .map_err(|_| format!("tick rate {} Hz has no representable period", self.hz))
    }
}

pub fn parse_app_config(s: &str) -> Result<AppConfig, Box<dyn Error>> {
    Ok(toml::from_str(s)?)
}

pub fn load_app_config_from_path(path: &Path) -> Result<AppConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    parse_app_config(&s)
}

impl AppConfig {
    /// File (if any) first, then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<AppConfig, Box<dyn Error>> {
        let mut cfg = match cli.config.as_deref() {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                load_app_config_from_path(path)
                    .map_err(|e| format!("{}: {e}", path.display()))?
            }
            None => AppConfig::default(),
        };
        cfg.apply_cli(cli);
        Ok(cfg)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.grid_width {
            self.pool.grid_width = v;
        }
        if let Some(v) = cli.grid_height {
            self.pool.grid_height = v;
        }
        if let Some(v) = cli.chunk_size {
            self.pool.chunk_edge = v;
        }
        if let Some(v) = cli.threads {
            self.pool.threads = v;
        }
        if let Some(v) = cli.channel_capacity {
            self.pool.channel_capacity = v;
        }
        if let Some(v) = cli.shape {
            self.field.shape = v;
        }
        if let Some(v) = cli.seed {
            self.field.height.seed = v;
        }
        if let Some(v) = cli.ticks {
            self.tick.max_ticks = v;
        }
        if let Some(v) = cli.tick_hz {
            self.tick.hz = v;
        }
        if let Some(v) = cli.budget {
            self.tick.budget = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use loam_field::config::ShapeKind;

    #[test]
    fn empty_file_gives_reference_setup() {
        let cfg = parse_app_config("").unwrap();
        assert_eq!(cfg.pool, PoolConfig::default());
        assert_eq!(cfg.pool.chunk_count(), 64);
        assert_eq!(cfg.field.shape, ShapeKind::Height);
        assert_eq!(cfg.tick, TickConfig::default());
    }

    #[test]
    fn sections_parse() {
        let cfg = parse_app_config(
            r#"
            [pool]
            grid_width = 2
            chunk_edge = 8

            [field]
            shape = "sphere"
            sphere = { radius = 3.0 }

            [tick]
            hz = 0.0
            budget = 4
            "#,
        )
        .unwrap();
        assert_eq!((cfg.pool.grid_width, cfg.pool.grid_height), (2, 8));
        assert_eq!(cfg.pool.chunk_edge, 8);
        assert_eq!(cfg.field.shape, ShapeKind::Sphere);
        assert_eq!(cfg.field.sphere.radius, 3.0);
        assert_eq!(cfg.tick.hz, 0.0);
        assert_eq!(cfg.tick.budget, 4);
        assert_eq!(cfg.tick.max_ticks, 600);
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(parse_app_config("[field]\nshape = \"torus\"").is_err());
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut cfg = parse_app_config("[pool]\ngrid_width = 3\nthreads = 2").unwrap();
        let cli = Cli::try_parse_from([
            "loam",
            "--grid-width",
            "5",
            "--chunk-size",
            "12",
            "--shape",
            "plane",
            "--seed",
            "7",
            "--ticks",
            "10",
        ])
        .unwrap();
        cfg.apply_cli(&cli);
        assert_eq!(cfg.pool.grid_width, 5);
        assert_eq!(cfg.pool.threads, 2);
        assert_eq!(cfg.pool.chunk_edge, 12);
        assert_eq!(cfg.field.shape, ShapeKind::Plane);
        assert_eq!(cfg.field.height.seed, 7);
        assert_eq!(cfg.tick.max_ticks, 10);
    }

    #[test]
    fn tick_period_rejects_unrepresentable_rates() {
        let tick = |hz| TickConfig {
            hz,
            ..TickConfig::default()
        };
        assert_eq!(tick(0.0).period(), Ok(None));
        assert_eq!(tick(2.0).period(), Ok(Some(Duration::from_millis(500))));
        assert!(tick(1e-40).period().is_err());
        assert!(tick(-1.0).period().is_err());
        assert!(tick(f32::NAN).period().is_err());
        assert!(tick(f32::INFINITY).period().is_err());
    }

    #[test]
    fn bad_shape_flag_is_rejected_by_cli() {
        assert!(Cli::try_parse_from(["loam", "--shape", "cube"]).is_err());
    }
}
