mod app;
mod cli;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use crate::app::App;
use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("loam: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }
    let cfg = match AppConfig::resolve(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let app = match App::new(cfg) {
        Ok(app) => app,
        Err(e) => {
            log::error!("failed to start chunk pool: {e}");
            return ExitCode::FAILURE;
        }
    };

    let summary = app.run();
    println!(
        "loam: {}/{} chunks applied, {} failed, {} cancelled, {} unfinished after {} ticks",
        summary.applied,
        summary.chunks,
        summary.failed,
        summary.cancelled,
        summary.unfinished,
        summary.ticks
    );
    println!(
        "loam: {} vertices, {} triangles (avg gen {:.2}ms, extract {:.2}ms, {} stale)",
        summary.vertices,
        summary.triangles,
        summary.avg_gen_ms,
        summary.avg_extract_ms,
        summary.stale
    );
    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
