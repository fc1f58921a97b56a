use std::error::Error;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;

/// stderr through env_logger (`RUST_LOG` still wins), or a plain file log.
pub fn init(level: LevelFilter, file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match file {
        Some(path) => {
            let out = File::create(path)?;
            simplelog::WriteLogger::init(level, simplelog::Config::default(), out)?;
        }
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .try_init()?;
        }
    }
    Ok(())
}
