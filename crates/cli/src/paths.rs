//! Where Packetline keeps its files.
//!
//! The data dir is chosen once at startup (`--data-dir` flag, then
//! `PACKETLINE_DATA_DIR`, then `~/.packetline`) and read back through
//! the helpers below.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const DATA_DIR_ENV: &str = "PACKETLINE_DATA_DIR";

static DATA_DIR: RwLock<Option<PathBuf>> = RwLock::new(None);

fn resolve(explicit: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or(from_env)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".packetline")
        })
}

/// Resolve and remember the data directory.
pub fn init_data_dir(explicit: Option<&Path>) -> PathBuf {
    let dir = resolve(explicit, std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
    *DATA_DIR.write().expect("DATA_DIR lock poisoned") = Some(dir.clone());
    dir
}

/// Panics if `init_data_dir` hasn't been called.
pub fn data_dir() -> PathBuf {
    DATA_DIR
        .read()
        .expect("DATA_DIR lock poisoned")
        .clone()
        .expect("data_dir() called before init_data_dir()")
}

pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn ensure_dirs() -> io::Result<()> {
    std::fs::create_dir_all(log_dir())
}

#[cfg(test)]
pub fn reset_data_dir() {
    *DATA_DIR.write().expect("DATA_DIR lock poisoned") = None;
}
