/// Default locations stored in `~/.midicap`
///
/// .
/// └── log
///    └── midicap.log
///
use std::path::PathBuf;

pub fn midicap() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".midicap"))
}

pub fn log() -> Option<PathBuf> {
    Some(midicap()?.join("log"))
}

pub fn log_file(name: &str) -> Option<PathBuf> {
    Some(log()?.join(format!("{name}.log")))
}
