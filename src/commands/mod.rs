pub mod add;
pub mod check;
pub mod config;
pub mod show;
pub mod tag;

use crate::config::Config;
use crate::library::Library;
use anyhow::Result;

/// Every library command starts from the saved configuration.
pub fn open_library() -> Result<(Config, Library)> {
    let config = Config::load()?;
    let library = Library::from_config(&config);
    Ok((config, library))
}

pub fn library() -> Result<Library> {
    Ok(open_library()?.1)
}
