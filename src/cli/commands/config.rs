//! Config Command

use console::style;

use crate::config::ConfigLoader;
use crate::types::Result;

pub fn show(as_json: bool) -> Result<()> {
    ConfigLoader::show_config(as_json)
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = ConfigLoader::init_project(force)?;
    println!("{} {}", style("Config:").bold(), path.display());
    Ok(())
}
