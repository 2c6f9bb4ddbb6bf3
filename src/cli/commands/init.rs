use crate::config::Config;
use std::path::Path;

pub fn cmd_init(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }

    Config::default().save_to_path(path)?;
    println!("Created {}", path.display());
    println!("Set OMDB_API_KEY and RAPIDAPI_KEY in the environment or a .env file.");
    Ok(())
}
