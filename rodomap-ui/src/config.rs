//! Data folder resolution
//!
//! Priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (`./data`, matching the original layout of the
//!    locally served files)

use std::path::PathBuf;

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "RODOMAP_DATA_FOLDER";

/// Resolve the folder holding the GeoJSON layer files
pub fn resolve_data_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(config_path) = config_file_path() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(folder);
                }
            }
        }
    }

    // Priority 4: Compiled default
    PathBuf::from("./data")
}

/// Platform config file location (`<config dir>/rodomap/config.toml`)
fn config_file_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("rodomap").join("config.toml");
    path.exists().then_some(path)
}
