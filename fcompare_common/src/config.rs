use crate::{AppConfig, FcompareError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "fcompare.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, FcompareError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let mut loaded = load_config_from(&path)?;
    loaded.portable = portable;
    loaded.config.portable_mode = portable;
    Ok(loaded)
}

/// Load the config at an explicit path; a missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<LoadedConfig, FcompareError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(path)
            .map_err(|e| FcompareError::from_io(e, "reading config", path))?;
        parse_config(&data)?
    } else {
        AppConfig::default()
    };

    if config.deep_compare_buffer == 0 {
        return Err(FcompareError::Config(
            "deep_compare_buffer must be greater than zero".to_string(),
        ));
    }

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
        portable: false,
    })
}

pub fn parse_config(data: &str) -> Result<AppConfig, FcompareError> {
    toml::from_str(data).map_err(|e| FcompareError::Serialization(e.to_string()))
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), FcompareError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| FcompareError::from_io(e, "creating config directory", parent))?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| FcompareError::Serialization(e.to_string()))?;
    fs::write(path, data).map_err(|e| FcompareError::from_io(e, "writing config", path))?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), FcompareError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "aecs4u", "fcompare")
        .ok_or_else(|| FcompareError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
