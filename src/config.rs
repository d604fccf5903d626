use crate::filter::Filter;
use crate::loader::CatalogSource;
use std::path::PathBuf;
use thiserror::Error;

pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory; pass --prefs explicitly")]
    NoConfigDir,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: CatalogSource,
    pub preferences_path: PathBuf,
    pub initial_filter: Filter,
}

impl Settings {
    /// Fill in defaults for anything the command line (or its env fallbacks)
    /// left unset.
    pub fn resolve(
        source: Option<&str>,
        preferences_path: Option<PathBuf>,
        initial_filter: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let source = source.map(CatalogSource::parse).unwrap_or_default();
        let preferences_path = match preferences_path {
            Some(p) => p,
            None => default_preferences_path()?,
        };
        let initial_filter = initial_filter.map(Filter::from_value).unwrap_or_default();

        log::debug!(
            "settings: source={source} prefs={} filter={}",
            preferences_path.display(),
            initial_filter.value()
        );
        Ok(Self {
            source,
            preferences_path,
            initial_filter,
        })
    }
}

pub fn default_preferences_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("org", "rom-explorer", "rom-explorer")
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join(PREFERENCES_FILE))
}
