use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Run settings, read from an optional TOML file. Command line flags
/// override individual fields, defaults fill the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// directory containing the experiment log files
    pub analysis_dir: PathBuf,
    /// dataset name prefix of the log files
    pub name: String,
    /// chart output directory, defaults to `<analysis_dir>/img`
    pub img_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            analysis_dir: PathBuf::from("analysis"),
            name: "germany".to_string(),
            img_dir: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn img_dir(&self) -> PathBuf {
        self.img_dir
            .clone()
            .unwrap_or_else(|| self.analysis_dir.join("img"))
    }
}
