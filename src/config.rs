use crate::citekey::{CitekeyError, CkPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration found. Run:\n  ck config --bib-dir <path> --tag-dir <path>")]
    NotFound,
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Both --bib-dir and --tag-dir are needed to create a configuration")]
    MissingDirs,
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_ck() -> String {
    CkPolicy::InitialsShortYear.name().to_string()
}

/// Everything a command needs to know about the library's location and
/// defaults. Loaded once per invocation and passed down by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    bib_dir: PathBuf,
    tag_dir: PathBuf,
    #[serde(default = "default_ck")]
    default_ck: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
}

impl Config {
    pub fn new(bib_dir: &Path, tag_dir: &Path) -> Self {
        Config {
            bib_dir: expand(bib_dir),
            tag_dir: expand(tag_dir),
            default_ck: default_ck(),
            user_agent: None,
        }
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("citationkeys").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Self::config_path()
    }

    pub fn bib_dir(&self) -> &Path {
        &self.bib_dir
    }

    pub fn tag_dir(&self) -> &Path {
        &self.tag_dir
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn default_ck(&self) -> &str {
        &self.default_ck
    }

    /// The configured key policy; an unknown name is reported here, when a
    /// key actually has to be derived.
    pub fn policy(&self) -> Result<CkPolicy, CitekeyError> {
        self.default_ck.parse()
    }

    pub fn set_bib_dir(&mut self, dir: &Path) {
        self.bib_dir = expand(dir);
    }

    pub fn set_tag_dir(&mut self, dir: &Path) {
        self.tag_dir = expand(dir);
    }

    pub fn set_default_ck(&mut self, policy: CkPolicy) {
        self.default_ck = policy.name().to_string();
    }

    pub fn set_user_agent(&mut self, user_agent: Option<String>) {
        self.user_agent = user_agent;
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound);
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        Ok(Config {
            bib_dir: expand(&config.bib_dir),
            tag_dir: expand(&config.tag_dir),
            ..config
        })
    }

    /// Writes the configuration and creates both library directories.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.bib_dir)?;
        fs::create_dir_all(&self.tag_dir)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    shellexpand::tilde(&path.to_string_lossy())
        .into_owned()
        .into()
}
