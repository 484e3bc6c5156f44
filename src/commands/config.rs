use crate::citekey::CkPolicy;
use crate::config::{Config, ConfigError};
use crate::ui::{blog, blog_done};
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub bib_dir: Option<PathBuf>,
    pub tag_dir: Option<PathBuf>,
    pub default_ck: Option<String>,
    pub user_agent: Option<String>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.bib_dir.is_none()
            && self.tag_dir.is_none()
            && self.default_ck.is_none()
            && self.user_agent.is_none()
    }
}

/// Shows the configuration, or creates/updates it from the given flags.
pub fn config(update: ConfigUpdate) -> Result<()> {
    let existing = match Config::load() {
        Ok(config) => Some(config),
        Err(ConfigError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    if update.is_empty() {
        let config = existing.ok_or(ConfigError::NotFound)?;
        blog!("Config", "{}", Config::path()?.display());
        print_config(&config);
        return Ok(());
    }

    let config = apply(existing, update)?;
    let path = config.save()?;
    blog_done!("Saved", "{}", path.display());
    print_config(&config);
    Ok(())
}

fn apply(existing: Option<Config>, update: ConfigUpdate) -> Result<Config> {
    let mut config = match existing {
        Some(config) => config,
        None => match (&update.bib_dir, &update.tag_dir) {
            (Some(bib_dir), Some(tag_dir)) => Config::new(bib_dir, tag_dir),
            _ => return Err(ConfigError::MissingDirs.into()),
        },
    };

    if let Some(dir) = &update.bib_dir {
        config.set_bib_dir(dir);
    }
    if let Some(dir) = &update.tag_dir {
        config.set_tag_dir(dir);
    }
    if let Some(policy) = &update.default_ck {
        config.set_default_ck(policy.parse::<CkPolicy>()?);
    }
    if let Some(user_agent) = update.user_agent {
        config.set_user_agent(Some(user_agent).filter(|ua| !ua.is_empty()));
    }
    Ok(config)
}

fn print_config(config: &Config) {
    println!("{:>12} {}", "bib_dir", config.bib_dir().display());
    println!("{:>12} {}", "tag_dir", config.tag_dir().display());
    println!("{:>12} {}", "default_ck", config.default_ck());
    if let Some(user_agent) = config.user_agent() {
        println!("{:>12} {}", "user_agent", user_agent);
    }
}
