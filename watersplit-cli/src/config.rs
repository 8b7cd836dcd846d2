use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ledger: LedgerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    /// Directory holding history.json / trueups.json.
    pub data_dir: PathBuf,
}

impl Config {
    fn default_in(home: &Path) -> Self {
        Self {
            ledger: LedgerSection {
                data_dir: home.join("data"),
            },
        }
    }
}

pub fn watersplit_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".watersplit"))
}

pub fn ensure_watersplit_home() -> Result<PathBuf> {
    let dir = watersplit_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_watersplit_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default_in(&watersplit_home()?));
    }
    let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    Ok(toml::from_str(&text).context("parse config.toml")?)
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let text = toml::to_string_pretty(config).context("serialize config")?;
    fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let path = config_path()?;
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    let config = Config::default_in(&watersplit_home()?);
    save_config(&config)?;
    println!("Wrote {}", path.display());
    Ok(())
}
