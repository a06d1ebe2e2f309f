use crate::ops;
use crate::platform::platform;
use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ATTIC_CONFIG";
pub const INSTALL_LOCATION_ENV: &str = "ATTIC_INSTALL_LOCATION";
pub const BIN_DIR_ENV: &str = "ATTIC_BIN_DIR";

/// Effective settings after merging defaults, the config file and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtticConfig {
    /// Where installed copies are kept.
    pub install_location: PathBuf,
    /// Directory that receives the symlinks (normally on PATH).
    pub bin_dir: PathBuf,
    /// Config file consulted, whether or not it exists.
    pub path: Option<PathBuf>,
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_location: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Missing file means an empty config; unreadable or malformed is an error.
    pub fn read(path: &Path) -> Result<Self> {
        if !ops::file_exists(path) {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

impl AtticConfig {
    /// Load from `$ATTIC_CONFIG` or `~/.attic/config.toml`, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let home = platform().home_dir();
        let env = |key: &str| std::env::var_os(key);
        let path = config_path(&env, home.as_deref());
        let file = match &path {
            Some(p) => ConfigFile::read(p)?,
            None => ConfigFile::default(),
        };
        let cwd = std::env::current_dir().context("reading current directory")?;
        let mut cfg = Self::from_parts(&file, &env, home.as_deref(), &cwd)?;
        cfg.path = path;
        tracing::debug!(?cfg, "loaded configuration");
        Ok(cfg)
    }

    /// Merge with precedence environment > file > platform default.
    pub fn from_parts(
        file: &ConfigFile,
        env: &dyn Fn(&str) -> Option<OsString>,
        home: Option<&Path>,
        cwd: &Path,
    ) -> Result<Self> {
        let install_location = env(INSTALL_LOCATION_ENV)
            .map(PathBuf::from)
            .or_else(|| file.install_location.clone())
            .or_else(|| home.map(|h| platform().default_install_dir(h)))
            .ok_or_else(|| {
                anyhow!("cannot determine install location; set {INSTALL_LOCATION_ENV}")
            })?;
        let bin_dir = env(BIN_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| file.bin_dir.clone())
            .unwrap_or_else(|| platform().public_bin_dir());
        Ok(Self {
            install_location: normalize(&install_location, home, cwd)?,
            bin_dir: normalize(&bin_dir, home, cwd)?,
            path: None,
        })
    }
}

fn config_path(env: &dyn Fn(&str) -> Option<OsString>, home: Option<&Path>) -> Option<PathBuf> {
    env(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| home.map(|h| h.join(".attic").join("config.toml")))
}

/// Expand a leading `~` and anchor relative paths at `cwd`.
fn normalize(path: &Path, home: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => {
            let home = home.ok_or_else(|| {
                anyhow!("cannot expand {}: home directory unknown", path.display())
            })?;
            home.join(rest)
        }
        Err(_) => path.to_path_buf(),
    };
    Ok(if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    })
}
