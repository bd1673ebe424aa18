//! Configuration loading.
//!
//! Settings come from an optional TOML file:
//!
//! ```toml
//! [keychain]
//! item_class = "generic_password"
//! access_group = "TEAMID.com.example.shared"
//! accessibility = ["ak", "cku"]
//! data_protection_keychain = false
//!
//! [log]
//! level = "info"
//! ```
//!
//! The file is taken from `--config`, else `$KEYCHAINEDITOR_CONFIG`. Without
//! either, or for any absent key, the defaults of [`StoreConfig`] apply.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use keychaineditor_core::{Accessibility, ItemClass, StoreConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "KEYCHAINEDITOR_CONFIG";

/// Log level used when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Everything the binary reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log_level: Option<String>,
}

/// Resolve and load the configuration file, if any.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    match path {
        Some(path) => load_file(&path),
        None => Ok(AppConfig::default()),
    }
}

/// Load configuration from a specific file.
pub fn load_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<AppConfig> {
    let table: toml::Table = content.parse().context("malformed TOML")?;
    let mut config = AppConfig::default();

    if let Some(keychain) = table.get("keychain") {
        let Some(keychain) = keychain.as_table() else {
            bail!("[keychain] must be a table");
        };
        apply_keychain(keychain, &mut config.store)?;
    }

    if let Some(level) = table
        .get("log")
        .and_then(|v| v.as_table())
        .and_then(|log| log.get("level"))
    {
        let Some(level) = level.as_str() else {
            bail!("log.level must be a string");
        };
        config.log_level = Some(level.to_string());
    }

    Ok(config)
}

fn apply_keychain(keychain: &toml::Table, store: &mut StoreConfig) -> Result<()> {
    if let Some(value) = keychain.get("item_class") {
        let name = value.as_str().context("keychain.item_class must be a string")?;
        store.item_class = ItemClass::parse(name)
            .with_context(|| format!("unknown item class {name:?}"))?;
    }

    if let Some(value) = keychain.get("access_group") {
        let group = value
            .as_str()
            .context("keychain.access_group must be a string")?;
        store.access_group = (!group.is_empty()).then(|| group.to_string());
    }

    if let Some(value) = keychain.get("accessibility") {
        let entries = value
            .as_array()
            .context("keychain.accessibility must be an array")?;
        let mut classes = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry
                .as_str()
                .context("keychain.accessibility entries must be strings")?;
            let class = Accessibility::parse(name)
                .with_context(|| format!("unknown accessibility class {name:?}"))?;
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        store.accessibility = classes;
    }

    if let Some(value) = keychain.get("data_protection_keychain") {
        store.data_protection_keychain = value
            .as_bool()
            .context("keychain.data_protection_keychain must be a boolean")?;
    }

    Ok(())
}
