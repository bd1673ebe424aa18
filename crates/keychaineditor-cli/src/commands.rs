//! Subcommand implementations.
//!
//! Each command takes the store and configuration explicitly and returns the
//! text to print, which keeps them testable against [`MemoryStore`].
//!
//! [`MemoryStore`]: keychaineditor_core::MemoryStore

use anyhow::{Context, Result};
use keychaineditor_core::encoding::decode_if_base64;
use keychaineditor_core::status::{self, status_message};
use keychaineditor_core::{
    Accessibility, ItemSelector, ItemStore, KeychainError, NewItem, NormalizedRecord,
    StoreConfig, canonicalize, search,
};
use tracing::{debug, info};

use crate::cli::Target;

/// What a mutating command prints, and whether the vault accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub success: bool,
}

impl Outcome {
    fn from_result(result: keychaineditor_core::Result<()>) -> Result<Self> {
        match result {
            Ok(()) => Ok(Self {
                message: status_message(status::SUCCESS),
                success: true,
            }),
            Err(KeychainError::Status { code }) => Ok(Self {
                message: status_message(code),
                success: false,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn version() -> String {
    format!("KeychainEditor Version = {}", env!("CARGO_PKG_VERSION"))
}

/// Every item, normalized.
pub fn collect(store: &dyn ItemStore, config: &StoreConfig) -> Result<Vec<NormalizedRecord>> {
    let raw = store
        .query_all(config)
        .context("failed to query the keychain")?;
    debug!(count = raw.len(), "fetched keychain items");
    Ok(canonicalize(&raw))
}

/// The whole keychain as pretty-printed JSON.
pub fn dump(store: &dyn ItemStore, config: &StoreConfig) -> Result<String> {
    to_json(&collect(store, config)?)
}

/// The items matching `query` as pretty-printed JSON.
pub fn find(store: &dyn ItemStore, config: &StoreConfig, query: &str) -> Result<String> {
    let items = search::search(query, collect(store, config)?);
    to_json(&items)
}

pub fn edit(
    store: &dyn ItemStore,
    config: &StoreConfig,
    target: &Target,
    data: &str,
) -> Result<Outcome> {
    let data = decode_if_base64(data);
    let selector = selector(target);
    info!(account = %selector.account, service = %selector.service, "editing keychain item");
    Outcome::from_result(store.update(config, &selector, data.as_bytes()))
}

pub fn delete(store: &dyn ItemStore, config: &StoreConfig, target: &Target) -> Result<Outcome> {
    let selector = selector(target);
    info!(account = %selector.account, service = %selector.service, "deleting keychain item");
    Outcome::from_result(store.delete(config, &selector))
}

pub fn add(
    store: &dyn ItemStore,
    config: &StoreConfig,
    target: &Target,
    data: &str,
    protection: &str,
) -> Result<Outcome> {
    let accessibility = Accessibility::parse(protection)
        .with_context(|| format!("unknown protection class {protection:?}"))?;
    let item = NewItem {
        selector: selector(target),
        accessibility,
        data: decode_if_base64(data).into_bytes(),
    };
    info!(
        account = %item.selector.account,
        service = %item.selector.service,
        protection = accessibility.code(),
        "adding keychain item"
    );
    Outcome::from_result(store.add(config, &item))
}

fn selector(target: &Target) -> ItemSelector {
    ItemSelector::new(&target.account, &target.service).with_access_group(target.agroup.clone())
}

fn to_json(items: &[NormalizedRecord]) -> Result<String> {
    serde_json::to_string_pretty(items).context("failed to serialize keychain items")
}
