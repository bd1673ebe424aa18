//! The boundary to the platform vault.
//!
//! [`ItemStore`] abstracts over the four primitives the tool needs: a bulk
//! query, add, update, and delete. On Apple platforms [`platform_store`]
//! returns the `SecItem` backend; elsewhere there is no vault to talk to.
//!
//! [`MemoryStore`] keeps raw records in memory so the command layer can be
//! exercised without a keychain. It reports the same status codes the vault
//! does for missing and duplicate items but enforces no protection at all.

use std::sync::Mutex;

use crate::accessibility::Accessibility;
use crate::config::StoreConfig;
use crate::error::{KeychainError, Result};
use crate::record::{AttributeKey, RawRecord, RawValue};
use crate::status;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifies an existing item: account and service, optionally narrowed by
/// access group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSelector {
    pub account: String,
    pub service: String,
    pub access_group: Option<String>,
}

impl ItemSelector {
    pub fn new(account: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            service: service.into(),
            access_group: None,
        }
    }

    pub fn with_access_group(mut self, group: Option<String>) -> Self {
        self.access_group = group;
        self
    }
}

/// A new item to add to the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub selector: ItemSelector,
    pub accessibility: Accessibility,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Access to the platform credential store.
///
/// Every call that the vault rejects fails with [`KeychainError::Status`]
/// carrying the vault's result code.
pub trait ItemStore: Send + Sync {
    /// Fetch every item of the configured class, attributes and data
    /// included.
    fn query_all(&self, config: &StoreConfig) -> Result<Vec<RawRecord>>;

    /// Add a new item.
    fn add(&self, config: &StoreConfig, item: &NewItem) -> Result<()>;

    /// Replace the data of an existing item.
    fn update(&self, config: &StoreConfig, selector: &ItemSelector, data: &[u8]) -> Result<()>;

    /// Remove an existing item.
    fn delete(&self, config: &StoreConfig, selector: &ItemSelector) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Returns the vault for the current platform.
///
/// - **Apple platforms**: [`SecItemStore`](crate::apple::SecItemStore)
/// - **Other platforms**: [`KeychainError::UnsupportedPlatform`]
pub fn platform_store() -> Result<Box<dyn ItemStore>> {
    #[cfg(target_vendor = "apple")]
    {
        tracing::debug!("using SecItem keychain backend");
        Ok(Box::new(crate::apple::SecItemStore::new()))
    }
    #[cfg(not(target_vendor = "apple"))]
    {
        Err(KeychainError::UnsupportedPlatform)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory stand-in for the vault.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RawRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `records`.
    pub fn with_records(records: Vec<RawRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of everything currently held.
    pub fn snapshot(&self) -> Result<Vec<RawRecord>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<RawRecord>>> {
        self.records
            .lock()
            .map_err(|e| KeychainError::Internal(format!("memory store poisoned: {e}")))
    }

    fn class_matches(config: &StoreConfig, record: &RawRecord) -> bool {
        match record.get_code("class") {
            Some(RawValue::Text(class)) => class == config.item_class.code(),
            _ => true,
        }
    }

    fn selects(config: &StoreConfig, selector: &ItemSelector, record: &RawRecord) -> bool {
        if !Self::class_matches(config, record) {
            return false;
        }
        if record.text(AttributeKey::Account).unwrap_or("") != selector.account
            || record.text(AttributeKey::Service).unwrap_or("") != selector.service
        {
            return false;
        }
        match config.effective_access_group(selector.access_group.as_deref()) {
            Some(group) => record.text(AttributeKey::AccessGroup) == Some(group),
            None => true,
        }
    }
}

impl ItemStore for MemoryStore {
    fn query_all(&self, config: &StoreConfig) -> Result<Vec<RawRecord>> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|r| Self::class_matches(config, r))
            .filter(|r| {
                let code = r.text(AttributeKey::Accessible).unwrap_or("");
                config.accessibility.iter().any(|a| a.code() == code)
            })
            .cloned()
            .collect())
    }

    fn add(&self, config: &StoreConfig, item: &NewItem) -> Result<()> {
        let mut records = self.lock()?;
        if records
            .iter()
            .any(|r| Self::selects(config, &item.selector, r))
        {
            return Err(KeychainError::Status {
                code: status::DUPLICATE_ITEM,
            });
        }

        let mut record = RawRecord::new()
            .with(AttributeKey::Account, item.selector.account.as_str())
            .with(AttributeKey::Service, item.selector.service.as_str())
            .with(AttributeKey::Accessible, item.accessibility.code())
            .with(AttributeKey::ValueData, item.data.clone());
        if let Some(group) = config.effective_access_group(item.selector.access_group.as_deref()) {
            record.insert(AttributeKey::AccessGroup, group);
        }
        record.insert_code("class", config.item_class.code());
        records.push(record);
        Ok(())
    }

    fn update(&self, config: &StoreConfig, selector: &ItemSelector, data: &[u8]) -> Result<()> {
        let mut records = self.lock()?;
        let mut updated = 0usize;
        for record in records
            .iter_mut()
            .filter(|r| Self::selects(config, selector, r))
        {
            record.insert(AttributeKey::ValueData, data.to_vec());
            updated += 1;
        }
        if updated == 0 {
            return Err(KeychainError::Status {
                code: status::ITEM_NOT_FOUND,
            });
        }
        Ok(())
    }

    fn delete(&self, config: &StoreConfig, selector: &ItemSelector) -> Result<()> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| !Self::selects(config, selector, r));
        if records.len() == before {
            return Err(KeychainError::Status {
                code: status::ITEM_NOT_FOUND,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
