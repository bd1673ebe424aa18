//! Per-call vault configuration.
//!
//! Every [`ItemStore`](crate::store::ItemStore) operation receives a
//! [`StoreConfig`] explicitly instead of relying on defaulted parameters.

use std::fmt;

use crate::accessibility::Accessibility;

/// The `kSecClass` of the items being managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemClass {
    #[default]
    GenericPassword,
    InternetPassword,
}

impl ItemClass {
    /// The value of the corresponding `kSecClass*` constant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GenericPassword => "genp",
            Self::InternetPassword => "inet",
        }
    }

    /// Parse a configuration value (`generic_password`, `internet_password`,
    /// or the raw class code).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "generic_password" | "genp" => Some(Self::GenericPassword),
            "internet_password" | "inet" => Some(Self::InternetPassword),
            _ => None,
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GenericPassword => "generic_password",
            Self::InternetPassword => "internet_password",
        })
    }
}

/// Settings shared by every vault call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Class of items to dump, add, edit, and delete.
    pub item_class: ItemClass,
    /// Access group applied when a command does not name one.
    pub access_group: Option<String>,
    /// Accessibility classes queried by a full dump, in query order.
    pub accessibility: Vec<Accessibility>,
    /// Target the data protection keychain (`kSecUseDataProtectionKeychain`)
    /// on macOS. Ignored elsewhere.
    pub data_protection_keychain: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            item_class: ItemClass::GenericPassword,
            access_group: None,
            accessibility: Accessibility::ALL.to_vec(),
            data_protection_keychain: false,
        }
    }
}

impl StoreConfig {
    /// The access group to use for a call: an explicit one wins over the
    /// configured default.
    pub fn effective_access_group<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.access_group.as_deref())
    }
}
