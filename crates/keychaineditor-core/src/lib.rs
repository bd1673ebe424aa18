//! Keychain record canonicalization and access-control decoding.
//!
//! The platform keychain returns items as dictionaries of loosely typed
//! attributes. This crate turns them into a fixed, string-only shape that is
//! easy to search and print, and decodes the opaque access-control
//! descriptors attached to protected items into short readable phrases.
//!
//! # Modules
//!
//! - [`record`] — raw vault records and the canonicalizer.
//! - [`access_control`] — access-control descriptor decoding.
//! - [`accessibility`] — `kSecAttrAccessible` short codes.
//! - [`search`] — case- and diacritic-insensitive record filtering.
//! - [`store`] — the [`ItemStore`] boundary to the vault.
//! - [`config`] — per-call vault settings.
//! - [`status`] — messages for vault result codes.
//! - [`encoding`] — decoding of user-supplied item data.
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust
//! use keychaineditor_core::record::{canonicalize, AttributeKey, RawRecord};
//!
//! let raw = RawRecord::new()
//!     .with(AttributeKey::Account, "alice")
//!     .with(AttributeKey::Service, "mail")
//!     .with(AttributeKey::Accessible, "ak")
//!     .with(AttributeKey::ValueData, b"secret".to_vec());
//!
//! let items = canonicalize(&[raw]);
//! assert_eq!(items[0].protection, "kSecAttrAccessibleWhenUnlocked");
//! assert_eq!(items[0].data, "secret");
//! assert_eq!(items[0].access_control, "Not Applicable");
//! ```

pub mod access_control;
pub mod accessibility;
#[cfg(target_vendor = "apple")]
pub mod apple;
pub mod config;
pub mod encoding;
pub mod error;
pub mod record;
pub mod search;
pub mod status;
pub mod store;

pub use access_control::{AccessControlDescriptor, AclValue};
pub use accessibility::Accessibility;
pub use config::{ItemClass, StoreConfig};
pub use error::{KeychainError, Result};
pub use record::{AttributeKey, NormalizedRecord, RawRecord, RawValue, canonicalize};
pub use store::{ItemSelector, ItemStore, MemoryStore, NewItem, platform_store};
