//! Keychain Services backend (`SecItem*`).
//!
//! Queries are plain `CFDictionary`s keyed by the Security framework's
//! attribute constants. The constants are `CFString`s whose contents are the
//! short codes used below (`kSecClass` is `"class"`, `kSecAttrAccount` is
//! `"acct"`, and so on), so the dictionaries are built from those codes
//! directly.
//!
//! Access-control objects are opaque. Their operations dictionary is read
//! through `SecAccessControlGetConstraints`, which the Security framework
//! exports but does not declare in its public headers.

use std::ptr;

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, CFTypeID, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::data::CFData;
use core_foundation::date::CFDate;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use security_framework_sys::keychain_item::{
    SecItemAdd, SecItemCopyMatching, SecItemDelete, SecItemUpdate,
};

use crate::access_control::AclValue;
use crate::accessibility::Accessibility;
use crate::config::StoreConfig;
use crate::error::{KeychainError, Result};
use crate::record::{AttributeKey, RawRecord, RawValue};
use crate::status;
use crate::store::{ItemSelector, ItemStore, NewItem};

#[link(name = "Security", kind = "framework")]
unsafe extern "C" {
    fn SecAccessControlGetTypeID() -> CFTypeID;
    fn SecAccessControlGetConstraints(access_control: CFTypeRef) -> CFDictionaryRef;
}

// Query keys.
const CLASS: &str = "class";
const MATCH_LIMIT: &str = "m_Limit";
const MATCH_LIMIT_ALL: &str = "m_LimitAll";
const MATCH_LIMIT_ONE: &str = "m_LimitOne";
const RETURN_ATTRIBUTES: &str = "r_Attributes";
const RETURN_DATA: &str = "r_Data";
const RETURN_PERSISTENT_REF: &str = "r_PersistentRef";
const VALUE_PERSISTENT_REF: &str = "v_PersistentRef";
const USE_DATA_PROTECTION_KEYCHAIN: &str = "nleg";

/// Seconds between the Unix epoch and the Core Foundation epoch (2001-01-01).
const CF_EPOCH_OFFSET: f64 = 978_307_200.0;

type Query = Vec<(CFString, CFType)>;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The platform keychain, reached through `SecItemCopyMatching`,
/// `SecItemAdd`, `SecItemUpdate`, and `SecItemDelete`.
#[derive(Debug, Default)]
pub struct SecItemStore;

impl SecItemStore {
    pub fn new() -> Self {
        Self
    }

    /// All items of one accessibility class.
    fn query_class(&self, config: &StoreConfig, class: Accessibility) -> Result<Vec<RawRecord>> {
        let mut query = base_query(config);
        query.push((key(AttributeKey::Accessible.code()), text(class.code())));
        query.push((key(MATCH_LIMIT), text(MATCH_LIMIT_ALL)));
        query.push((key(RETURN_ATTRIBUTES), CFBoolean::true_value().as_CFType()));
        let inline = fetch_data_inline(config);
        let returned = if inline { RETURN_DATA } else { RETURN_PERSISTENT_REF };
        query.push((key(returned), CFBoolean::true_value().as_CFType()));

        let Some(result) = copy_matching(&query)? else {
            return Ok(Vec::new());
        };
        let mut records: Vec<RawRecord> = if result.type_of() != CFArray::<CFType>::type_id() {
            record_from_dictionary(&result).into_iter().collect()
        } else {
            let items = unsafe {
                CFArray::<CFType>::wrap_under_get_rule(result.as_CFTypeRef() as CFArrayRef)
            };
            items
                .iter()
                .filter_map(|item| record_from_dictionary(&item))
                .collect()
        };

        if !inline {
            for record in &mut records {
                self.attach_data(config, record)?;
            }
        }
        Ok(records)
    }

    /// Fetch one item's data through its persistent reference.
    ///
    /// The file-based macOS keychain refuses `r_Data` together with
    /// `m_LimitAll`, so bulk queries there return references instead.
    fn attach_data(&self, config: &StoreConfig, record: &mut RawRecord) -> Result<()> {
        let Some(RawValue::Bytes(reference)) = record.get_code(VALUE_PERSISTENT_REF) else {
            return Ok(());
        };
        let mut query = base_query(config);
        query.push((
            key(VALUE_PERSISTENT_REF),
            CFData::from_buffer(reference).as_CFType(),
        ));
        query.push((key(MATCH_LIMIT), text(MATCH_LIMIT_ONE)));
        query.push((key(RETURN_DATA), CFBoolean::true_value().as_CFType()));

        match copy_matching(&query) {
            Ok(Some(data)) => {
                if let Some(data) = data.downcast::<CFData>() {
                    record.insert(AttributeKey::ValueData, data.bytes().to_vec());
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            // Items that refuse to release their data without user interaction
            // are still listed.
            Err(KeychainError::Status { code }) => {
                tracing::debug!(
                    code,
                    account = record.text(AttributeKey::Account).unwrap_or_default(),
                    "item data unavailable"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl ItemStore for SecItemStore {
    fn query_all(&self, config: &StoreConfig) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for class in &config.accessibility {
            match self.query_class(config, *class) {
                Ok(found) => {
                    tracing::debug!(class = class.code(), count = found.len(), "queried keychain");
                    records.extend(found);
                }
                Err(KeychainError::Status { code }) => {
                    tracing::warn!(
                        class = class.code(),
                        code,
                        error = %security_framework::base::Error::from_code(code),
                        "keychain query failed, skipping accessibility class"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn add(&self, config: &StoreConfig, item: &NewItem) -> Result<()> {
        let mut attributes = selector_query(config, &item.selector);
        attributes.push((
            key(AttributeKey::Accessible.code()),
            text(item.accessibility.code()),
        ));
        attributes.push((
            key(AttributeKey::ValueData.code()),
            CFData::from_buffer(&item.data).as_CFType(),
        ));
        let attributes = CFDictionary::from_CFType_pairs(&attributes);

        check(unsafe { SecItemAdd(attributes.as_concrete_TypeRef(), ptr::null_mut()) })?;
        tracing::info!(
            account = %item.selector.account,
            service = %item.selector.service,
            "added keychain item"
        );
        Ok(())
    }

    fn update(&self, config: &StoreConfig, selector: &ItemSelector, data: &[u8]) -> Result<()> {
        let query = CFDictionary::from_CFType_pairs(&selector_query(config, selector));
        let changes = CFDictionary::from_CFType_pairs(&[(
            key(AttributeKey::ValueData.code()),
            CFData::from_buffer(data).as_CFType(),
        )]);

        check(unsafe {
            SecItemUpdate(query.as_concrete_TypeRef(), changes.as_concrete_TypeRef())
        })?;
        tracing::info!(
            account = %selector.account,
            service = %selector.service,
            "updated keychain item"
        );
        Ok(())
    }

    fn delete(&self, config: &StoreConfig, selector: &ItemSelector) -> Result<()> {
        let query = CFDictionary::from_CFType_pairs(&selector_query(config, selector));

        check(unsafe { SecItemDelete(query.as_concrete_TypeRef()) })?;
        tracing::info!(
            account = %selector.account,
            service = %selector.service,
            "deleted keychain item"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Query construction
// ---------------------------------------------------------------------------

fn key(code: &'static str) -> CFString {
    CFString::from_static_string(code)
}

fn text(value: &str) -> CFType {
    CFString::new(value).as_CFType()
}

fn check(code: i32) -> Result<()> {
    if code == status::SUCCESS {
        Ok(())
    } else {
        Err(KeychainError::Status { code })
    }
}

/// Run `SecItemCopyMatching`. `errSecItemNotFound` and an empty result are
/// both `None`.
fn copy_matching(query: &Query) -> Result<Option<CFType>> {
    let query = CFDictionary::from_CFType_pairs(query);
    let mut result: CFTypeRef = ptr::null();
    let code = unsafe { SecItemCopyMatching(query.as_concrete_TypeRef(), &mut result) };
    if code == status::ITEM_NOT_FOUND {
        return Ok(None);
    }
    check(code)?;
    if result.is_null() {
        return Ok(None);
    }
    Ok(Some(unsafe { CFType::wrap_under_create_rule(result) }))
}

/// Whether bulk queries can ask for item data directly.
fn fetch_data_inline(config: &StoreConfig) -> bool {
    config.data_protection_keychain || !cfg!(target_os = "macos")
}

fn base_query(config: &StoreConfig) -> Query {
    let mut query = vec![(key(CLASS), text(config.item_class.code()))];
    if config.data_protection_keychain {
        query.push((
            key(USE_DATA_PROTECTION_KEYCHAIN),
            CFBoolean::true_value().as_CFType(),
        ));
    }
    query
}

fn selector_query(config: &StoreConfig, selector: &ItemSelector) -> Query {
    let mut query = base_query(config);
    query.push((key(AttributeKey::Account.code()), text(&selector.account)));
    query.push((key(AttributeKey::Service.code()), text(&selector.service)));
    if let Some(group) = config.effective_access_group(selector.access_group.as_deref()) {
        query.push((key(AttributeKey::AccessGroup.code()), text(group)));
    }
    query
}

// ---------------------------------------------------------------------------
// Result conversion
// ---------------------------------------------------------------------------

fn string_keyed_entries(value: &CFType) -> Option<Vec<(String, CFType)>> {
    if value.type_of() != CFDictionary::<CFType, CFType>::type_id() {
        return None;
    }
    let dict = unsafe {
        CFDictionary::<CFType, CFType>::wrap_under_get_rule(value.as_CFTypeRef() as CFDictionaryRef)
    };
    let (keys, values) = dict.get_keys_and_values();
    let entries = keys
        .into_iter()
        .zip(values)
        .filter_map(|(k, v)| {
            let k = unsafe { CFType::wrap_under_get_rule(k as CFTypeRef) };
            if k.type_of() != CFString::type_id() {
                return None;
            }
            let k = unsafe { CFString::wrap_under_get_rule(k.as_CFTypeRef() as CFStringRef) };
            let v = unsafe { CFType::wrap_under_get_rule(v as CFTypeRef) };
            Some((k.to_string(), v))
        })
        .collect();
    Some(entries)
}

fn record_from_dictionary(value: &CFType) -> Option<RawRecord> {
    let mut record = RawRecord::new();
    for (code, v) in string_keyed_entries(value)? {
        if code == AttributeKey::AccessControl.code() {
            record.insert_code(code, access_control(&v));
        } else if let Some(raw) = raw_value(&v) {
            record.insert_code(code, raw);
        }
    }
    Some(record)
}

fn raw_value(value: &CFType) -> Option<RawValue> {
    if let Some(data) = value.downcast::<CFData>() {
        return Some(RawValue::Bytes(data.bytes().to_vec()));
    }
    if let Some(s) = value.downcast::<CFString>() {
        return Some(RawValue::Text(s.to_string()));
    }
    if let Some(date) = value.downcast::<CFDate>() {
        return Some(timestamp(&date).map_or(RawValue::Absent, RawValue::Timestamp));
    }
    None
}

fn timestamp(date: &CFDate) -> Option<DateTime<FixedOffset>> {
    let unix = date.abs_time() + CF_EPOCH_OFFSET;
    let secs = unix.floor();
    let nanos = ((unix - secs) * 1e9) as u32;
    Local
        .timestamp_opt(secs as i64, nanos)
        .single()
        .map(|local| local.fixed_offset())
}

fn access_control(value: &CFType) -> RawValue {
    if value.type_of() != unsafe { SecAccessControlGetTypeID() } {
        return RawValue::Absent;
    }
    let operations = unsafe { SecAccessControlGetConstraints(value.as_CFTypeRef()) };
    if operations.is_null() {
        return RawValue::Absent;
    }
    let operations = unsafe { CFType::wrap_under_get_rule(operations as CFTypeRef) };
    match acl_value(&operations) {
        AclValue::Map(entries) => RawValue::Descriptor(entries.into()),
        _ => RawValue::Absent,
    }
}

fn acl_value(value: &CFType) -> AclValue {
    if let Some(b) = value.downcast::<CFBoolean>() {
        return AclValue::Bool(b.into());
    }
    if let Some(n) = value.downcast::<CFNumber>() {
        if let Some(n) = n.to_i64() {
            return AclValue::Integer(n);
        }
    }
    if let Some(s) = value.downcast::<CFString>() {
        return AclValue::String(s.to_string());
    }
    if let Some(data) = value.downcast::<CFData>() {
        return AclValue::Data(data.bytes().to_vec());
    }
    if value.type_of() == CFArray::<CFType>::type_id() {
        let items =
            unsafe { CFArray::<CFType>::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
        return AclValue::Array(items.iter().map(|item| acl_value(&item)).collect());
    }
    if let Some(entries) = string_keyed_entries(value) {
        return AclValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, acl_value(&v)))
                .collect(),
        );
    }
    // Constraint objects without a plain-data form keep their description so
    // that the key itself still counts as present.
    AclValue::String(format!("{value:?}"))
}
