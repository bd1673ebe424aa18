//! Raw vault records and their canonical, string-only form.
//!
//! The vault hands back one attribute dictionary per item, keyed by short
//! attribute codes (`acct`, `svce`, `pdmn`, ...) with values of mixed type.
//! [`canonicalize`] turns each of those into a [`NormalizedRecord`] with a
//! fixed set of eight string fields, ready for searching and JSON output.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::access_control::{self, AccessControlDescriptor};
use crate::accessibility;

/// Shown in place of item data that is not valid UTF-8.
pub const ENCODING_WARNING: &str = "[Warning] Encoding Shenanigans";

/// Timestamp layout used for creation and modification times, followed by
/// the zone label from [`zone_label`].
pub const TIMESTAMP_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p";

// ---------------------------------------------------------------------------
// Attribute keys
// ---------------------------------------------------------------------------

/// The vault attributes that make up a [`NormalizedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Account,
    Service,
    AccessGroup,
    CreationDate,
    ModificationDate,
    Accessible,
    ValueData,
    AccessControl,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 8] = [
        Self::Account,
        Self::Service,
        Self::AccessGroup,
        Self::CreationDate,
        Self::ModificationDate,
        Self::Accessible,
        Self::ValueData,
        Self::AccessControl,
    ];

    /// The key the vault uses in its attribute dictionaries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Account => "acct",
            Self::Service => "svce",
            Self::AccessGroup => "agrp",
            Self::CreationDate => "cdat",
            Self::ModificationDate => "mdat",
            Self::Accessible => "pdmn",
            Self::ValueData => "v_Data",
            Self::AccessControl => "accc",
        }
    }

    /// The field name this attribute is shown under.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Service => "Service",
            Self::AccessGroup => "Access Group",
            Self::CreationDate => "Creation Time",
            Self::ModificationDate => "Modification Time",
            Self::Accessible => "Protection",
            Self::ValueData => "Data",
            Self::AccessControl => "AccessControl",
        }
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// A single attribute value as returned by the vault.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bytes(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    /// Plain strings and short codes.
    Text(String),
    Descriptor(AccessControlDescriptor),
    Absent,
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<DateTime<FixedOffset>> for RawValue {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<AccessControlDescriptor> for RawValue {
    fn from(acl: AccessControlDescriptor) -> Self {
        Self::Descriptor(acl)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// One vault item before normalization.
///
/// Attributes are keyed by vault code. Codes outside [`AttributeKey`] are
/// kept but never read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    attributes: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a known attribute.
    pub fn with(mut self, key: AttributeKey, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: AttributeKey, value: impl Into<RawValue>) {
        self.attributes.insert(key.code().to_string(), value.into());
    }

    /// Insert an attribute by raw vault code.
    pub fn insert_code(&mut self, code: impl Into<String>, value: impl Into<RawValue>) {
        self.attributes.insert(code.into(), value.into());
    }

    pub fn get(&self, key: AttributeKey) -> Option<&RawValue> {
        self.attributes.get(key.code())
    }

    pub fn get_code(&self, code: &str) -> Option<&RawValue> {
        self.attributes.get(code)
    }

    /// The item's text value for `key`, if it is stored as text.
    pub fn text(&self, key: AttributeKey) -> Option<&str> {
        match self.get(key) {
            Some(RawValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

/// A vault item with every field rendered as a string.
///
/// Serializes to exactly eight keys, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Access Group")]
    pub access_group: String,
    #[serde(rename = "Creation Time")]
    pub creation_time: String,
    #[serde(rename = "Modification Time")]
    pub modification_time: String,
    #[serde(rename = "Protection")]
    pub protection: String,
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "AccessControl")]
    pub access_control: String,
}

impl NormalizedRecord {
    /// The value shown under `key`'s field name.
    pub fn field(&self, key: AttributeKey) -> &str {
        match key {
            AttributeKey::Account => &self.account,
            AttributeKey::Service => &self.service,
            AttributeKey::AccessGroup => &self.access_group,
            AttributeKey::CreationDate => &self.creation_time,
            AttributeKey::ModificationDate => &self.modification_time,
            AttributeKey::Accessible => &self.protection,
            AttributeKey::ValueData => &self.data,
            AttributeKey::AccessControl => &self.access_control,
        }
    }

    /// `(field name, value)` pairs in display order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        AttributeKey::ALL
            .into_iter()
            .map(move |k| (k.field_name(), self.field(k)))
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Normalize a batch of vault records, preserving order.
pub fn canonicalize(records: &[RawRecord]) -> Vec<NormalizedRecord> {
    records.iter().map(canonicalize_record).collect()
}

/// Normalize one vault record. Never fails.
pub fn canonicalize_record(record: &RawRecord) -> NormalizedRecord {
    let field = |key: AttributeKey| render_field(key, record.get(key));
    NormalizedRecord {
        account: field(AttributeKey::Account),
        service: field(AttributeKey::Service),
        access_group: field(AttributeKey::AccessGroup),
        creation_time: field(AttributeKey::CreationDate),
        modification_time: field(AttributeKey::ModificationDate),
        protection: field(AttributeKey::Accessible),
        data: field(AttributeKey::ValueData),
        access_control: field(AttributeKey::AccessControl),
    }
}

/// Render one attribute value for the given field.
pub fn render_field(key: AttributeKey, value: Option<&RawValue>) -> String {
    let value = value.unwrap_or(&RawValue::Absent);
    match (key, value) {
        (_, RawValue::Descriptor(acl)) => access_control::decode(Some(acl)),
        (AttributeKey::AccessControl, _) => access_control::decode(None),
        (_, RawValue::Text(text)) => accessibility::describe_code(text),
        (_, RawValue::Bytes(bytes)) => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => ENCODING_WARNING.to_string(),
        },
        (_, RawValue::Timestamp(ts)) => {
            format!("{} {}", ts.format(TIMESTAMP_FORMAT), zone_label(ts.offset()))
        }
        (_, RawValue::Absent) => String::new(),
    }
}

/// Short GMT-relative zone name: `GMT`, `GMT+5:30`, `GMT-8`.
pub fn zone_label(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "GMT".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    match (minutes / 60, minutes % 60) {
        (hours, 0) => format!("GMT{sign}{hours}"),
        (hours, mins) => format!("GMT{sign}{hours}:{mins:02}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::AclValue;
    use chrono::TimeZone;

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn end_to_end_example() {
        let raw = RawRecord::new()
            .with(AttributeKey::Account, "alice")
            .with(AttributeKey::Service, "mail")
            .with(AttributeKey::Accessible, "ak")
            .with(AttributeKey::ValueData, b"secret".to_vec())
            .with(AttributeKey::AccessControl, RawValue::Absent);

        let out = canonicalize_record(&raw);
        assert_eq!(
            out,
            NormalizedRecord {
                account: "alice".into(),
                service: "mail".into(),
                access_group: "".into(),
                creation_time: "".into(),
                modification_time: "".into(),
                protection: "kSecAttrAccessibleWhenUnlocked".into(),
                data: "secret".into(),
                access_control: "Not Applicable".into(),
            }
        );
    }

    #[test]
    fn empty_record_has_all_fields() {
        let out = canonicalize_record(&RawRecord::new());
        assert_eq!(out.fields().count(), 8);
        assert_eq!(out.access_control, "Not Applicable");
        for (name, value) in out.fields() {
            if name != "AccessControl" {
                assert_eq!(value, "", "field {name}");
            }
        }
    }

    #[test]
    fn extra_attributes_are_ignored() {
        let mut raw = RawRecord::new().with(AttributeKey::Account, "bob");
        raw.insert_code("labl", "My Label");
        raw.insert_code("sync", RawValue::Bytes(vec![0xff]));

        let out = canonicalize_record(&raw);
        assert_eq!(out.account, "bob");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn invalid_utf8_yields_sentinel() {
        let raw = RawRecord::new().with(AttributeKey::ValueData, vec![0xc3, 0x28, 0xff]);
        let out = canonicalize_record(&raw);
        assert_eq!(out.data, ENCODING_WARNING);
        assert!(!out.data.is_empty());
    }

    #[test]
    fn timestamps_are_formatted() {
        let ts = utc_offset().with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap();
        let raw = RawRecord::new()
            .with(AttributeKey::CreationDate, ts)
            .with(AttributeKey::ModificationDate, ts);
        let out = canonicalize_record(&raw);
        assert_eq!(out.creation_time, "Jan 02, 2024, 03:04:05 PM GMT");
        assert_eq!(out.modification_time, out.creation_time);
    }

    #[test]
    fn timestamps_keep_their_offset() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let ts = offset.with_ymd_and_hms(2023, 11, 30, 9, 0, 0).unwrap();
        let out = render_field(AttributeKey::CreationDate, Some(&RawValue::Timestamp(ts)));
        assert_eq!(out, "Nov 30, 2023, 09:00:00 AM GMT+5:30");
    }

    #[test]
    fn zone_labels() {
        let label = |secs| zone_label(&FixedOffset::east_opt(secs).unwrap());
        assert_eq!(label(0), "GMT");
        assert_eq!(label(-8 * 3600), "GMT-8");
        assert_eq!(label(9 * 3600 + 2700), "GMT+9:45");
    }

    #[test]
    fn protection_codes_expand() {
        for class in crate::Accessibility::ALL {
            let raw = RawRecord::new().with(AttributeKey::Accessible, class.code());
            assert_eq!(canonicalize_record(&raw).protection, class.constant_name());
        }
        let raw = RawRecord::new().with(AttributeKey::Accessible, "custom");
        assert_eq!(canonicalize_record(&raw).protection, "custom");
    }

    #[test]
    fn short_codes_expand_in_any_text_field() {
        let raw = RawRecord::new()
            .with(AttributeKey::Account, "ak")
            .with(AttributeKey::Service, "cku")
            .with(AttributeKey::AccessGroup, "com.example.shared");
        let out = canonicalize_record(&raw);
        assert_eq!(out.account, "kSecAttrAccessibleWhenUnlocked");
        assert_eq!(out.service, "kSecAttrAccessibleAfterFirstUnlockThisDeviceOnly");
        assert_eq!(out.access_group, "com.example.shared");
    }

    #[test]
    fn access_control_descriptor_is_decoded() {
        let acl = AccessControlDescriptor::new().with("prp", AclValue::Bool(true));
        let raw = RawRecord::new().with(AttributeKey::AccessControl, acl);
        assert_eq!(canonicalize_record(&raw).access_control, "ApplicationPassword");
    }

    #[test]
    fn non_descriptor_access_control_is_not_applicable() {
        let raw = RawRecord::new().with(AttributeKey::AccessControl, vec![1u8, 2, 3]);
        assert_eq!(canonicalize_record(&raw).access_control, "Not Applicable");
    }

    #[test]
    fn canonicalize_preserves_order() {
        let records: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| RawRecord::new().with(AttributeKey::Account, name))
            .collect();
        let out = canonicalize(&records);
        let names: Vec<_> = out.iter().map(|r| r.account.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn json_uses_display_field_names() {
        let out = NormalizedRecord {
            account: "alice".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.starts_with(r#"{"Account":"alice","Service":"","Access Group":"""#));
        assert!(json.contains(r#""Creation Time":"""#));
        assert!(json.ends_with(r#""AccessControl":""}"#));
    }
}
