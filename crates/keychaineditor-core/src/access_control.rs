//! Access-control descriptor decoding.
//!
//! An item protected with `SecAccessControl` carries an opaque nested
//! dictionary of operations and the constraints required to perform them.
//! [`decode`] turns that structure into a short phrase such as
//! `"UserPresence Or TouchIDAny"`.
//!
//! # Layout
//!
//! ```text
//! {
//!   "od":   { "cpo": true, "pkofn": 1, "cbio": [<uuid>] },   // decrypt
//!   "osgn": { ... },                                         // sign
//!   "prp":  ...,                                             // app password
//!   "dacl": ...,                                             // default ACL
//! }
//! ```
//!
//! Categories are inspected in the order `dacl`, `od`, `osgn`, `prp`, and
//! constraints in the order `cpo`, `cup`, `pkofn`, `cbio`, so the same
//! descriptor always produces the same phrase.

use std::collections::BTreeMap;

/// Returned for items stored without any access-control object.
pub const NOT_APPLICABLE: &str = "Not Applicable";

/// Returned when the descriptor carries the default ACL.
pub const DEFAULT_ACL: &str = "Default ACL";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One value inside an access-control descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum AclValue {
    Bool(bool),
    Integer(i64),
    String(String),
    Data(Vec<u8>),
    Array(Vec<AclValue>),
    Map(BTreeMap<String, AclValue>),
}

impl AclValue {
    /// Number of elements for collection-like values.
    ///
    /// Scalars have no element count.
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            Self::Data(bytes) => Some(bytes.len()),
            Self::Bool(_) | Self::Integer(_) | Self::String(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AclValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// The operations dictionary of a `SecAccessControl` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessControlDescriptor {
    operations: BTreeMap<String, AclValue>,
}

impl AccessControlDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a top-level category.
    pub fn with(mut self, category: impl Into<String>, value: AclValue) -> Self {
        self.operations.insert(category.into(), value);
        self
    }

    pub fn get(&self, category: &str) -> Option<&AclValue> {
        self.operations.get(category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.operations.contains_key(category)
    }
}

impl From<BTreeMap<String, AclValue>> for AccessControlDescriptor {
    fn from(operations: BTreeMap<String, AclValue>) -> Self {
        Self { operations }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Describe the authentication policy of an item.
///
/// `None` means the item has no access-control object at all and yields
/// [`NOT_APPLICABLE`]. A descriptor with no recognized category yields an
/// empty string.
pub fn decode(descriptor: Option<&AccessControlDescriptor>) -> String {
    let Some(descriptor) = descriptor else {
        return NOT_APPLICABLE.to_string();
    };

    if descriptor.contains("dacl") {
        return DEFAULT_ACL.to_string();
    }

    let mut fragments: Vec<&'static str> = Vec::new();

    if let Some(od) = descriptor.get("od") {
        constraint_fragments(od, &mut fragments);
    }

    if descriptor.contains("osgn") {
        fragments.push("PrivateKeyUsage");
        // The signing category reuses the constraints recorded under `od`.
        if let Some(od) = descriptor.get("od") {
            constraint_fragments(od, &mut fragments);
        }
    }

    if descriptor.contains("prp") {
        fragments.push("ApplicationPassword");
    }

    fragments.join(" ")
}

fn constraint_fragments(value: &AclValue, fragments: &mut Vec<&'static str>) {
    let Some(constraints) = value.as_map() else {
        return;
    };

    if constraints.contains_key("cpo") {
        fragments.push("UserPresence");
    }
    if constraints.contains_key("cup") {
        fragments.push("DevicePasscode");
    }
    if let Some(kofn) = constraints.get("pkofn") {
        fragments.push(if kofn.as_integer() == Some(1) { "Or" } else { "And" });
    }
    if let Some(bio) = constraints.get("cbio") {
        fragments.push(if bio.element_count() == Some(1) {
            "TouchIDAny"
        } else {
            "TouchIDCurrentSet"
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(entries: &[(&str, AclValue)]) -> AclValue {
        AclValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn null_descriptor_is_not_applicable() {
        assert_eq!(decode(None), "Not Applicable");
    }

    #[test]
    fn default_acl_short_circuits() {
        let acl = AccessControlDescriptor::new().with("dacl", AclValue::Bool(true));
        assert_eq!(decode(Some(&acl)), "Default ACL");

        let acl = acl
            .with("od", constraints(&[("cpo", AclValue::Bool(true))]))
            .with("prp", AclValue::Bool(true));
        assert_eq!(decode(Some(&acl)), "Default ACL");
    }

    #[test]
    fn and_composition() {
        let acl = AccessControlDescriptor::new().with(
            "od",
            constraints(&[
                ("cpo", AclValue::Bool(true)),
                ("cup", AclValue::Bool(true)),
                ("pkofn", AclValue::Integer(0)),
            ]),
        );
        assert_eq!(decode(Some(&acl)), "UserPresence DevicePasscode And");
    }

    #[test]
    fn or_composition() {
        let acl = AccessControlDescriptor::new().with(
            "od",
            constraints(&[
                ("cpo", AclValue::Bool(true)),
                ("cup", AclValue::Bool(true)),
                ("pkofn", AclValue::Integer(1)),
            ]),
        );
        let phrase = decode(Some(&acl));
        assert!(phrase.contains("Or"));
        assert!(!phrase.contains("And"));
    }

    #[test]
    fn touch_id_arity() {
        let one = AccessControlDescriptor::new().with(
            "od",
            constraints(&[
                ("cpo", AclValue::Bool(true)),
                ("pkofn", AclValue::Integer(1)),
                ("cbio", AclValue::Array(vec![AclValue::Data(vec![7; 16])])),
            ]),
        );
        assert_eq!(decode(Some(&one)), "UserPresence Or TouchIDAny");

        let two = AccessControlDescriptor::new().with(
            "od",
            constraints(&[(
                "cbio",
                AclValue::Array(vec![AclValue::Data(vec![1]), AclValue::Data(vec![2])]),
            )]),
        );
        assert_eq!(decode(Some(&two)), "TouchIDCurrentSet");
    }

    #[test]
    fn private_key_usage_reads_od_constraints() {
        let acl = AccessControlDescriptor::new()
            .with("osgn", constraints(&[("cup", AclValue::Bool(true))]))
            .with("od", constraints(&[("cpo", AclValue::Bool(true))]));
        assert_eq!(
            decode(Some(&acl)),
            "UserPresence PrivateKeyUsage UserPresence"
        );
    }

    #[test]
    fn private_key_usage_without_od() {
        let acl = AccessControlDescriptor::new()
            .with("osgn", constraints(&[("cup", AclValue::Bool(true))]));
        assert_eq!(decode(Some(&acl)), "PrivateKeyUsage");
    }

    #[test]
    fn application_password() {
        let acl = AccessControlDescriptor::new().with("prp", AclValue::Bool(true));
        assert_eq!(decode(Some(&acl)), "ApplicationPassword");
    }

    #[test]
    fn unrecognized_categories_yield_empty() {
        let acl = AccessControlDescriptor::new().with("oe", AclValue::Bool(true));
        assert_eq!(decode(Some(&acl)), "");
        assert_eq!(decode(Some(&AccessControlDescriptor::new())), "");
    }

    #[test]
    fn unrecognized_constraints_are_ignored() {
        let acl = AccessControlDescriptor::new().with(
            "od",
            constraints(&[("cpo", AclValue::Bool(true)), ("ckon", AclValue::Bool(true))]),
        );
        assert_eq!(decode(Some(&acl)), "UserPresence");
    }

    #[test]
    fn non_map_constraints_yield_nothing() {
        let acl = AccessControlDescriptor::new().with("od", AclValue::Bool(true));
        assert_eq!(decode(Some(&acl)), "");
    }
}
