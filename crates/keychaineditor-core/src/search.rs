//! Case- and diacritic-insensitive filtering of normalized records.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::record::{AttributeKey, NormalizedRecord};

/// Fields consulted by [`search`].
pub const SEARCH_FIELDS: [AttributeKey; 4] = [
    AttributeKey::Account,
    AttributeKey::Service,
    AttributeKey::AccessGroup,
    AttributeKey::Accessible,
];

/// Whether `record` matches `query` in any of the [`SEARCH_FIELDS`].
pub fn matches(record: &NormalizedRecord, query: &str) -> bool {
    let needle = fold(query);
    SEARCH_FIELDS
        .iter()
        .any(|key| fold(record.field(*key)).contains(&needle))
}

/// Lowercase `text` and strip combining marks after canonical decomposition,
/// so `"Café"` and `"cafe"` compare equal.
fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Keep the records that match `query`, preserving order.
///
/// An empty query matches every record.
pub fn search(query: &str, records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let before = records.len();
    let found: Vec<_> = records
        .into_iter()
        .filter(|record| matches(record, query))
        .collect();
    tracing::debug!(query, before, after = found.len(), "filtered keychain items");
    found
}
