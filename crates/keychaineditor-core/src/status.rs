//! Human-readable messages for vault result codes.

/// `errSecSuccess`.
pub const SUCCESS: i32 = 0;
/// `errSecParam`.
pub const PARAM: i32 = -50;
/// `errSecAuthFailed`.
pub const AUTH_FAILED: i32 = -25293;
/// `errSecDuplicateItem`.
pub const DUPLICATE_ITEM: i32 = -25299;
/// `errSecItemNotFound`.
pub const ITEM_NOT_FOUND: i32 = -25300;
/// `errSecInteractionNotAllowed`, returned while the device is locked.
pub const INTERACTION_NOT_ALLOWED: i32 = -25308;
/// `errSecMissingEntitlement`: the binary lacks the keychain entitlements.
pub const MISSING_ENTITLEMENT: i32 = -34018;
/// Reported when an access-control object could not be created.
pub const ACCESS_CONTROL_FAILED: i32 = -1;

/// Message printed for the outcome of an add, edit, or delete.
pub fn status_message(code: i32) -> String {
    match code {
        SUCCESS => "Operation successfully completed.".into(),
        ITEM_NOT_FOUND => "Item not found.".into(),
        INTERACTION_NOT_ALLOWED => "Device locked. Item unavailable.".into(),
        AUTH_FAILED => "Authentication/Authorization failed.".into(),
        PARAM => "One or more parameters passed to the function were not valid.".into(),
        DUPLICATE_ITEM => "The item already exists.".into(),
        MISSING_ENTITLEMENT => "Entitlement not found. Please refer README.".into(),
        ACCESS_CONTROL_FAILED => "Error in SecAccessControl!".into(),
        other => format!(
            "Unhandled Error: Please contact developer to report this error. Error code: {other}"
        ),
    }
}
