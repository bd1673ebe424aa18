//! Accessibility classes (`kSecAttrAccessible`).
//!
//! The vault reports an item's accessibility as a short code such as `ak`.
//! Each code has exactly one long constant name, which is what gets shown to
//! the user in the `Protection` field.

use std::fmt;

/// When a keychain item may be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    /// `ak`
    #[default]
    WhenUnlocked,
    /// `ck`
    AfterFirstUnlock,
    /// `dk`
    Always,
    /// `aku`
    WhenUnlockedThisDeviceOnly,
    /// `cku`
    AfterFirstUnlockThisDeviceOnly,
    /// `dku`
    AlwaysThisDeviceOnly,
    /// `akpu`
    WhenPasscodeSetThisDeviceOnly,
}

impl Accessibility {
    /// Every class, in the order the bulk dump queries them.
    pub const ALL: [Accessibility; 7] = [
        Self::AfterFirstUnlock,
        Self::AfterFirstUnlockThisDeviceOnly,
        Self::Always,
        Self::WhenPasscodeSetThisDeviceOnly,
        Self::AlwaysThisDeviceOnly,
        Self::WhenUnlocked,
        Self::WhenUnlockedThisDeviceOnly,
    ];

    /// The short code stored by the vault.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WhenUnlocked => "ak",
            Self::AfterFirstUnlock => "ck",
            Self::Always => "dk",
            Self::WhenUnlockedThisDeviceOnly => "aku",
            Self::AfterFirstUnlockThisDeviceOnly => "cku",
            Self::AlwaysThisDeviceOnly => "dku",
            Self::WhenPasscodeSetThisDeviceOnly => "akpu",
        }
    }

    /// The Security framework constant name.
    pub fn constant_name(&self) -> &'static str {
        match self {
            Self::WhenUnlocked => "kSecAttrAccessibleWhenUnlocked",
            Self::AfterFirstUnlock => "kSecAttrAccessibleAfterFirstUnlock",
            Self::Always => "kSecAttrAccessibleAlways",
            Self::WhenUnlockedThisDeviceOnly => "kSecAttrAccessibleWhenUnlockedThisDeviceOnly",
            Self::AfterFirstUnlockThisDeviceOnly => {
                "kSecAttrAccessibleAfterFirstUnlockThisDeviceOnly"
            }
            Self::AlwaysThisDeviceOnly => "kSecAttrAccessibleAlwaysThisDeviceOnly",
            Self::WhenPasscodeSetThisDeviceOnly => {
                "kSecAttrAccessibleWhenPasscodeSetThisDeviceOnly"
            }
        }
    }

    /// Look up a class by its vault short code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() == code)
    }

    /// Parse user input: either the short code or the constant name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.code() == s || a.constant_name() == s)
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant_name())
    }
}

/// Expand a `Protection` short code into its constant name.
///
/// Unknown codes, including the empty string, are returned unchanged.
pub fn describe_code(code: &str) -> String {
    match Accessibility::from_code(code) {
        Some(class) => class.constant_name().to_string(),
        None => code.to_string(),
    }
}
