// src/identifier.rs

//! Content identifier classification
//!
//! An identifier is either a real content address, which may be fetched from
//! remote gateways, or a placeholder minted when no pinning service was
//! reachable at publish time. Placeholders must never reach the network.

use std::fmt;

/// Prefix of placeholders written by test fixtures and mock deployments
pub const MOCK_PREFIX: &str = "QmMock";

/// Prefix of placeholders minted by the publisher when no upload succeeded
pub const LOCAL_PREFIX: &str = "QmLocal";

/// Length in characters of a CIDv0 content address (`Qm` + 44 base58 characters)
pub const MIN_ADDRESS_LEN: usize = 46;

/// Whether an identifier may be resolved remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierClass {
    /// Real content address, resolved through gateways
    Addressable,
    /// Local-only placeholder
    NonAddressable,
}

impl IdentifierClass {
    pub fn is_addressable(self) -> bool {
        self == Self::Addressable
    }
}

impl fmt::Display for IdentifierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addressable => write!(f, "addressable"),
            Self::NonAddressable => write!(f, "non-addressable"),
        }
    }
}

/// Classify an identifier
///
/// Reserved placeholder prefixes win over length, and anything shorter than a
/// CIDv0 address is treated as a placeholder.
pub fn classify(identifier: &str) -> IdentifierClass {
    if identifier.starts_with(MOCK_PREFIX)
        || identifier.starts_with(LOCAL_PREFIX)
        || identifier.chars().count() < MIN_ADDRESS_LEN
    {
        IdentifierClass::NonAddressable
    } else {
        IdentifierClass::Addressable
    }
}
