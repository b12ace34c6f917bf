//! Account address type, rendered as `0x`-prefixed lowercase hex.

use crate::error::CofferError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account address.
///
/// Addresses are supplied by the external identity provider; the engine
/// never derives them itself, it only compares and records them.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The standard prefix for rendered addresses.
    pub const PREFIX: &'static str = "0x";

    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse an address from its `0x`-prefixed hex form.
    pub fn parse(s: &str) -> Result<Self, CofferError> {
        let body = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| CofferError::InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(body).map_err(|_| CofferError::InvalidAddress(s.to_string()))?;
        let raw: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CofferError::InvalidAddress(s.to_string()))?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}{})", Self::PREFIX, hex::encode(&self.0[..4]))
    }
}

impl FromStr for Address {
    type Err = CofferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = CofferError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
