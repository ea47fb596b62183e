// Identity primitives shared by every Refnet crate.
//
// INVARIANTS:
// 1. A `NodeId` is never zero; zero is the "empty slot" sentinel and is mapped to `None`
//    at the boundary.
// 2. An `Address` is always normalized (lowercase, `0x`-prefixed, 20 bytes of hex), so
//    two spellings of the same account compare equal in visited sets and caches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::RecordError;

/// Ledger-assigned identity number. Zero is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Returns `None` for the zero sentinel.
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(NodeId(v)),
            None => None,
        }
    }

    pub const fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger account identifier in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Number of raw bytes in an account identifier.
    pub const BYTES: usize = 20;

    /// The zero address, meaning "empty slot".
    pub fn zero() -> Self {
        Address(format!("0x{}", "0".repeat(Self::BYTES * 2)))
    }

    /// Parses and normalizes an account identifier.
    pub fn parse(input: &str) -> Result<Self, RecordError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if body.len() != Self::BYTES * 2 {
            return Err(RecordError::InvalidAddress(input.to_string()));
        }
        hex::decode(body).map_err(|_| RecordError::InvalidAddress(input.to_string()))?;

        Ok(Address(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup key accepted by traversal entry points: either an id or an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Id(NodeId),
    Address(Address),
}

impl NodeKey {
    /// Parses CLI-style input: a decimal number is an id, anything else must be an address.
    /// Returns `Ok(None)` for the zero id or zero address.
    pub fn parse(input: &str) -> Result<Option<Self>, RecordError> {
        let trimmed = input.trim();
        if let Ok(raw) = trimmed.parse::<u64>() {
            return Ok(NodeId::new(raw).map(NodeKey::Id));
        }
        let address = Address::parse(trimmed)?;
        if address.is_zero() {
            return Ok(None);
        }
        Ok(Some(NodeKey::Address(address)))
    }
}

impl From<NodeId> for NodeKey {
    fn from(id: NodeId) -> Self {
        NodeKey::Id(id)
    }
}

impl From<Address> for NodeKey {
    fn from(address: Address) -> Self {
        NodeKey::Address(address)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Id(id) => write!(f, "#{}", id),
            NodeKey::Address(address) => write!(f, "{}", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_id_is_not_representable() {
        assert!(NodeId::new(0).is_none());
        assert_eq!(NodeId::new(42).map(|id| id.get()), Some(42));
    }

    #[test]
    fn test_address_normalization() {
        let mixed = Address::parse("0xAbCdEf0123456789aBcDeF0123456789ABCDEF01").unwrap();
        let lower = Address::parse(" 0xabcdef0123456789abcdef0123456789abcdef01 ").unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");

        let bare = Address::parse("abcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(bare, lower);
    }

    #[test]
    fn test_address_rejects_garbage() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_zero_address_sentinel() {
        assert!(Address::zero().is_zero());
        let zero = Address::parse("0x0000000000000000000000000000000000000000").unwrap();
        assert_eq!(zero, Address::zero());
        assert!(!Address::parse("0x0000000000000000000000000000000000000001")
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_node_key_parse() {
        assert_eq!(
            NodeKey::parse("17").unwrap(),
            Some(NodeKey::Id(NodeId::new(17).unwrap()))
        );
        assert_eq!(NodeKey::parse("0").unwrap(), None);
        assert_eq!(
            NodeKey::parse("0x0000000000000000000000000000000000000000").unwrap(),
            None
        );
        assert!(matches!(
            NodeKey::parse("0x00000000000000000000000000000000000000aa").unwrap(),
            Some(NodeKey::Address(_))
        ));
        assert!(NodeKey::parse("not-a-key").is_err());
    }

    #[test]
    fn test_address_serde_round_trip_normalizes() {
        let parsed: Address =
            serde_json::from_str("\"0xABCDEF0123456789ABCDEF0123456789ABCDEF01\"").unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            "\"0xabcdef0123456789abcdef0123456789abcdef01\""
        );
    }
}
