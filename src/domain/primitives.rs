//! Domain primitives: TimeMs, Address, Asset, RegisterId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Account identifier. Also the handle of the account's position in the
/// ranked registry, since an account owns at most one position.
///
/// Deserialization goes through [`FromStr`], so addresses in request bodies
/// are normalized the same way as addresses in paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid address: {0:?}")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(AddressParseError(s.to_string()));
        }
        Ok(Address(trimmed.to_lowercase()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement assets moved by spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// Native collateral backing positions.
    Collateral,
    /// Debt token minted by borrowing and burned by repayment.
    Debt,
    /// Staking token.
    Governance,
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Collateral => write!(f, "collateral"),
            Asset::Debt => write!(f, "debt"),
            Asset::Governance => write!(f, "governance"),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "collateral" => Ok(Asset::Collateral),
            "debt" => Ok(Asset::Debt),
            "governance" => Ok(Asset::Governance),
            other => Err(format!("unknown asset {}", other)),
        }
    }
}

/// Scratch register key. Key 0 is reserved and means "no register".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterId(pub u32);

impl RegisterId {
    pub const NONE: RegisterId = RegisterId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_normalizes_case() {
        let addr = Address::from_str("  0xABCdef ").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef");
        assert!(Address::from_str("").is_err());
        assert!(Address::from_str("0x12 34").is_err());
    }

    #[test]
    fn test_address_json_is_normalized() {
        let addr: Address = serde_json::from_str("\"0xABCdef\"").unwrap();
        assert_eq!(addr, Address::new("0xabcdef"));
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"0xabcdef\"");
        assert!(serde_json::from_str::<Address>("\"  \"").is_err());
    }

    #[test]
    fn test_asset_serialization() {
        assert_eq!(serde_json::to_string(&Asset::Debt).unwrap(), "\"debt\"");
        let asset: Asset = serde_json::from_str("\"governance\"").unwrap();
        assert_eq!(asset, Asset::Governance);
        assert_eq!(Asset::from_str("COLLATERAL").unwrap(), Asset::Collateral);
    }

    #[test]
    fn test_register_zero_is_none() {
        assert!(RegisterId::NONE.is_none());
        assert!(!RegisterId(1).is_none());
        assert_eq!(RegisterId(7).to_string(), "r7");
    }

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
        assert!(TimeMs::now().as_ms() > 0);
    }
}
