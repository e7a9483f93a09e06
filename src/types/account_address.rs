//! 32-byte account addresses

use crate::error::{LedgerError, LedgerResult};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque fixed-length account identifier on the ledger
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const LENGTH: usize = 32;

    /// Framework address (`0x1`)
    pub const ONE: Self = Self::from_suffix(1);
    /// Token standard address (`0x3`)
    pub const THREE: Self = Self::from_suffix(3);

    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    const fn from_suffix(b: u8) -> Self {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[Self::LENGTH - 1] = b;
        Self(bytes)
    }

    /// Parse `0x`-prefixed or bare hex. Short forms such as `0x1` are left-padded.
    pub fn from_hex_literal(literal: &str) -> LedgerResult<Self> {
        let digits = literal.strip_prefix("0x").unwrap_or(literal);
        if digits.is_empty() || digits.len() > Self::LENGTH * 2 {
            return Err(LedgerError::InvalidInput(format!(
                "invalid account address length: {}",
                literal
            )));
        }

        let padded = format!("{:0>width$}", digits, width = Self::LENGTH * 2);
        let bytes = hex::decode(&padded).map_err(|e| {
            LedgerError::InvalidInput(format!("invalid account address {}: {}", literal, e))
        })?;

        let mut out = [0u8; Self::LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// Full-width `0x` hex form
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// `0x` hex with leading zeros dropped, as used inside Move type names
    pub fn short_str_lossless(&self) -> String {
        let encoded = hex::encode(self.0);
        let trimmed = encoded.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{}", trimmed)
        }
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_literal(s.trim())
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex_literal())
        } else {
            serializer.serialize_newtype_struct("AccountAddress", &self.0)
        }
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex_literal(&s).map_err(de::Error::custom)
        } else {
            #[derive(Deserialize)]
            #[serde(rename = "AccountAddress")]
            struct Value([u8; AccountAddress::LENGTH]);

            let value = Value::deserialize(deserializer)?;
            Ok(Self(value.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_literal_is_left_padded() {
        let addr: AccountAddress = "0x1".parse().unwrap();
        assert_eq!(addr, AccountAddress::ONE);
        assert_eq!(addr.short_str_lossless(), "0x1");
        assert_eq!(
            addr.to_hex_literal(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_rejects_bad_literals() {
        assert!(AccountAddress::from_hex_literal("0x").is_err());
        assert!(AccountAddress::from_hex_literal("0xzz").is_err());
        let too_long = format!("0x{}", "a".repeat(65));
        assert!(AccountAddress::from_hex_literal(&too_long).is_err());
    }

    #[test]
    fn test_bcs_is_raw_bytes() {
        let addr = AccountAddress::from_hex_literal("0xabc").unwrap();
        let bytes = bcs::to_bytes(&addr).unwrap();
        assert_eq!(bytes.len(), AccountAddress::LENGTH);
        assert_eq!(&bytes[30..], &[0x0a, 0xbc]);
        let back: AccountAddress = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_json_is_hex_string() {
        let addr = AccountAddress::THREE;
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex_literal()));
        let back: AccountAddress = serde_json::from_str("\"0x3\"").unwrap();
        assert_eq!(back, addr);
    }
}
