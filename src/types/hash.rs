//! SHA3-256 hash values and domain-separated hashing

use crate::error::{LedgerError, LedgerResult};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Prefix mixed into every domain seed
const HASH_PREFIX: &[u8] = b"APTOS::";

/// 32-byte SHA3-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HashValue([u8; HashValue::LENGTH]);

impl HashValue {
    pub const LENGTH: usize = 32;

    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn sha3_256_of(data: &[u8]) -> Self {
        let digest = Sha3_256::digest(data);
        let mut out = [0u8; Self::LENGTH];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn from_hex_literal(literal: &str) -> LedgerResult<Self> {
        let digits = literal.strip_prefix("0x").unwrap_or(literal);
        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::InvalidInput(format!("invalid hash {}: {}", literal, e)))?;
        let bytes: [u8; Self::LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            LedgerError::InvalidInput(format!("hash must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

/// Seed for a type's domain: `sha3_256("APTOS::" || type_name)`
pub fn domain_seed(type_name: &str) -> HashValue {
    let mut hasher = Sha3_256::new();
    hasher.update(HASH_PREFIX);
    hasher.update(type_name.as_bytes());
    let mut out = [0u8; HashValue::LENGTH];
    out.copy_from_slice(&hasher.finalize());
    HashValue(out)
}

/// Hash `bytes` under the domain of `type_name`
pub fn domain_hash(type_name: &str, bytes: &[u8]) -> HashValue {
    let mut hasher = Sha3_256::new();
    hasher.update(domain_seed(type_name).as_bytes());
    hasher.update(bytes);
    let mut out = [0u8; HashValue::LENGTH];
    out.copy_from_slice(&hasher.finalize());
    HashValue(out)
}

impl FromStr for HashValue {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_literal(s.trim())
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue({})", self.to_hex_literal())
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex_literal())
        } else {
            serializer.serialize_newtype_struct("HashValue", &self.0)
        }
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex_literal(&s).map_err(de::Error::custom)
        } else {
            #[derive(Deserialize)]
            #[serde(rename = "HashValue")]
            struct Value([u8; HashValue::LENGTH]);

            Ok(Self(Value::deserialize(deserializer)?.0))
        }
    }
}
