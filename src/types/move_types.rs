//! Move language identifiers, module ids and type tags
//!
//! Type tags appear in entry function calls (e.g. the coin type of a
//! transfer) and, in their string form, as resource type names.

use super::AccountAddress;
use crate::error::{LedgerError, LedgerResult};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// A Move identifier (module, function or struct name)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> LedgerResult<Self> {
        let name = name.into();
        if !IDENTIFIER.is_match(&name) {
            return Err(LedgerError::InvalidInput(format!(
                "invalid Move identifier: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified module name, e.g. `0x1::coin`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    pub address: AccountAddress,
    pub name: Identifier,
}

impl ModuleId {
    pub fn new(address: AccountAddress, name: Identifier) -> Self {
        Self { address, name }
    }
}

impl FromStr for ModuleId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, name) = s
            .trim()
            .split_once("::")
            .ok_or_else(|| LedgerError::InvalidInput(format!("invalid module path: {}", s)))?;
        Ok(Self {
            address: address.parse()?,
            name: Identifier::new(name)?,
        })
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address.short_str_lossless(), self.name)
    }
}

/// A struct type, e.g. `0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: Identifier,
    pub name: Identifier,
    pub type_params: Vec<TypeTag>,
}

/// Move type tag. Variant order is part of the wire format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

impl FromStr for TypeTag {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let tag = match s {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            _ => {
                if let Some(inner) = s.strip_prefix("vector<").and_then(|r| r.strip_suffix('>')) {
                    TypeTag::Vector(Box::new(inner.parse()?))
                } else {
                    TypeTag::Struct(Box::new(s.parse()?))
                }
            }
        };
        Ok(tag)
    }
}

impl FromStr for StructTag {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, params) = match s.find('<') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix('>').ok_or_else(|| {
                    LedgerError::InvalidInput(format!("unbalanced type parameters: {}", s))
                })?;
                (&s[..open], Some(inner))
            }
            None => (s, None),
        };

        let parts: Vec<&str> = head.split("::").collect();
        if parts.len() != 3 {
            return Err(LedgerError::InvalidInput(format!(
                "struct tag must be address::module::name: {}",
                s
            )));
        }

        let type_params = match params {
            Some(inner) => split_type_params(inner)?
                .into_iter()
                .map(TypeTag::from_str)
                .collect::<LedgerResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(StructTag {
            address: parts[0].parse()?,
            module: Identifier::new(parts[1])?,
            name: Identifier::new(parts[2])?,
            type_params,
        })
    }
}

/// Split a type parameter list on commas that are not nested in `<...>`
fn split_type_params(inner: &str) -> LedgerResult<Vec<&str>> {
    let mut depth = 0i32;
    let mut start = 0;
    let mut out = Vec::new();

    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                out.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }

    if depth != 0 {
        return Err(LedgerError::InvalidInput(format!(
            "unbalanced type parameters: {}",
            inner
        )));
    }

    out.push(inner[start..].trim());
    if out.iter().any(|p| p.is_empty()) {
        return Err(LedgerError::InvalidInput(format!(
            "empty type parameter in: {}",
            inner
        )));
    }
    Ok(out)
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.address.short_str_lossless(),
            self.module,
            self.name
        )?;
        if !self.type_params.is_empty() {
            let params: Vec<String> = self.type_params.iter().map(|t| t.to_string()).collect();
            write!(f, "<{}>", params.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => write!(f, "{}", tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coin_store_tag() {
        let tag: StructTag = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"
            .parse()
            .unwrap();
        assert_eq!(tag.address, AccountAddress::ONE);
        assert_eq!(tag.module.as_str(), "coin");
        assert_eq!(tag.name.as_str(), "CoinStore");
        assert_eq!(tag.type_params.len(), 1);
        assert_eq!(
            tag.to_string(),
            "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"
        );
    }

    #[test]
    fn test_parse_nested_params() {
        let tag: StructTag = "0x1::table::Table<address, vector<0x1::string::String>>"
            .parse()
            .unwrap();
        assert_eq!(tag.type_params[0], TypeTag::Address);
        match &tag.type_params[1] {
            TypeTag::Vector(inner) => match inner.as_ref() {
                TypeTag::Struct(s) => assert_eq!(s.name.as_str(), "String"),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_tags() {
        assert!("0x1::coin".parse::<StructTag>().is_err());
        assert!("0x1::coin::CoinStore<u8".parse::<StructTag>().is_err());
        assert!("0x1::coin::Coin<u8,>".parse::<StructTag>().is_err());
        assert!("0x1::1coin::Coin".parse::<StructTag>().is_err());
    }

    #[test]
    fn test_module_id_display() {
        let module: ModuleId = "0x1::coin".parse().unwrap();
        assert_eq!(module.to_string(), "0x1::coin");
    }
}
