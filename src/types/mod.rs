//! Ledger data model: addresses, hashes, Move type tags and transactions

mod account_address;
pub mod hash;
mod move_types;
mod transaction;

pub use account_address::AccountAddress;
pub use hash::HashValue;
pub use move_types::{Identifier, ModuleId, StructTag, TypeTag};
pub use transaction::{
    EntryFunction, Module, ModuleBundle, RawTransaction, Script, SignedTransaction,
    TransactionArgument, TransactionAuthenticator, TransactionPayload,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identifier embedded in every transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(u8);

impl ChainId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
