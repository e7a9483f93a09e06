//! Raw and signed transactions
//!
//! Field and variant order in this file defines the BCS wire layout the
//! ledger expects, so do not reorder.

use super::hash::{domain_hash, domain_seed};
use super::{AccountAddress, ChainId, HashValue, Identifier, ModuleId, TypeTag};
use crate::error::{LedgerError, LedgerResult};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Unsigned transaction envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Sender's address
    sender: AccountAddress,
    /// Must equal the sender's on-chain sequence number when executed
    sequence_number: u64,
    payload: TransactionPayload,
    /// Maximal total gas to spend
    max_gas_amount: u64,
    /// Price per gas unit
    gas_unit_price: u64,
    /// Absolute expiry, seconds since the Unix epoch
    expiration_timestamp_secs: u64,
    chain_id: ChainId,
}

impl RawTransaction {
    pub fn new(
        sender: AccountAddress,
        sequence_number: u64,
        payload: TransactionPayload,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self {
            sender,
            sequence_number,
            payload,
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        }
    }

    pub fn sender(&self) -> AccountAddress {
        self.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    pub fn max_gas_amount(&self) -> u64 {
        self.max_gas_amount
    }

    pub fn gas_unit_price(&self) -> u64 {
        self.gas_unit_price
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.expiration_timestamp_secs
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn to_bytes(&self) -> LedgerResult<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Bytes covered by the sender's signature: domain seed followed by the BCS body
    pub fn signing_message(&self) -> LedgerResult<Vec<u8>> {
        let mut message = domain_seed("RawTransaction").as_bytes().to_vec();
        message.extend_from_slice(&self.to_bytes()?);
        Ok(message)
    }
}

/// The operation a transaction asks the ledger to execute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    Script(Script),
    ModuleBundle(ModuleBundle),
    EntryFunction(EntryFunction),
}

impl TransactionPayload {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionPayload::Script(_) => "script",
            TransactionPayload::ModuleBundle(_) => "module_bundle",
            TransactionPayload::EntryFunction(_) => "entry_function",
        }
    }
}

/// Call of a function already published on chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunction {
    pub module: ModuleId,
    pub function: Identifier,
    pub ty_args: Vec<TypeTag>,
    /// BCS-encoded argument values
    pub args: Vec<Vec<u8>>,
}

impl EntryFunction {
    pub fn new(
        module: ModuleId,
        function: Identifier,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            module,
            function,
            ty_args,
            args,
        }
    }

    /// Build from a `0x1::coin`-style module path and a function name
    pub fn natural(
        module_path: &str,
        function: &str,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> LedgerResult<Self> {
        Ok(Self::new(
            module_path.parse()?,
            Identifier::new(function)?,
            ty_args,
            args,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub code: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleBundle {
    pub codes: Vec<Module>,
}

impl ModuleBundle {
    pub fn new(codes: Vec<Vec<u8>>) -> Self {
        Self {
            codes: codes.into_iter().map(|code| Module { code }).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub code: Vec<u8>,
    pub ty_args: Vec<TypeTag>,
    pub args: Vec<TransactionArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionArgument {
    U8(u8),
    U64(u64),
    U128(u128),
    Address(AccountAddress),
    U8Vector(Vec<u8>),
    Bool(bool),
}

/// Public key and signature proving the sender authorised the transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionAuthenticator {
    Ed25519 {
        public_key: Vec<u8>,
        signature: Vec<u8>,
    },
}

/// A raw transaction plus its authenticator. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    raw_txn: RawTransaction,
    authenticator: TransactionAuthenticator,
}

/// Envelope the ledger hashes to identify committed transactions
#[derive(Serialize)]
enum Transaction<'a> {
    UserTransaction(&'a SignedTransaction),
}

impl SignedTransaction {
    pub fn new(raw_txn: RawTransaction, public_key: &VerifyingKey, signature: &Signature) -> Self {
        Self {
            raw_txn,
            authenticator: TransactionAuthenticator::Ed25519 {
                public_key: public_key.to_bytes().to_vec(),
                signature: signature.to_bytes().to_vec(),
            },
        }
    }

    pub fn raw_txn(&self) -> &RawTransaction {
        &self.raw_txn
    }

    pub fn authenticator(&self) -> &TransactionAuthenticator {
        &self.authenticator
    }

    pub fn sender(&self) -> AccountAddress {
        self.raw_txn.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw_txn.sequence_number
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.raw_txn.expiration_timestamp_secs
    }

    pub fn to_bytes(&self) -> LedgerResult<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> LedgerResult<Self> {
        Ok(bcs::from_bytes(bytes)?)
    }

    /// Check the Ed25519 signature against the raw transaction's signing message
    pub fn verify_signature(&self) -> LedgerResult<()> {
        let TransactionAuthenticator::Ed25519 {
            public_key,
            signature,
        } = &self.authenticator;

        let key_bytes: [u8; 32] = public_key.as_slice().try_into().map_err(|_| {
            LedgerError::Signing(format!("public key must be 32 bytes, got {}", public_key.len()))
        })?;
        let public_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| LedgerError::Signing(e.to_string()))?;
        let signature =
            Signature::from_slice(signature).map_err(|e| LedgerError::Signing(e.to_string()))?;

        public_key
            .verify(&self.raw_txn.signing_message()?, &signature)
            .map_err(|e| LedgerError::Signing(format!("signature check failed: {}", e)))
    }

    /// Hash under which the ledger indexes this transaction
    pub fn committed_hash(&self) -> LedgerResult<HashValue> {
        let envelope = bcs::to_bytes(&Transaction::UserTransaction(self))?;
        Ok(domain_hash("Transaction", &envelope))
    }
}
