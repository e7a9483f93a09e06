//! In-memory accounts: an Ed25519 signing key and the address derived from it

use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountAddress, RawTransaction, SignedTransaction};

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};

/// Authentication scheme byte appended to the public key when deriving addresses
const ED25519_SCHEME: u8 = 0x00;

/// An account whose private key lives only for the lifetime of the process
pub struct LocalAccount {
    address: AccountAddress,
    signing_key: SigningKey,
}

impl std::fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish()
    }
}

impl LocalAccount {
    /// Generate a fresh key from OS randomness
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Restore from a 32-byte private key in hex (with or without `0x`)
    pub fn from_private_key_hex(key: &str) -> LedgerResult<Self> {
        let key = key.trim();
        let bytes = hex::decode(key.strip_prefix("0x").unwrap_or(key))
            .map_err(|e| LedgerError::InvalidInput(format!("invalid private key: {}", e)))?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            LedgerError::InvalidInput(format!("private key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&secret)))
    }

    /// Load the key named by `env_var`, as the wallet section of the config points to
    pub fn from_env(env_var: &str) -> LedgerResult<Self> {
        let key = std::env::var(env_var).map_err(|_| {
            LedgerError::Config(format!("{} is not set", env_var))
        })?;
        Self::from_private_key_hex(&key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key());
        Self {
            address,
            signing_key,
        }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex of the private key seed; only for demo output the user asks for
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Sign a raw transaction, producing the immutable signed form
    pub fn sign_transaction(&self, raw_txn: RawTransaction) -> LedgerResult<SignedTransaction> {
        let message = raw_txn.signing_message()?;
        let signature = self.signing_key.sign(&message);
        Ok(SignedTransaction::new(
            raw_txn,
            &self.signing_key.verifying_key(),
            &signature,
        ))
    }
}

/// `sha3_256(public_key || scheme)`
pub fn derive_address(public_key: &VerifyingKey) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.as_bytes());
    hasher.update([ED25519_SCHEME]);
    let mut out = [0u8; AccountAddress::LENGTH];
    out.copy_from_slice(&hasher.finalize());
    AccountAddress::new(out)
}
