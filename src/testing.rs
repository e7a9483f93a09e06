//! In-memory ledger and faucet used by workflow and scenario tests.
//!
//! Validates submissions the way a node does (signature, chain id, expiry,
//! sequence number, fee budget) and executes the handful of entry functions
//! the scenarios call.

use crate::chain::{
    AccountData, AccountResource, FaucetClient, LedgerClient, PendingTransaction, TransactionInfo,
    TransactionStatus,
};
use crate::error::{LedgerError, LedgerResult};
use crate::resource::{message_holder_type, COIN_STORE, TOKEN_COLLECTIONS, TOKEN_STORE};
use crate::types::{
    AccountAddress, ChainId, EntryFunction, HashValue, SignedTransaction, TransactionPayload,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Gas units charged for every executed transaction
pub const GAS_PER_TRANSACTION: u64 = 10;

const EXECUTED: &str = "Executed successfully";

#[derive(Default)]
struct AccountState {
    sequence_number: u64,
    resources: BTreeMap<String, Value>,
    published_modules: usize,
}

impl AccountState {
    fn balance(&self) -> Option<u64> {
        self.resources
            .get(COIN_STORE)
            .and_then(|store| store["coin"]["value"].as_str())
            .and_then(|value| value.parse().ok())
    }

    fn set_balance(&mut self, value: u64) {
        self.resources.insert(
            COIN_STORE.to_string(),
            json!({"coin": {"value": value.to_string()}, "frozen": false}),
        );
    }
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountAddress, AccountState>,
    transactions: HashMap<HashValue, TransactionStatus>,
    /// Accepted but unexecuted, keyed by (sender, sequence number)
    held: HashMap<(AccountAddress, u64), HashValue>,
    version: u64,
    hold_pending: bool,
    faucet_enabled: bool,
}

pub struct InMemoryLedger {
    chain_id: ChainId,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            state: Mutex::new(LedgerState {
                faucet_enabled: true,
                ..LedgerState::default()
            }),
        }
    }

    /// Create the account if needed and mint `amount` into it. Zero creates
    /// the account without a coin store.
    pub fn fund(&self, address: AccountAddress, amount: u64) -> HashValue {
        let mut state = self.state.lock().unwrap();
        let account = state.accounts.entry(address).or_default();
        if amount > 0 {
            let balance = account.balance().unwrap_or(0);
            account.set_balance(balance + amount);
        }

        state.version += 1;
        let hash = HashValue::sha3_256_of(format!("mint-{}", state.version).as_bytes());
        let info = TransactionInfo {
            hash,
            version: state.version,
            success: true,
            vm_status: EXECUTED.to_string(),
            gas_used: 0,
        };
        state
            .transactions
            .insert(hash, TransactionStatus::Committed(info));
        hash
    }

    pub fn balance(&self, address: AccountAddress) -> Option<u64> {
        let state = self.state.lock().unwrap();
        state.accounts.get(&address).and_then(AccountState::balance)
    }

    /// Accept submissions without executing them
    pub fn hold_pending(&self, hold: bool) {
        self.state.lock().unwrap().hold_pending = hold;
    }

    pub fn set_faucet_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().faucet_enabled = enabled;
    }
}

fn rejected(vm_status: impl Into<String>) -> LedgerError {
    LedgerError::ExecutionRejected {
        vm_status: vm_status.into(),
    }
}

/// Admission checks a node performs before a transaction enters mempool
fn validate(
    state: &LedgerState,
    chain_id: ChainId,
    txn: &SignedTransaction,
    hash: HashValue,
) -> LedgerResult<()> {
    let raw = txn.raw_txn();
    txn.verify_signature()
        .map_err(|_| rejected("INVALID_SIGNATURE"))?;
    if raw.chain_id() != chain_id {
        return Err(rejected("BAD_CHAIN_ID"));
    }
    if crate::now_secs() >= raw.expiration_timestamp_secs() {
        return Err(LedgerError::Expired {
            hash: Some(hash),
            expiration_timestamp_secs: raw.expiration_timestamp_secs(),
        });
    }

    let account = state
        .accounts
        .get(&raw.sender())
        .ok_or_else(|| rejected("SENDING_ACCOUNT_DOES_NOT_EXIST"))?;

    let sequence_taken = raw.sequence_number() < account.sequence_number
        || state
            .held
            .contains_key(&(raw.sender(), raw.sequence_number()));
    if sequence_taken {
        return Err(LedgerError::SequenceConflict {
            sender: raw.sender(),
            sequence_number: raw.sequence_number(),
            message: "SEQUENCE_NUMBER_TOO_OLD".to_string(),
        });
    }
    if raw.sequence_number() > account.sequence_number {
        return Err(rejected("SEQUENCE_NUMBER_TOO_NEW"));
    }

    let max_fee = raw.max_gas_amount().saturating_mul(raw.gas_unit_price());
    if account.balance().unwrap_or(0) < max_fee {
        return Err(rejected("INSUFFICIENT_BALANCE_FOR_TRANSACTION_FEE"));
    }
    Ok(())
}

/// Charge gas, bump the sequence number and apply the payload. An abort
/// keeps the fee and the sequence bump but none of the payload's writes.
fn execute(state: &mut LedgerState, txn: &SignedTransaction, hash: HashValue) -> TransactionInfo {
    let raw = txn.raw_txn();
    let sender = raw.sender();
    let fee = GAS_PER_TRANSACTION * raw.gas_unit_price();

    if let Some(account) = state.accounts.get_mut(&sender) {
        account.sequence_number += 1;
        let balance = account.balance().unwrap_or(0);
        account.set_balance(balance.saturating_sub(fee));
    }

    let outcome = match raw.payload() {
        TransactionPayload::EntryFunction(call) => apply_entry_function(state, sender, call),
        TransactionPayload::ModuleBundle(bundle) => {
            if bundle.codes.is_empty() || bundle.codes.iter().any(|m| m.code.is_empty()) {
                Err("CODE_DESERIALIZATION_ERROR".to_string())
            } else {
                if let Some(account) = state.accounts.get_mut(&sender) {
                    account.published_modules += bundle.codes.len();
                }
                Ok(())
            }
        }
        TransactionPayload::Script(_) => Err("FEATURE_UNDER_GATING".to_string()),
    };

    state.version += 1;
    let (success, vm_status) = match outcome {
        Ok(()) => (true, EXECUTED.to_string()),
        Err(status) => (false, status),
    };
    TransactionInfo {
        hash,
        version: state.version,
        success,
        vm_status,
        gas_used: GAS_PER_TRANSACTION,
    }
}

fn arg<T: serde::de::DeserializeOwned>(call: &EntryFunction, idx: usize) -> Result<T, String> {
    call.args
        .get(idx)
        .and_then(|bytes| bcs::from_bytes(bytes).ok())
        .ok_or_else(|| "NUMBER_OF_ARGUMENTS_MISMATCH".to_string())
}

fn apply_entry_function(
    state: &mut LedgerState,
    sender: AccountAddress,
    call: &EntryFunction,
) -> Result<(), String> {
    let module = call.module.to_string();
    match (module.as_str(), call.function.as_str()) {
        ("0x1::coin", "transfer") => {
            let recipient: AccountAddress = arg(call, 0)?;
            let amount: u64 = arg(call, 1)?;
            let available = state
                .accounts
                .get(&sender)
                .and_then(AccountState::balance)
                .unwrap_or(0);
            if available < amount {
                return Err("Move abort in 0x1::coin: EINSUFFICIENT_BALANCE(0x10006)".to_string());
            }
            if !state.accounts.contains_key(&recipient) {
                return Err("Move abort in 0x1::account: EACCOUNT_DOES_NOT_EXIST(0x60002)".to_string());
            }
            if let Some(account) = state.accounts.get_mut(&sender) {
                account.set_balance(available - amount);
            }
            if let Some(account) = state.accounts.get_mut(&recipient) {
                let balance = account.balance().unwrap_or(0);
                account.set_balance(balance + amount);
            }
            Ok(())
        }
        (_, "set_message") if call.module.name.as_str() == "message" => {
            let message: String = arg(call, 0)?;
            let published = state
                .accounts
                .get(&call.module.address)
                .map(|a| a.published_modules > 0)
                .unwrap_or(false);
            if !published {
                return Err("LINKER_ERROR".to_string());
            }
            if let Some(account) = state.accounts.get_mut(&sender) {
                account.resources.insert(
                    message_holder_type(call.module.address),
                    json!({"message": message}),
                );
            }
            Ok(())
        }
        ("0x3::token", "create_collection_script") => {
            let name: String = arg(call, 0)?;
            let account = state
                .accounts
                .get_mut(&sender)
                .ok_or_else(|| "EACCOUNT_DOES_NOT_EXIST".to_string())?;
            let collections = account
                .resources
                .entry(TOKEN_COLLECTIONS.to_string())
                .or_insert_with(|| json!({"collections": []}));
            let names = collections["collections"]
                .as_array_mut()
                .ok_or_else(|| "MISSING_DATA".to_string())?;
            if names.iter().any(|n| n.as_str() == Some(name.as_str())) {
                return Err("Move abort in 0x3::token: ECOLLECTION_ALREADY_EXISTS(0x80001)".to_string());
            }
            names.push(json!(name));
            Ok(())
        }
        ("0x3::token", "create_token_script") => {
            let collection: String = arg(call, 0)?;
            let name: String = arg(call, 1)?;
            let supply: u64 = arg(call, 3)?;
            let account = state
                .accounts
                .get_mut(&sender)
                .ok_or_else(|| "EACCOUNT_DOES_NOT_EXIST".to_string())?;
            let has_collection = account
                .resources
                .get(TOKEN_COLLECTIONS)
                .and_then(|c| c["collections"].as_array())
                .map(|names| names.iter().any(|n| n.as_str() == Some(collection.as_str())))
                .unwrap_or(false);
            if !has_collection {
                return Err("Move abort in 0x3::token: ECOLLECTION_NOT_PUBLISHED(0x60002)".to_string());
            }
            let store = account
                .resources
                .entry(TOKEN_STORE.to_string())
                .or_insert_with(|| json!({"tokens": []}));
            store["tokens"]
                .as_array_mut()
                .ok_or_else(|| "MISSING_DATA".to_string())?
                .push(json!({
                    "collection": collection,
                    "name": name,
                    "amount": supply.to_string(),
                }));
            Ok(())
        }
        _ => Err("FUNCTION_RESOLUTION_FAILURE".to_string()),
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_account(&self, address: AccountAddress) -> LedgerResult<AccountData> {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .get(&address)
            .map(|account| AccountData {
                sequence_number: account.sequence_number,
                authentication_key: address.to_hex_literal(),
            })
            .ok_or_else(|| LedgerError::not_found(format!("Account {}", address)))
    }

    async fn get_account_resource(
        &self,
        address: AccountAddress,
        resource_type: &str,
    ) -> LedgerResult<Option<AccountResource>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .get(&address)
            .and_then(|account| account.resources.get(resource_type))
            .map(|data| AccountResource {
                resource_type: resource_type.to_string(),
                data: data.clone(),
            }))
    }

    async fn get_account_resources(
        &self,
        address: AccountAddress,
    ) -> LedgerResult<Vec<AccountResource>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .get(&address)
            .map(|account| {
                account
                    .resources
                    .iter()
                    .map(|(resource_type, data)| AccountResource {
                        resource_type: resource_type.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        Ok(self.chain_id)
    }

    async fn submit_signed_transaction(
        &self,
        txn: &SignedTransaction,
    ) -> LedgerResult<PendingTransaction> {
        // Decode what would go over the wire
        let txn = SignedTransaction::from_bytes(&txn.to_bytes()?)?;
        let hash = txn.committed_hash()?;

        let mut state = self.state.lock().unwrap();
        validate(&state, self.chain_id, &txn, hash)?;

        if state.hold_pending {
            state
                .held
                .insert((txn.sender(), txn.sequence_number()), hash);
            state.transactions.insert(hash, TransactionStatus::Pending);
        } else {
            let info = execute(&mut state, &txn, hash);
            state
                .transactions
                .insert(hash, TransactionStatus::Committed(info));
        }

        Ok(PendingTransaction {
            hash,
            sender: txn.sender(),
            sequence_number: txn.sequence_number(),
            expiration_timestamp_secs: txn.expiration_timestamp_secs(),
        })
    }

    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
    ) -> LedgerResult<Option<TransactionStatus>> {
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }
}

#[async_trait]
impl FaucetClient for InMemoryLedger {
    async fn fund_account(
        &self,
        address: AccountAddress,
        amount: u64,
    ) -> LedgerResult<Vec<HashValue>> {
        if !self.state.lock().unwrap().faucet_enabled {
            return Err(LedgerError::Faucet {
                status: 403,
                message: "faucet disabled".to_string(),
            });
        }
        Ok(vec![self.fund(address, amount)])
    }
}
