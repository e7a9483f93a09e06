//! Payload builders for the operations the client performs

use crate::error::LedgerResult;
use crate::types::{
    AccountAddress, EntryFunction, ModuleBundle, StructTag, TransactionPayload, TypeTag,
};

/// Native coin type
pub const APTOS_COIN: &str = "0x1::aptos_coin::AptosCoin";

/// Collection and token maxima default to unlimited
pub const UNLIMITED: u64 = u64::MAX;

/// Generic entry function call, e.g. `entry_function("0x1::coin", "transfer", ..)`
pub fn entry_function(
    module_path: &str,
    function: &str,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
) -> LedgerResult<TransactionPayload> {
    Ok(TransactionPayload::EntryFunction(EntryFunction::natural(
        module_path,
        function,
        ty_args,
        args,
    )?))
}

/// `0x1::coin::transfer<AptosCoin>(recipient, amount)`
pub fn coin_transfer(recipient: AccountAddress, amount: u64) -> LedgerResult<TransactionPayload> {
    let coin: StructTag = APTOS_COIN.parse()?;
    entry_function(
        "0x1::coin",
        "transfer",
        vec![TypeTag::Struct(Box::new(coin))],
        vec![bcs::to_bytes(&recipient)?, bcs::to_bytes(&amount)?],
    )
}

/// Publish compiled module bytecode under the sender's address
pub fn publish_modules(modules: Vec<Vec<u8>>) -> TransactionPayload {
    TransactionPayload::ModuleBundle(ModuleBundle::new(modules))
}

/// `{contract}::message::set_message(message)` from the hello-blockchain module
pub fn set_message(contract: AccountAddress, message: &str) -> LedgerResult<TransactionPayload> {
    entry_function(
        &format!("{}::message", contract.to_hex_literal()),
        "set_message",
        vec![],
        vec![bcs::to_bytes(message)?],
    )
}

/// `0x3::token::create_collection_script`
pub fn create_collection(
    name: &str,
    description: &str,
    uri: &str,
    maximum: u64,
) -> LedgerResult<TransactionPayload> {
    entry_function(
        "0x3::token",
        "create_collection_script",
        vec![],
        vec![
            bcs::to_bytes(name)?,
            bcs::to_bytes(description)?,
            bcs::to_bytes(uri)?,
            bcs::to_bytes(&maximum)?,
            bcs::to_bytes(&vec![false; 3])?,
        ],
    )
}

/// Token to mint into an existing collection
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub collection: String,
    pub name: String,
    pub description: String,
    pub supply: u64,
    pub maximum: u64,
    pub uri: String,
    pub royalty_payee: AccountAddress,
    pub royalty_points_denominator: u64,
    pub royalty_points_numerator: u64,
}

impl TokenSpec {
    /// A token with zero royalty (in points per million) paid to `creator`
    pub fn new(
        creator: AccountAddress,
        collection: &str,
        name: &str,
        description: &str,
        supply: u64,
        uri: &str,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            supply,
            maximum: UNLIMITED,
            uri: uri.to_string(),
            royalty_payee: creator,
            royalty_points_denominator: 1_000_000,
            royalty_points_numerator: 0,
        }
    }
}

/// `0x3::token::create_token_script`
pub fn create_token(spec: &TokenSpec) -> LedgerResult<TransactionPayload> {
    let no_properties: Vec<String> = Vec::new();
    let no_values: Vec<Vec<u8>> = Vec::new();

    entry_function(
        "0x3::token",
        "create_token_script",
        vec![],
        vec![
            bcs::to_bytes(&spec.collection)?,
            bcs::to_bytes(&spec.name)?,
            bcs::to_bytes(&spec.description)?,
            bcs::to_bytes(&spec.supply)?,
            bcs::to_bytes(&spec.maximum)?,
            bcs::to_bytes(&spec.uri)?,
            bcs::to_bytes(&spec.royalty_payee)?,
            bcs::to_bytes(&spec.royalty_points_denominator)?,
            bcs::to_bytes(&spec.royalty_points_numerator)?,
            bcs::to_bytes(&vec![false; 5])?,
            bcs::to_bytes(&no_properties)?,
            bcs::to_bytes(&no_values)?,
            bcs::to_bytes(&no_properties)?,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_entry(payload: TransactionPayload) -> EntryFunction {
        match payload {
            TransactionPayload::EntryFunction(f) => f,
            other => panic!("expected entry function, got {:?}", other),
        }
    }

    #[test]
    fn test_coin_transfer_arguments() {
        let recipient = AccountAddress::from_hex_literal("0xb0b").unwrap();
        let call = as_entry(coin_transfer(recipient, 1_000).unwrap());

        assert_eq!(call.module.to_string(), "0x1::coin");
        assert_eq!(call.function.as_str(), "transfer");
        assert_eq!(call.ty_args[0].to_string(), APTOS_COIN);
        assert_eq!(call.args[0], recipient.as_bytes().to_vec());
        assert_eq!(call.args[1], 1_000u64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_set_message_targets_contract_module() {
        let contract = AccountAddress::from_hex_literal("0xa11ce").unwrap();
        let call = as_entry(set_message(contract, "Hello, Blockchain").unwrap());
        assert_eq!(call.module.address, contract);
        assert_eq!(call.module.name.as_str(), "message");
        let decoded: String = bcs::from_bytes(&call.args[0]).unwrap();
        assert_eq!(decoded, "Hello, Blockchain");
    }

    #[test]
    fn test_create_token_has_full_argument_list() {
        let spec = TokenSpec::new(
            AccountAddress::ONE,
            "Alice NFT's",
            "First Token",
            "Minted this token first",
            1,
            "https://aptos.dev/img/nyan.jpeg",
        );
        let call = as_entry(create_token(&spec).unwrap());
        assert_eq!(call.module.to_string(), "0x3::token");
        assert_eq!(call.args.len(), 13);
        let supply: u64 = bcs::from_bytes(&call.args[3]).unwrap();
        assert_eq!(supply, 1);
    }

    #[test]
    fn test_publish_wraps_each_module() {
        match publish_modules(vec![vec![1, 2], vec![3]]) {
            TransactionPayload::ModuleBundle(bundle) => assert_eq!(bundle.codes.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
