// src/contracts.rs
use ethers::abi::{encode, Token};
use ethers::prelude::abigen;
use ethers::types::{Address, Bytes, H160, U256};
use ethers::utils::id;

use crate::types::{Call, Calls};

abigen!(
    KernelFactory,
    r#"[
        function getAccountAddress(bytes _data, uint256 _index) external view returns (address)
    ]"#;

    EntryPoint,
    r#"[
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce)
    ]"#
);

/// 0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789
pub const ENTRY_POINT_V0_6: Address = H160([
    0x5f, 0xf1, 0x37, 0xd4, 0xb0, 0xfd, 0xcd, 0x49, 0xdc, 0xa3, 0x0c, 0x7c, 0xf5, 0x7e, 0x57, 0x8a,
    0x02, 0x6d, 0x27, 0x89,
]);

/// 0x5de4839a76cf55d0c90e2061ef4386d962E15ae3
pub const KERNEL_FACTORY: Address = H160([
    0x5d, 0xe4, 0x83, 0x9a, 0x76, 0xcf, 0x55, 0xd0, 0xc9, 0x0e, 0x20, 0x61, 0xef, 0x43, 0x86, 0xd9,
    0x62, 0xe1, 0x5a, 0xe3,
]);

/// Kernel v2.2 implementation. 0x0DA6a956B9488eD4dd761E59f52FDc6c8068E6B5
pub const KERNEL_ACCOUNT_LOGIC: Address = H160([
    0x0d, 0xa6, 0xa9, 0x56, 0xb9, 0x48, 0x8e, 0xd4, 0xdd, 0x76, 0x1e, 0x59, 0xf5, 0x2f, 0xdc, 0x6c,
    0x80, 0x68, 0xe6, 0xb5,
]);

/// 0xd9AB5096a832b9ce79914329DAEE236f8Eea0390
pub const ECDSA_VALIDATOR: Address = H160([
    0xd9, 0xab, 0x50, 0x96, 0xa8, 0x32, 0xb9, 0xce, 0x79, 0x91, 0x43, 0x29, 0xda, 0xee, 0x23, 0x6f,
    0x8e, 0xea, 0x03, 0x90,
]);

pub const EXECUTE_SIGNATURE: &str = "execute(address,uint256,bytes,uint8)";
pub const EXECUTE_BATCH_SIGNATURE: &str = "executeBatch((address,uint256,bytes)[])";

fn encode_function(signature: &str, tokens: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(encode(tokens));
    data.into()
}

fn call_token(call: &Call) -> Vec<Token> {
    vec![
        Token::Address(call.to),
        Token::Uint(call.value),
        Token::Bytes(call.data.to_vec()),
    ]
}

/// `Kernel.initialize(validator, enableData)`
pub fn encode_initialize(validator: Address, enable_data: Bytes) -> Bytes {
    encode_function(
        "initialize(address,bytes)",
        &[Token::Address(validator), Token::Bytes(enable_data.to_vec())],
    )
}

/// `KernelFactory.createAccount(implementation, data, index)`
pub fn encode_create_account(initialize: Bytes, index: U256) -> Bytes {
    encode_function(
        "createAccount(address,bytes,uint256)",
        &[
            Token::Address(KERNEL_ACCOUNT_LOGIC),
            Token::Bytes(initialize.to_vec()),
            Token::Uint(index),
        ],
    )
}

/// Kernel execution encoding. A single call uses `execute` with the plain
/// call operation; a list always goes through `executeBatch`.
pub fn encode_calls(calls: &Calls) -> Bytes {
    match calls {
        Calls::Single(call) => {
            let mut tokens = call_token(call);
            tokens.push(Token::Uint(U256::zero()));
            encode_function(EXECUTE_SIGNATURE, &tokens)
        }
        Calls::Batch(calls) => {
            let calls = calls.iter().map(|call| Token::Tuple(call_token(call))).collect();
            encode_function(EXECUTE_BATCH_SIGNATURE, &[Token::Array(calls)])
        }
    }
}

/// Kernel sudo-mode prefix followed by a well-formed but meaningless ECDSA
/// signature, so bundlers can simulate validation during estimation.
pub fn dummy_signature() -> Bytes {
    let mut signature = vec![0u8; 4];
    signature.extend([0xff; 15]);
    signature.push(0xf0);
    signature.extend([0u8; 16]);
    signature.push(0x7a);
    signature.extend([0xaa; 31]);
    signature.push(0x1c);
    signature.into()
}
