// src/types.rs
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::chain::ChainDescriptor;

/// ERC-4337 v0.6 user operation. Integers go out as `0x` hex strings and are
/// accepted as hex strings, decimal strings or plain JSON integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub call_gas_limit: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub verification_gas_limit: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub pre_verification_gas: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub max_fee_per_gas: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// ABI-encodes every field except the signature, with the dynamic byte
    /// fields replaced by their keccak256 digests.
    pub fn pack_without_signature(&self) -> Bytes {
        encode(&[
            Token::Address(self.sender),
            Token::Uint(self.nonce),
            Token::FixedBytes(keccak256(&self.init_code).to_vec()),
            Token::FixedBytes(keccak256(&self.call_data).to_vec()),
            Token::Uint(self.call_gas_limit),
            Token::Uint(self.verification_gas_limit),
            Token::Uint(self.pre_verification_gas),
            Token::Uint(self.max_fee_per_gas),
            Token::Uint(self.max_priority_fee_per_gas),
            Token::FixedBytes(keccak256(&self.paymaster_and_data).to_vec()),
        ])
        .into()
    }

    /// The hash the account's validator expects a signature over, bound to
    /// the entry point and chain.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> H256 {
        let op_hash = keccak256(self.pack_without_signature());
        keccak256(encode(&[
            Token::FixedBytes(op_hash.to_vec()),
            Token::Address(entry_point),
            Token::Uint(U256::from(chain_id)),
        ]))
        .into()
    }

    pub fn apply_gas_estimate(&mut self, estimate: &GasEstimate) {
        self.pre_verification_gas = estimate.pre_verification_gas;
        self.verification_gas_limit = estimate.verification_gas_limit;
        self.call_gas_limit = estimate.call_gas_limit;
    }

    pub fn apply_sponsorship(&mut self, sponsorship: SponsorUserOperationResponse) {
        self.paymaster_and_data = sponsorship.paymaster_and_data;
        if let Some(gas) = sponsorship.pre_verification_gas {
            self.pre_verification_gas = gas;
        }
        if let Some(gas) = sponsorship.verification_gas_limit {
            self.verification_gas_limit = gas;
        }
        if let Some(gas) = sponsorship.call_gas_limit {
            self.call_gas_limit = gas;
        }
        if let Some(fee) = sponsorship.max_fee_per_gas {
            self.max_fee_per_gas = fee;
        }
        if let Some(fee) = sponsorship.max_priority_fee_per_gas {
            self.max_priority_fee_per_gas = fee;
        }
    }

    pub fn is_sponsored(&self) -> bool {
        !self.paymaster_and_data.is_empty()
    }
}

/// Where an operation is headed: the tenant on the provider, the chain, and
/// the entry point contract.
#[derive(Debug, Clone)]
pub struct ChainContext {
    pub project_id: String,
    pub chain: ChainDescriptor,
    pub entry_point: Address,
}

/// A single call to be executed by the smart account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Calls {
    Single(Call),
    Batch(Vec<Call>),
}

/// Result of `eth_estimateUserOperationGas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub pre_verification_gas: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub verification_gas_limit: U256,
    #[serde(deserialize_with = "u256_lenient::deserialize")]
    pub call_gas_limit: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorUserOperationRequest {
    pub chain_id: u64,
    pub user_op: UserOperation,
    pub entry_point_address: Address,
    pub should_override_fee: bool,
    pub manual_gas_estimation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorUserOperationResponse {
    pub paymaster_and_data: Bytes,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub pre_verification_gas: Option<U256>,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub verification_gas_limit: Option<U256>,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub call_gas_limit: Option<U256>,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub max_priority_fee_per_gas: Option<U256>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAddressRequest {
    pub address: String,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub index: Option<U256>,
    pub project_id: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallRequest {
    pub to: String,
    #[serde(default, deserialize_with = "u256_lenient::deserialize")]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CallsRequest {
    Batch(Vec<CallRequest>),
    Single(CallRequest),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserOpRequest {
    pub address: String,
    #[serde(default, deserialize_with = "u256_lenient::deserialize_opt")]
    pub index: Option<U256>,
    pub project_id: Option<String>,
    pub chain_id: Option<u64>,
    pub entry_point: Option<String>,
    pub request: CallsRequest,
    pub sponsored: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendUserOpRequest {
    /// Decoded only after the project and chain are resolved.
    pub user_operation: Option<serde_json::Value>,
    pub project_id: Option<String>,
    pub chain_id: Option<u64>,
    pub entry_point: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAddressResponse {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserOpResponse {
    pub user_operation: UserOperation,
    pub user_op_hash: H256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendUserOpResponse {
    pub user_op_hash: H256,
}

// Unlike ethers' `deserialize_stringified_numeric`, JSON numbers above u64 are
// rejected here instead of going through f64.
pub mod u256_lenient {
    use ethers::types::U256;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn parse(value: &str) -> Result<U256, String> {
        let value = value.trim();
        match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            Some("") => Ok(U256::zero()),
            Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| format!("{value}: {e:?}")),
            None => U256::from_dec_str(value).map_err(|e| format!("{value}: {e:?}")),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(U256::from(n)),
            Repr::Text(s) => parse(&s).map_err(D::Error::custom),
        }
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(U256::from(n))),
            Some(Repr::Text(s)) => parse(&s).map(Some).map_err(D::Error::custom),
        }
    }
}
