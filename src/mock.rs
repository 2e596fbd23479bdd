// src/mock.rs
//! In-process stand-in for the infrastructure provider: one JSON-RPC server
//! answering the chain, bundler and paymaster methods the relay uses.
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::{id, keccak256};
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use jsonrpsee::types::{ErrorObject, ErrorObjectOwned};
use serde_json::Value;

use crate::config::Config;
use crate::types::{
    GasEstimate, SponsorUserOperationRequest, SponsorUserOperationResponse, UserOperation,
};

pub const MOCK_PAYMASTER_AND_DATA: [u8; 24] = [
    0xe9, 0x3e, 0xca, 0x61, 0x95, 0xd0, 0x01, 0x48, 0x44, 0x8b, 0x6a, 0x06, 0x74, 0x2b, 0x4d, 0xa2,
    0x1f, 0x72, 0x26, 0x62, 0xde, 0xad, 0xbe, 0xef,
];

#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    pub deployed: bool,
    pub nonce: U256,
    pub gas_price: Option<U256>,
    pub paymaster_fails: bool,
    pub reject_estimation: Option<String>,
    pub reject_submission: Option<String>,
}

#[rpc(server, namespace = "eth")]
pub trait MockNode {
    #[method(name = "call")]
    async fn call_contract(&self, tx: Value, block: Option<Value>) -> RpcResult<Bytes>;

    #[method(name = "getCode")]
    async fn get_code(&self, address: Address, block: Option<Value>) -> RpcResult<Bytes>;

    #[method(name = "gasPrice")]
    async fn gas_price(&self) -> RpcResult<U256>;

    #[method(name = "maxPriorityFeePerGas")]
    async fn max_priority_fee_per_gas(&self) -> RpcResult<U256>;

    #[method(name = "estimateUserOperationGas")]
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<GasEstimate>;

    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<H256>;
}

#[rpc(server, namespace = "zd")]
pub trait MockPaymaster {
    #[method(name = "sponsorUserOperation")]
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> RpcResult<SponsorUserOperationResponse>;
}

#[derive(Clone)]
struct MockProvider {
    behavior: MockBehavior,
}

fn rejection(code: i32, message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObject::owned(code, message.into(), None::<()>)
}

#[async_trait]
impl MockNodeServer for MockProvider {
    async fn call_contract(&self, tx: Value, _block: Option<Value>) -> RpcResult<Bytes> {
        let input = tx
            .get("data")
            .or_else(|| tx.get("input"))
            .and_then(Value::as_str)
            .unwrap_or("0x");
        let data = hex::decode(input.trim_start_matches("0x"))
            .map_err(|e| rejection(-32602, e.to_string()))?;
        if data.len() < 4 {
            return Err(rejection(-32602, "missing selector"));
        }

        if data[..4] == id("getAccountAddress(bytes,uint256)") {
            // Any injective function of the call data will do for a CREATE2 stand-in.
            let digest = keccak256(&data);
            let address = Address::from_slice(&digest[12..]);
            Ok(encode(&[Token::Address(address)]).into())
        } else if data[..4] == id("getNonce(address,uint192)") {
            Ok(encode(&[Token::Uint(self.behavior.nonce)]).into())
        } else {
            Err(rejection(3, "execution reverted"))
        }
    }

    async fn get_code(&self, _address: Address, _block: Option<Value>) -> RpcResult<Bytes> {
        if self.behavior.deployed {
            Ok(Bytes::from(vec![0x60, 0x80, 0x60, 0x40]))
        } else {
            Ok(Bytes::default())
        }
    }

    async fn gas_price(&self) -> RpcResult<U256> {
        Ok(self
            .behavior
            .gas_price
            .unwrap_or_else(|| U256::from(10_000_000_000u64)))
    }

    async fn max_priority_fee_per_gas(&self) -> RpcResult<U256> {
        Ok(U256::from(1_000_000_000u64))
    }

    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperation,
        _entry_point: Address,
    ) -> RpcResult<GasEstimate> {
        if let Some(reason) = &self.behavior.reject_estimation {
            return Err(rejection(-32500, reason.clone()));
        }
        if user_operation.signature.is_empty() {
            return Err(rejection(-32602, "signature required for simulation"));
        }
        Ok(GasEstimate {
            pre_verification_gas: U256::from(50_000),
            verification_gas_limit: U256::from(150_000),
            call_gas_limit: U256::from(80_000),
        })
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<H256> {
        if let Some(reason) = &self.behavior.reject_submission {
            return Err(rejection(-32507, reason.clone()));
        }
        Ok(user_operation.hash(entry_point, 1))
    }
}

#[async_trait]
impl MockPaymasterServer for MockProvider {
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> RpcResult<SponsorUserOperationResponse> {
        if self.behavior.paymaster_fails {
            return Err(rejection(-32603, "paymaster out of funds"));
        }
        Ok(SponsorUserOperationResponse {
            paymaster_and_data: Bytes::from(MOCK_PAYMASTER_AND_DATA.to_vec()),
            verification_gas_limit: Some(
                request.user_op.verification_gas_limit + U256::from(50_000),
            ),
            ..Default::default()
        })
    }
}

pub struct MockInfra {
    pub url: String,
    _handle: Option<ServerHandle>,
}

impl MockInfra {
    pub async fn start(behavior: MockBehavior) -> anyhow::Result<Self> {
        let server = ServerBuilder::default().build("127.0.0.1:0").await?;
        let url = format!("http://{}", server.local_addr()?);

        let provider = MockProvider { behavior };
        let mut module = MockNodeServer::into_rpc(provider.clone());
        module.merge(MockPaymasterServer::into_rpc(provider))?;
        let handle = server.start(module);

        Ok(Self {
            url,
            _handle: Some(handle),
        })
    }

    /// Points at a port nothing listens on.
    pub fn unreachable() -> Self {
        Self {
            url: "http://127.0.0.1:1".to_string(),
            _handle: None,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            bundler_url: self.url.clone(),
            paymaster_url: self.url.clone(),
            project_id: None,
            chain_id: None,
            sponsor_by_default: true,
        }
    }
}
