// src/rpc.rs
use std::sync::Arc;

use ethers::providers::{Http, Provider};
use ethers::types::{Address, H256};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::proc_macros::rpc;

use crate::config::Config;
use crate::error::RelayError;
use crate::types::{
    GasEstimate, SponsorUserOperationRequest, SponsorUserOperationResponse, UserOperation,
};

/// ERC-4337 bundler methods served by the infrastructure provider.
#[rpc(client, namespace = "eth")]
pub trait BundlerApi {
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

/// ZeroDev paymaster sponsorship.
#[rpc(client, namespace = "zd")]
pub trait PaymasterApi {
    #[method(name = "sponsorUserOperation")]
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> RpcResult<SponsorUserOperationResponse>;
}

/// Per-request handles onto the provider for one project: a plain chain
/// client plus the bundler and paymaster JSON-RPC clients.
pub struct Infrastructure {
    pub provider: Arc<Provider<Http>>,
    pub bundler: HttpClient,
    pub paymaster: HttpClient,
}

impl Infrastructure {
    pub fn connect(config: &Config, project_id: &str) -> Result<Self, RelayError> {
        let bundler_url = config.bundler_endpoint(project_id);
        let paymaster_url = config.paymaster_endpoint(project_id);

        let provider = Provider::<Http>::try_from(bundler_url.as_str())
            .map_err(|e| RelayError::ProviderUnavailable(e.to_string()))?;
        let bundler = HttpClientBuilder::default().build(&bundler_url)?;
        let paymaster = HttpClientBuilder::default().build(&paymaster_url)?;

        Ok(Self {
            provider: Arc::new(provider),
            bundler,
            paymaster,
        })
    }
}
