// src/builder.rs
use ethers::providers::Middleware;
use ethers::types::{Bytes, H256, U256};
use tracing::{debug, warn};

use crate::account::KernelAccount;
use crate::contracts::{dummy_signature, encode_calls, EntryPoint};
use crate::error::RelayError;
use crate::rpc::{BundlerApiClient, Infrastructure, PaymasterApiClient};
use crate::types::{Calls, ChainContext, SponsorUserOperationRequest, UserOperation};

// Headroom on the current gas price for maxFeePerGas, in percent.
const MAX_FEE_BUFFER: u64 = 20;

pub struct OperationBuilder<'a> {
    infra: &'a Infrastructure,
    context: &'a ChainContext,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(infra: &'a Infrastructure, context: &'a ChainContext) -> Self {
        Self { infra, context }
    }

    /// Builds an unsigned user operation for `calls` and returns it with the
    /// hash the owner has to sign.
    pub async fn build(
        &self,
        account: &KernelAccount,
        calls: &Calls,
        sponsor: bool,
    ) -> Result<(UserOperation, H256), RelayError> {
        if matches!(calls, Calls::Batch(batch) if batch.is_empty()) {
            return Err(RelayError::InvalidRequest(
                "at least one call is required".to_string(),
            ));
        }

        // 1. Encode the calls
        let call_data = encode_calls(calls);

        // 2. Draft with nonce, init code and fees, then estimate gas
        let mut user_op = self.draft(account, call_data).await?;
        let estimate = self
            .infra
            .bundler
            .estimate_user_operation_gas(user_op.clone(), self.context.entry_point)
            .await?;
        user_op.apply_gas_estimate(&estimate);

        // 3. Best-effort sponsorship
        if sponsor {
            self.sponsor(&mut user_op).await;
        }

        // 4. Hash without a signature
        user_op.signature = Bytes::default();
        let hash = user_op.hash(self.context.entry_point, self.context.chain.id);
        debug!(
            "Built user operation {:?} for {:?} (owner {:?}, index {}, sponsored: {})",
            hash,
            user_op.sender,
            account.owner,
            account.index,
            user_op.is_sponsored()
        );

        Ok((user_op, hash))
    }

    async fn draft(
        &self,
        account: &KernelAccount,
        call_data: Bytes,
    ) -> Result<UserOperation, RelayError> {
        let provider = self.infra.provider.clone();

        let nonce = EntryPoint::new(self.context.entry_point, provider.clone())
            .get_nonce(account.address, U256::zero())
            .call()
            .await?;

        let code = provider.get_code(account.address, None).await?;
        let init_code = if code.is_empty() {
            account.init_code()
        } else {
            Bytes::default()
        };

        let (max_fee_per_gas, max_priority_fee_per_gas) = self.estimate_fees().await?;

        Ok(UserOperation {
            sender: account.address,
            nonce,
            init_code,
            call_data,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            signature: dummy_signature(),
            ..Default::default()
        })
    }

    async fn estimate_fees(&self) -> Result<(U256, U256), RelayError> {
        let provider = &self.infra.provider;
        let gas_price = provider.get_gas_price().await?;
        if self.context.chain.is_legacy() {
            return Ok((gas_price, gas_price));
        }

        let priority_fee: U256 = provider.request("eth_maxPriorityFeePerGas", ()).await?;
        let max_fee = gas_price
            .checked_mul(U256::from(100 + MAX_FEE_BUFFER))
            .map(|fee| fee / U256::from(100))
            .ok_or_else(|| {
                RelayError::ProviderUnavailable(format!("gas price out of range: {gas_price}"))
            })?;
        Ok((max_fee.max(priority_fee), priority_fee))
    }

    /// Failures leave the operation unsponsored with empty paymaster data.
    async fn sponsor(&self, user_op: &mut UserOperation) {
        let request = SponsorUserOperationRequest {
            chain_id: self.context.chain.id,
            user_op: user_op.clone(),
            entry_point_address: self.context.entry_point,
            should_override_fee: false,
            manual_gas_estimation: false,
        };

        match self.infra.paymaster.sponsor_user_operation(request).await {
            Ok(sponsorship) => {
                user_op.apply_sponsorship(sponsorship);
                debug!("Sponsored user operation for {:?}", user_op.sender);
            }
            Err(e) => {
                warn!(
                    "Paymaster declined to sponsor {:?}, continuing unsponsored: {}",
                    user_op.sender, e
                );
            }
        }
    }
}
