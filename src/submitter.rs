// src/submitter.rs
use ethers::types::H256;
use tracing::info;

use crate::error::RelayError;
use crate::rpc::{BundlerApiClient, Infrastructure};
use crate::types::{ChainContext, UserOperation};

/// Hands a signed operation to the bundler and returns the provider's hash
/// straight away. Inclusion is not awaited.
pub async fn submit_user_operation(
    infra: &Infrastructure,
    context: &ChainContext,
    user_op: UserOperation,
) -> Result<H256, RelayError> {
    let sender = user_op.sender;
    let user_op_hash = infra
        .bundler
        .send_user_operation(user_op, context.entry_point)
        .await?;

    info!(
        "Submitted user operation {:?} from {:?} on {} for project {}",
        user_op_hash,
        sender,
        context.chain.name(),
        context.project_id
    );

    Ok(user_op_hash)
}
