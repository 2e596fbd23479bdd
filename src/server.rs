// src/server.rs
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ethers::signers::Signer;
use ethers::types::U256;
use ethers::utils::to_checksum;
use tracing::debug;

use crate::account::{resolve_account, EcdsaValidator, KernelAccount};
use crate::builder::OperationBuilder;
use crate::chain::get_chain_from_id;
use crate::config::{entry_point, parse_address, Config};
use crate::error::RelayError;
use crate::rpc::Infrastructure;
use crate::signer::NullSigner;
use crate::submitter::submit_user_operation;
use crate::types::{
    Call, CallRequest, Calls, CallsRequest, ChainContext, CreateUserOpRequest,
    CreateUserOpResponse, GetAddressRequest, GetAddressResponse, SendUserOpRequest,
    SendUserOpResponse, UserOperation,
};

pub fn router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/get-address", post(get_address))
        .route("/create-userop", post(create_user_op))
        .route("/send-userop", post(send_user_op))
        .with_state(config)
}

async fn resolve_owner_account(
    infra: &Infrastructure,
    owner: &str,
    index: Option<U256>,
    chain_id: Option<u64>,
) -> Result<KernelAccount, RelayError> {
    let mut signer = NullSigner::new(parse_address(owner)?);
    if let Some(chain_id) = chain_id {
        signer = signer.with_chain_id(chain_id);
    }
    let validator = EcdsaValidator::new(signer);
    resolve_account(infra.provider.clone(), &validator, index.unwrap_or_default()).await
}

fn parse_calls(request: CallsRequest) -> Result<Calls, RelayError> {
    fn parse_call(call: CallRequest) -> Result<Call, RelayError> {
        Ok(Call {
            to: parse_address(&call.to)?,
            value: call.value,
            data: call.data,
        })
    }

    match request {
        CallsRequest::Single(call) => Ok(Calls::Single(parse_call(call)?)),
        CallsRequest::Batch(calls) if calls.is_empty() => Err(RelayError::InvalidRequest(
            "at least one call is required".to_string(),
        )),
        CallsRequest::Batch(calls) => Ok(Calls::Batch(
            calls.into_iter().map(parse_call).collect::<Result<_, _>>()?,
        )),
    }
}

async fn get_address(
    State(config): State<Arc<Config>>,
    body: Result<Json<GetAddressRequest>, JsonRejection>,
) -> Result<Json<GetAddressResponse>, RelayError> {
    let Json(request) = body?;
    let project_id = config.project_id(request.project_id.as_deref())?;
    let chain = request
        .chain_id
        .or(config.chain_id)
        .map(get_chain_from_id)
        .transpose()?;

    let infra = Infrastructure::connect(&config, project_id)?;
    let account = resolve_owner_account(
        &infra,
        &request.address,
        request.index,
        chain.map(|chain| chain.id),
    )
    .await?;

    Ok(Json(GetAddressResponse {
        address: to_checksum(&account.address, None),
    }))
}

async fn create_user_op(
    State(config): State<Arc<Config>>,
    body: Result<Json<CreateUserOpRequest>, JsonRejection>,
) -> Result<Json<CreateUserOpResponse>, RelayError> {
    let Json(request) = body?;
    let context = ChainContext {
        project_id: config.project_id(request.project_id.as_deref())?.to_string(),
        chain: config.chain(request.chain_id)?,
        entry_point: entry_point(request.entry_point.as_deref())?,
    };
    let calls = parse_calls(request.request)?;
    let sponsor = request.sponsored.unwrap_or(config.sponsor_by_default);

    let infra = Infrastructure::connect(&config, &context.project_id)?;
    let account =
        resolve_owner_account(&infra, &request.address, request.index, Some(context.chain.id))
            .await?;

    let (user_operation, user_op_hash) = OperationBuilder::new(&infra, &context)
        .build(&account, &calls, sponsor)
        .await?;

    Ok(Json(CreateUserOpResponse {
        user_operation,
        user_op_hash,
    }))
}

async fn send_user_op(
    State(config): State<Arc<Config>>,
    body: Result<Json<SendUserOpRequest>, JsonRejection>,
) -> Result<Json<SendUserOpResponse>, RelayError> {
    let Json(request) = body?;
    let context = ChainContext {
        project_id: config.project_id(request.project_id.as_deref())?.to_string(),
        chain: config.chain(request.chain_id)?,
        entry_point: entry_point(request.entry_point.as_deref())?,
    };
    let user_op: UserOperation = request
        .user_operation
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| RelayError::InvalidRequest(format!("userOperation: {e}")))?
        .ok_or_else(|| RelayError::InvalidRequest("userOperation is required".to_string()))?;
    debug!("Forwarding user operation from {:?}", user_op.sender);

    let infra = Infrastructure::connect(&config, &context.project_id)?;
    let user_op_hash = submit_user_operation(&infra, &context, user_op).await?;

    Ok(Json(SendUserOpResponse { user_op_hash }))
}
