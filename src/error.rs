// src/error.rs
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ethers::contract::ContractError;
use ethers::providers::{Middleware, ProviderError};
use jsonrpsee::core::Error as ClientError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::signer::SigningNotSupported;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Chain with id {0} not found")]
    UnknownChain(u64),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Project ID is required")]
    MissingProjectId,

    #[error("Chain ID is required")]
    MissingChainId,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    SigningNotSupported(#[from] SigningNotSupported),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rejected by the provider; carries the provider's message unchanged.
    #[error("{0}")]
    InvalidOperation(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::UnknownChain(_)
            | RelayError::InvalidAddress(_)
            | RelayError::MissingProjectId
            | RelayError::MissingChainId
            | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            RelayError::SigningNotSupported(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClientError> for RelayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Call(object) => RelayError::InvalidOperation(object.message().to_string()),
            other => RelayError::ProviderUnavailable(other.to_string()),
        }
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        RelayError::ProviderUnavailable(err.to_string())
    }
}

impl<M: Middleware> From<ContractError<M>> for RelayError {
    fn from(err: ContractError<M>) -> Self {
        RelayError::ProviderUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
