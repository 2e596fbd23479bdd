// src/signer.rs
use async_trait::async_trait;
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip712::Eip712;
use ethers::types::{Address, Signature};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningNotSupported {
    #[error("Sign message not supported")]
    Message,

    #[error("Sign typed data not supported")]
    TypedData,

    #[error("Sign transaction not supported")]
    Transaction,
}

/// A signer that only knows its address. Account derivation needs a signer
/// to bind the validator to; the relay never holds keys, so every signing
/// request fails.
#[derive(Debug, Clone)]
pub struct NullSigner {
    address: Address,
    chain_id: u64,
}

impl NullSigner {
    pub fn new(address: Address) -> Self {
        Self { address, chain_id: 1 }
    }
}

#[async_trait]
impl Signer for NullSigner {
    type Error = SigningNotSupported;

    async fn sign_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        _message: S,
    ) -> Result<Signature, Self::Error> {
        Err(SigningNotSupported::Message)
    }

    async fn sign_transaction(&self, _message: &TypedTransaction) -> Result<Signature, Self::Error> {
        Err(SigningNotSupported::Transaction)
    }

    async fn sign_typed_data<T: Eip712 + Send + Sync>(
        &self,
        _payload: &T,
    ) -> Result<Signature, Self::Error> {
        Err(SigningNotSupported::TypedData)
    }

    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn with_chain_id<T: Into<u64>>(mut self, chain_id: T) -> Self {
        self.chain_id = chain_id.into();
        self
    }
}
