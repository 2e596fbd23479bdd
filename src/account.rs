// src/account.rs
use std::sync::Arc;

use ethers::providers::Middleware;
use ethers::signers::Signer;
use ethers::types::{Address, Bytes, U256};
use tracing::debug;

use crate::contracts::{
    encode_create_account, encode_initialize, KernelFactory, ECDSA_VALIDATOR, KERNEL_FACTORY,
};
use crate::error::RelayError;

/// Binds a Kernel account to the ECDSA validator plugin, with the signer's
/// address as the owner.
#[derive(Debug, Clone)]
pub struct EcdsaValidator<S> {
    signer: S,
}

impl<S: Signer> EcdsaValidator<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        ECDSA_VALIDATOR
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn enable_data(&self) -> Bytes {
        self.owner().as_bytes().to_vec().into()
    }
}

/// A counterfactual Kernel account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelAccount {
    pub owner: Address,
    pub index: U256,
    pub address: Address,
    pub factory_data: Bytes,
}

impl KernelAccount {
    /// Factory address followed by the `createAccount` call, for deploying
    /// the account with its first operation.
    pub fn init_code(&self) -> Bytes {
        let mut code = KERNEL_FACTORY.as_bytes().to_vec();
        code.extend_from_slice(&self.factory_data);
        code.into()
    }
}

/// Resolves the deterministic account address for `(owner, index)`.
pub async fn resolve_account<M, S>(
    client: Arc<M>,
    validator: &EcdsaValidator<S>,
    index: U256,
) -> Result<KernelAccount, RelayError>
where
    M: Middleware + 'static,
    S: Signer,
{
    let initialize = encode_initialize(validator.address(), validator.enable_data());
    let factory = KernelFactory::new(KERNEL_FACTORY, client);

    let address = factory
        .get_account_address(initialize.clone(), index)
        .call()
        .await?;

    debug!(
        "Resolved account {:?} for owner {:?} at index {}",
        address,
        validator.owner(),
        index
    );

    Ok(KernelAccount {
        owner: validator.owner(),
        index,
        address,
        factory_data: encode_create_account(initialize, index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockInfra};
    use crate::rpc::Infrastructure;
    use crate::signer::NullSigner;

    const OWNER: &str = "0xa6ea52EC5a01E92BCb83055d743a1aE9367988b8";

    fn validator(owner: &str) -> EcdsaValidator<NullSigner> {
        EcdsaValidator::new(NullSigner::new(owner.parse().unwrap()))
    }

    #[test]
    fn enable_data_is_the_owner_address() {
        let validator = validator(OWNER);
        assert_eq!(validator.enable_data().len(), 20);
        assert_eq!(&validator.enable_data()[..], validator.owner().as_bytes());
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let infra = MockInfra::start(MockBehavior::default()).await.unwrap();
        let clients = Infrastructure::connect(&infra.config(), "project").unwrap();

        let first = resolve_account(clients.provider.clone(), &validator(OWNER), U256::zero())
            .await
            .unwrap();
        let second = resolve_account(clients.provider.clone(), &validator(OWNER), U256::zero())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(&first.init_code()[..20], KERNEL_FACTORY.as_bytes());
    }

    #[tokio::test]
    async fn distinct_indices_and_owners_resolve_apart() {
        let infra = MockInfra::start(MockBehavior::default()).await.unwrap();
        let clients = Infrastructure::connect(&infra.config(), "project").unwrap();

        let zero = resolve_account(clients.provider.clone(), &validator(OWNER), U256::zero())
            .await
            .unwrap();
        let one = resolve_account(clients.provider.clone(), &validator(OWNER), U256::one())
            .await
            .unwrap();
        let other = resolve_account(
            clients.provider.clone(),
            &validator("0x4967ebd74567dE1b091b7833C2B1ef4447A583fD"),
            U256::zero(),
        )
        .await
        .unwrap();

        assert_ne!(zero.address, one.address);
        assert_ne!(zero.address, other.address);
    }

    #[tokio::test]
    async fn unreachable_provider_is_reported() {
        let infra = MockInfra::unreachable();
        let clients = Infrastructure::connect(&infra.config(), "project").unwrap();
        let err = resolve_account(clients.provider.clone(), &validator(OWNER), U256::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ProviderUnavailable(_)));
    }
}
