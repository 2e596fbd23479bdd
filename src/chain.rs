// src/chain.rs
use ethers::types::Chain;

use crate::error::RelayError;

/// Static network metadata for a chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub id: u64,
    pub chain: Chain,
}

impl ChainDescriptor {
    pub fn name(&self) -> &str {
        self.chain.as_ref()
    }

    /// Chains without EIP-1559 fee markets.
    pub fn is_legacy(&self) -> bool {
        self.chain.is_legacy()
    }
}

pub fn get_chain_from_id(chain_id: u64) -> Result<ChainDescriptor, RelayError> {
    Chain::try_from(chain_id)
        .map(|chain| ChainDescriptor { id: chain_id, chain })
        .map_err(|_| RelayError::UnknownChain(chain_id))
}
