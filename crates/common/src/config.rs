use ethereum_types::{Address, U256};

/// Chain parameters that MUST be identical across every independent
/// derivation-engine instance (§4.1.3, §4.1.5). Sourced from CLI/env
/// configuration, never hardcoded, so the same binary serves any network.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GenesisConfig {
    /// Fixed L2 chain id used for every derived transaction.
    pub l2_chain_id: u64,
    /// The System Address S. Derived off-process from a fixed secret; this
    /// crate only ever sees the address, never the secret.
    pub system_address: Address,
    /// Astronomical starting balance credited to S at genesis.
    pub system_balance: U256,
    /// Block gas limit used for every derived L2 block.
    pub block_gas_limit: u64,
    /// L1 block number at which the rollup contract was deployed; catch-up
    /// starts here.
    pub l1_deployment_block: u64,
    /// State root the L1 rollup contract recorded at deployment. Genesis
    /// construction MUST reproduce this exactly or abort (§4.1,
    /// `MisconfiguredGenesis`).
    pub expected_genesis_root: ethereum_types::H256,
}

impl GenesisConfig {
    /// Base fee and gas price are fixed at zero by §4.1.3; they are not
    /// configurable and are not part of this struct on purpose.
    pub const BASE_FEE: u64 = 0;
    pub const GAS_PRICE: u64 = 0;
}
