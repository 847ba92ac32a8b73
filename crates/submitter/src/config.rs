use ethereum_types::Address;
use std::time::Duration;

/// Submission-pipeline tuning, sourced from CLI/env configuration like
/// every other chain parameter (§6, §9 "Global mutable state").
#[derive(Clone, Debug)]
pub struct SubmitterConfig {
    /// The external L1 rollup contract's address (§1, §6); out of scope
    /// to implement, but the Builder still needs it to address its
    /// endpoints and to derive L2→L1 proxy addresses (§4.6).
    pub rollup_address: Address,
    /// Bounds the fixed-point discovery loop (§4.3.3).
    pub max_discovery_iterations: u32,
    /// How many times a submit may restart discovery after losing a race
    /// against an intervening state advance before giving up (§5: "A
    /// discovery whose state assumptions are invalidated by an
    /// intervening state advance MUST restart").
    pub max_state_race_retries: u32,
    /// How long `submit` waits for the private derivation engine to catch
    /// up to the L1 tip before giving up (§4.4 "Ensure ... caught up. If
    /// not, wait").
    pub sync_wait_timeout: Duration,
    /// Gates the optional, off-by-default expiry sweep (§4.4.1, §9 open
    /// questions).
    pub expiry_sweep_enabled: bool,
    pub expiry_sweep_interval: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            rollup_address: Address::zero(),
            max_discovery_iterations: rollup_discovery::DEFAULT_MAX_ITERATIONS,
            max_state_race_retries: 3,
            sync_wait_timeout: Duration::from_secs(30),
            expiry_sweep_enabled: false,
            expiry_sweep_interval: Duration::from_secs(300),
        }
    }
}
