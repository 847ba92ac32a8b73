//! §4.4 Registration & Submission Pipeline: the Builder-side half of the
//! system. Discovery (`rollup_discovery`) tells this crate what a
//! candidate transaction needs; this crate turns that into signed,
//! ordered L1 submissions against the abstract rollup contract.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rollup_endpoint;
pub mod sync_status;

pub use config::SubmitterConfig;
pub use error::SubmitterError;
pub use pipeline::{SourceChain, SubmitHints, SubmitRequest, Submitter};
pub use rollup_endpoint::{
    ProcessSingleTxParams, RegisterIncomingCallParams, RollupEndpoint, RpcRollupEndpoint,
};
pub use sync_status::{channel as sync_gate_channel, SyncGate, SyncGateHandle};
