//! §4.1 L2 State Derivation Engine: genesis construction plus the event
//! application algorithm that both the Fullnode's canonical instance and
//! the Builder's private instance run.

pub mod engine;
pub mod error;
pub mod genesis;

pub use engine::{ApplyOutcome, DerivationEngine};
pub use error::DerivationError;
pub use genesis::{GenesisAddresses, GENESIS_BLOCK_COUNT};
