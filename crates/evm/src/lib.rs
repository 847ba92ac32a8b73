//! §4.5 L2 Execution Driver: a thin trait over an externally hosted EVM,
//! plus the Anvil-backed reference binding and an in-memory test double.

pub mod anvil_driver;
pub mod driver;
pub mod error;
pub mod testing;

pub use anvil_driver::AnvilDriver;
pub use driver::L2ExecutionDriver;
pub use error::EvmDriverError;
