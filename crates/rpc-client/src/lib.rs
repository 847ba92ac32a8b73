//! A plain JSON-RPC client for both EVM roles (§4.5, §6). No in-process
//! EVM lives in this crate or anywhere downstream of it: every state
//! read and every transaction goes out over HTTP to an external L1 or
//! L2 node.

pub mod anvil;
pub mod client;
pub mod error;
pub mod types;

pub use client::{RetryPolicy, RpcClient};
pub use error::RpcClientError;
pub use types::{BlockIdentifier, CallFrame, CallRequest, RpcBlock, RpcLog};
