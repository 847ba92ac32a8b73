//! §6.1 "RPC transport": a plain JSON-RPC 2.0 server over `axum`, one
//! instance for the Fullnode's `eth_*` read surface and one for the
//! Builder's `submit`/`status` surface, both dispatched the same way the
//! teacher's networking crate splits `server.rs`/`router.rs`.

pub mod builder;
pub mod context;
pub mod error;
pub mod eth;
pub mod router;
pub mod server;
pub mod types;

pub use context::{BuilderContext, FullnodeContext, SyncHealth};
pub use error::RpcErr;
pub use server::{serve_builder, serve_fullnode};
