//! Shared primitives for the synchronous rollup core: EVM-shaped types, event
//! wire formats, the signed L2 transaction envelope and its RLP codec.

pub mod calldata;
pub mod config;
pub mod error;
pub mod events;
pub mod hashing;
pub mod primitives;
pub mod tx;

pub use ethereum_types::{Address, H256, U256};
pub use hashing::keccak256;

/// Keccak-256 of an empty byte string, used as the default code hash for EOAs.
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Keccak-256 of the RLP of an empty list, the state/storage root of an
/// account with no storage.
pub const EMPTY_TRIE_HASH: H256 = H256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);
