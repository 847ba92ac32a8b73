//! The proof oracle (§1, §9): computes the statement digests the L1
//! verifier expects and produces/checks proofs over them. Today the only
//! scheme is an admin ECDSA signature; a zk-SNARK or TEE attestation
//! backend would add a sibling [`scheme::ProofScheme`] variant without
//! touching [`statement`].
mod error;
mod scheme;
mod statement;

pub use error::ProofError;
pub use scheme::{AdminSignatureScheme, Proof, ProofScheme};
pub use statement::{
    hash_outgoing_calls, hash_results, ProcessTxStatement, RegisterIncomingCallStatement,
};
