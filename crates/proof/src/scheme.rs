//! The proof oracle (§1, §9): "the proof system itself is abstracted to a
//! signing/verification oracle... replacement by a zk-SNARK or TEE
//! attestation affects only the proof-generation step." `ProofScheme` is
//! the tagged union that keeps that replacement a matter of adding a
//! variant, mirroring the teacher's `ProverType`/`ProvingOutput` split in
//! `proving_systems.rs`.
use crate::error::ProofError;
use ethereum_types::{Address, H256, H520};
use keccak_hash::keccak;
use secp256k1::{All, Message, Secp256k1, SecretKey};

/// One concrete proof as attached to a submitted L1 transaction. Only
/// `AdminSignature` exists today; a zk backend would add a sibling variant
/// carrying its own proof bytes, never replace this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    AdminSignature(H520),
}

impl Proof {
    /// Raw bytes as the rollup's abstract endpoints expect them (§6).
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Proof::AdminSignature(sig) => sig.as_bytes().to_vec(),
        }
    }
}

/// The scheme that produces and checks [`Proof`]s. A `ProofScheme` is
/// constructed once per Builder instance from its configured signing key
/// (§6 "signing key for proofs (Builder only)").
#[derive(Clone)]
pub enum ProofScheme {
    AdminSignature(AdminSignatureScheme),
}

impl ProofScheme {
    pub fn admin_signature(private_key: SecretKey) -> Self {
        ProofScheme::AdminSignature(AdminSignatureScheme::new(private_key))
    }

    /// Signs `digest` (a statement digest from [`crate::statement`]).
    pub fn prove(&self, digest: H256) -> Result<Proof, ProofError> {
        match self {
            ProofScheme::AdminSignature(scheme) => {
                Ok(Proof::AdminSignature(scheme.sign(digest)))
            }
        }
    }

    /// Checks that `proof` was produced over `digest` by the scheme's
    /// admin key. The on-chain verifier performs the equivalent check in
    /// Solidity; this exists so the Builder and tests can check a proof
    /// before ever broadcasting it.
    pub fn verify(&self, digest: H256, proof: &Proof) -> Result<(), ProofError> {
        match (self, proof) {
            (ProofScheme::AdminSignature(scheme), Proof::AdminSignature(sig)) => {
                scheme.verify(digest, sig)
            }
        }
    }
}

/// ECDSA-over-secp256k1 recoverable signature by a single admin key, the
/// reference proof mechanism named in §1. Mirrors `LocalSigner` in the
/// teacher's `types::signer` module, specialized to sign a statement
/// digest instead of an RLP transaction payload.
#[derive(Clone)]
pub struct AdminSignatureScheme {
    secp: Secp256k1<All>,
    private_key: SecretKey,
    admin_address: Address,
}

impl AdminSignatureScheme {
    pub fn new(private_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let hash = keccak(&private_key.public_key(&secp).serialize_uncompressed()[1..]);
        let admin_address = Address::from_slice(&hash.as_bytes()[12..]);
        Self {
            secp,
            private_key,
            admin_address,
        }
    }

    pub fn admin_address(&self) -> Address {
        self.admin_address
    }

    fn sign(&self, digest: H256) -> H520 {
        let msg = Message::from_digest(digest.0);
        let (recovery_id, signature) = self
            .secp
            .sign_ecdsa_recoverable(&msg, &self.private_key)
            .serialize_compact();
        H520::from_slice(&[signature.as_slice(), &[recovery_id.to_i32() as u8]].concat())
    }

    fn verify(&self, digest: H256, signature: &H520) -> Result<(), ProofError> {
        let recovered = recover_signer(&self.secp, digest, signature)?;
        if recovered == self.admin_address {
            Ok(())
        } else {
            Err(ProofError::VerificationFailed)
        }
    }
}

fn recover_signer(
    secp: &Secp256k1<All>,
    digest: H256,
    signature: &H520,
) -> Result<Address, ProofError> {
    let recovery_id = secp256k1::ecdsa::RecoveryId::from_i32(signature[64] as i32)
        .map_err(|_| ProofError::MalformedSignature)?;
    let recoverable = secp256k1::ecdsa::RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| ProofError::MalformedSignature)?;
    let msg = Message::from_digest(digest.0);
    let public_key = secp
        .recover_ecdsa(&msg, &recoverable)
        .map_err(|_| ProofError::MalformedSignature)?;
    let hash = keccak(&public_key.serialize_uncompressed()[1..]);
    Ok(Address::from_slice(&hash.as_bytes()[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn random_key() -> SecretKey {
        SecretKey::new(&mut OsRng)
    }

    #[test]
    fn a_signature_verifies_against_its_own_digest() {
        let scheme = ProofScheme::admin_signature(random_key());
        let digest = H256::repeat_byte(0x42);
        let proof = scheme.prove(digest).unwrap();
        scheme.verify(digest, &proof).unwrap();
    }

    #[test]
    fn a_signature_does_not_verify_against_a_different_digest() {
        let scheme = ProofScheme::admin_signature(random_key());
        let proof = scheme.prove(H256::repeat_byte(0x42)).unwrap();
        let err = scheme.verify(H256::repeat_byte(0x43), &proof).unwrap_err();
        assert!(matches!(err, ProofError::VerificationFailed));
    }

    #[test]
    fn a_signature_from_a_different_key_does_not_verify() {
        let scheme_a = ProofScheme::admin_signature(random_key());
        let scheme_b = ProofScheme::admin_signature(random_key());
        let digest = H256::repeat_byte(0x7);
        let proof = scheme_a.prove(digest).unwrap();
        let err = scheme_b.verify(digest, &proof).unwrap_err();
        assert!(matches!(err, ProofError::VerificationFailed));
    }
}
