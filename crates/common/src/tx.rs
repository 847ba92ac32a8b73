use crate::hashing::keccak256;
use ethereum_types::{Address, H256, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::Message;

/// Destination of a legacy-shaped signed transaction: either a contract
/// creation (`None`) or a call (`Some(address)`). The derivation engine
/// only ever decodes calls (deployments happen as privileged sends, never
/// as a user-submitted L2 tx), but creation is kept for completeness of
/// the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    Create,
    Call(Address),
}

/// The signed L2 transaction carried inside `L2BlockProcessed.rlpEncodedTx`
/// (§3, §4.1.1). Deliberately legacy-shaped (no EIP-1559 fee fields) since
/// §4.1.3 fixes gas price at zero across the whole chain; richer envelopes
/// can be layered on later without changing the derivation algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedL2Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Vec<u8>,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("malformed RLP: {0}")]
    Rlp(#[from] DecoderError),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u64),
    #[error("signature does not recover to a valid public key: {0}")]
    RecoveryFailed(String),
}

impl Encodable for TxKind {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            TxKind::Create => s.append(&""),
            TxKind::Call(addr) => s.append(addr),
        };
    }
}

impl Decodable for TxKind {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_empty() {
            Ok(TxKind::Create)
        } else {
            Ok(TxKind::Call(rlp.as_val()?))
        }
    }
}

impl SignedL2Transaction {
    /// The 9-field RLP list, excluding nothing — this is both the signing
    /// preimage base (v/r/s zeroed would be used for EIP-155, but we sign
    /// and encode the whole tuple directly since chain id is fixed and
    /// implicit).
    fn rlp_encode(&self, stream: &mut RlpStream) {
        stream.begin_list(9);
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        self.to.rlp_append(stream);
        stream.append(&self.value);
        stream.append(&self.data);
        stream.append(&self.v);
        stream.append(&self.r);
        stream.append(&self.s);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new();
        self.rlp_encode(&mut stream);
        stream.out().to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TxError> {
        let rlp = Rlp::new(bytes);
        Ok(SignedL2Transaction {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to: rlp.val_at(3)?,
            value: rlp.val_at(4)?,
            data: rlp.val_at(5)?,
            v: rlp.val_at(6)?,
            r: rlp.val_at(7)?,
            s: rlp.val_at(8)?,
        })
    }

    /// Hash over the unsigned fields, the ECDSA signing preimage.
    pub fn signing_hash(&self) -> H256 {
        let mut stream = RlpStream::new();
        stream.begin_list(6);
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        self.to.rlp_append(&mut stream);
        stream.append(&self.value);
        stream.append(&self.data);
        keccak256(stream.out())
    }

    /// Hash of the full signed encoding, used as the transaction hash.
    pub fn tx_hash(&self) -> H256 {
        keccak256(self.encode())
    }

    /// Recovers the sender address from (v, r, s) over `signing_hash`
    /// (§4.1.1 "recover the sender").
    pub fn recover_sender(&self) -> Result<Address, TxError> {
        let recovery_id = match self.v {
            0 | 27 => 0u8,
            1 | 28 => 1u8,
            other => return Err(TxError::InvalidRecoveryId(other)),
        };
        let mut sig_bytes = [0u8; 64];
        self.r.to_big_endian(&mut sig_bytes[0..32]);
        self.s.to_big_endian(&mut sig_bytes[32..64]);

        let rec_id = RecoveryId::from_i32(recovery_id as i32)
            .map_err(|e| TxError::RecoveryFailed(e.to_string()))?;
        let sig = RecoverableSignature::from_compact(&sig_bytes, rec_id)
            .map_err(|e| TxError::RecoveryFailed(e.to_string()))?;
        let message = Message::from_digest(self.signing_hash().to_fixed_bytes());
        let pubkey = sig
            .recover(&message)
            .map_err(|e| TxError::RecoveryFailed(e.to_string()))?;
        let uncompressed = pubkey.serialize_uncompressed();
        // Address = last 20 bytes of keccak256(pubkey.x ‖ pubkey.y), skipping
        // the 0x04 prefix byte, the standard Ethereum sender-recovery rule.
        let hash = keccak256(&uncompressed[1..]);
        Ok(Address::from_slice(&hash.as_bytes()[12..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    fn sign(tx: &mut SignedL2Transaction, key: &SecretKey) {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(tx.signing_hash().to_fixed_bytes());
        let (rec_id, sig) = secp.sign_ecdsa_recoverable(&message, key).serialize_compact();
        tx.r = U256::from_big_endian(&sig[0..32]);
        tx.s = U256::from_big_endian(&sig[32..64]);
        tx.v = rec_id.to_i32() as u64;
    }

    #[test]
    fn round_trips_through_rlp() {
        let key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let mut tx = SignedL2Transaction {
            nonce: 7,
            gas_price: U256::zero(),
            gas_limit: 21_000,
            to: TxKind::Call(Address::from_low_u64_be(0x42)),
            value: U256::from(1_000_000u64),
            data: vec![],
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
        };
        sign(&mut tx, &key);

        let encoded = tx.encode();
        let decoded = SignedL2Transaction::decode(&encoded).unwrap();
        assert_eq!(tx, decoded);
    }

    #[test]
    fn recovers_the_signer_address() {
        let key = SecretKey::from_slice(&[0x22; 32]).unwrap();
        let secp = Secp256k1::signing_only();
        let expected_pubkey = secp256k1::PublicKey::from_secret_key(&secp, &key);
        let uncompressed = expected_pubkey.serialize_uncompressed();
        let expected_addr =
            Address::from_slice(&keccak256(&uncompressed[1..]).as_bytes()[12..]);

        let mut tx = SignedL2Transaction {
            nonce: 0,
            gas_price: U256::zero(),
            gas_limit: 21_000,
            to: TxKind::Call(Address::from_low_u64_be(0x1)),
            value: U256::zero(),
            data: vec![1, 2, 3],
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
        };
        sign(&mut tx, &key);

        assert_eq!(tx.recover_sender().unwrap(), expected_addr);
    }
}
