use ethereum_types::H256;

/// Keccak-256 over arbitrary bytes. All hashes named in the spec (call keys,
/// registered-response keys, CREATE/CREATE2 addresses) reduce to this.
pub fn keccak256(data: impl AsRef<[u8]>) -> H256 {
    keccak_hash::keccak(data.as_ref())
}

/// Packed concatenation helper: `a ‖ b`, matching the spec's `‖` notation
/// (no ABI padding, just raw byte concatenation).
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for p in parts {
        out.extend_from_slice(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_matches_known_constant() {
        let h = keccak256([]);
        assert_eq!(
            hex::encode(h.as_bytes()),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn concat_is_plain_concatenation() {
        assert_eq!(concat(&[&[1, 2], &[3]]), vec![1, 2, 3]);
    }
}
