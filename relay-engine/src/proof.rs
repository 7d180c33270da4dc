//! Pure cross-chain proof verification: no store access, so it stays
//! trivially unit-testable and fuzzable on its own.

use btc_types::H256;
use merkle_tools::verify_compact_proof;

use crate::error::{Error, Result};
use crate::payload::ToMerkleValue;

/// Verifies `merkle_proof` against `expected_root` and decodes its sole
/// leaf as a [`ToMerkleValue`]. A root mismatch yields `Error::ProofMismatch`;
/// irregular leaf or proof framing yields `Error::MalformedPayload`.
pub fn verify_cross_chain_proof(
    merkle_proof: &[u8],
    expected_root: &H256,
) -> Result<ToMerkleValue> {
    let leaf = verify_compact_proof(merkle_proof, expected_root)?;
    ToMerkleValue::decode(&leaf).map_err(|_| Error::MalformedPayload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::MakeTxParam;
    use merkle_tools::build_compact_proof_from_values;

    fn sample_value(from_chain_id: u64, tx_hash: Vec<u8>) -> ToMerkleValue {
        ToMerkleValue {
            tx_hash: tx_hash.clone(),
            from_chain_id,
            make_tx_param: MakeTxParam {
                tx_hash,
                cross_chain_id: vec![7],
                from_contract_address: vec![0x11; 20],
                to_chain_id: 9,
                to_contract_address: vec![0x22; 20],
                method: "unlock".to_string(),
                args: vec![],
            },
        }
    }

    fn root_of(values: &[Vec<u8>]) -> H256 {
        let (_, root) =
            merkle_tools::parse_compact_proof(&build_compact_proof_from_values(values, 0))
                .unwrap();
        root
    }

    #[test]
    fn s5_matching_root_yields_the_structured_value_with_literal_fields() {
        let value = sample_value(2, vec![0xAB; 32]);
        let values = vec![value.encode(), sample_value(3, vec![0xCD; 32]).encode()];
        let root = root_of(&values);
        let proof = build_compact_proof_from_values(&values, 0);

        let recovered = verify_cross_chain_proof(&proof, &root).unwrap();
        assert_eq!(recovered.from_chain_id, 2);
        assert_eq!(recovered.tx_hash, vec![0xAB; 32]);
    }

    #[test]
    fn s6_flipping_the_expected_root_is_a_proof_mismatch() {
        let value = sample_value(2, vec![0xAB; 32]);
        let values = vec![value.encode(), sample_value(3, vec![0xCD; 32]).encode()];
        let mut root = root_of(&values);
        let proof = build_compact_proof_from_values(&values, 0);
        root.0[0] ^= 0xFF;

        assert_eq!(
            verify_cross_chain_proof(&proof, &root),
            Err(Error::ProofMismatch)
        );
    }

    #[test]
    fn malformed_leaf_bytes_surface_as_malformed_payload() {
        // A proof whose leaf is not a valid ToMerkleValue encoding.
        let values = vec![b"not a ToMerkleValue".to_vec()];
        let proof = build_compact_proof_from_values(&values, 0);
        let root = root_of(&values);
        assert_eq!(
            verify_cross_chain_proof(&proof, &root),
            Err(Error::MalformedPayload)
        );
    }
}
