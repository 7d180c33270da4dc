//! Compact Merkle proofs: a self-describing stream of tagged nodes rather
//! than a bare sibling-hash list. A proof is a leading varint (the body
//! length) followed by records `{tag:u8, payload}`:
//!
//! - `Left`  (0x00) — 32-byte hash, sibling to the left of the running node.
//! - `Right` (0x01) — 32-byte hash, sibling to the right of the running node.
//! - `Leaf`  (0x02) — `var_bytes`, the raw leaf value; exactly one per proof.
//! - `End`   (0x03) — terminator, no payload.
//!
//! The leaf record's payload is the raw value being proved (arbitrary
//! length — a `ToMerkleValue` encoding, not a fixed-size hash). It seeds the
//! running accumulator as `double_sha256(value)`, and each sibling record
//! folds the accumulator one level up via `double_sha256(left ‖ right)`
//! until the stream ends.

pub use btc_types::hash::{double_sha256, H256};
use codec::{DecodeError, Sink, Source};
use thiserror::Error;

const TAG_LEFT: u8 = 0x00;
const TAG_RIGHT: u8 = 0x01;
const TAG_LEAF: u8 = 0x02;
const TAG_END: u8 = 0x03;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(#[from] DecodeError),
    #[error("proof contains no leaf record")]
    MissingLeaf,
    #[error("proof contains more than one leaf record")]
    MultipleLeaves,
    #[error("unrecognized proof tag {0:#x}")]
    UnknownTag(u8),
    #[error("computed root does not match expected root")]
    RootMismatch,
}

/// Which side of the running node a sibling hash sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Parses a compact proof without checking it against any particular root.
/// Returns the captured leaf value and the root the stream folds to.
pub fn parse_compact_proof(proof: &[u8]) -> Result<(Vec<u8>, H256), ProofError> {
    let mut source = Source::new(proof);
    let body_len = source.next_var_uint()?;
    let body_len =
        usize::try_from(body_len).map_err(|_| DecodeError::Irregular("length overflow"))?;
    if body_len != source.remaining() {
        return Err(DecodeError::Irregular("declared length does not match body").into());
    }

    let mut leaf: Option<Vec<u8>> = None;
    let mut running: Option<H256> = None;

    loop {
        match source.next_u8()? {
            TAG_LEFT => {
                let sibling = H256(source.next_hash32()?);
                let acc = running.ok_or(DecodeError::Irregular("sibling record before leaf"))?;
                running = Some(fold(&sibling, &acc));
            }
            TAG_RIGHT => {
                let sibling = H256(source.next_hash32()?);
                let acc = running.ok_or(DecodeError::Irregular("sibling record before leaf"))?;
                running = Some(fold(&acc, &sibling));
            }
            TAG_LEAF => {
                if leaf.is_some() {
                    return Err(ProofError::MultipleLeaves);
                }
                let bytes = source.next_var_bytes()?;
                leaf = Some(bytes.to_vec());
                running = Some(double_sha256(bytes));
            }
            TAG_END => break,
            other => return Err(ProofError::UnknownTag(other)),
        }
    }

    source.expect_exhausted()?;

    let leaf = leaf.ok_or(ProofError::MissingLeaf)?;
    let root = running.ok_or(ProofError::MissingLeaf)?;
    Ok((leaf, root))
}

/// Parses a compact proof and requires it to fold to `expected_root`.
/// Returns the leaf value on success.
pub fn verify_compact_proof(proof: &[u8], expected_root: &H256) -> Result<Vec<u8>, ProofError> {
    let (leaf, computed_root) = parse_compact_proof(proof)?;
    if &computed_root != expected_root {
        return Err(ProofError::RootMismatch);
    }
    Ok(leaf)
}

/// Encodes a compact proof from a raw leaf value and its sibling path,
/// root-ward (the first entry is the leaf's immediate sibling).
#[must_use]
pub fn encode_compact_proof(leaf_value: &[u8], siblings: &[(H256, Side)]) -> Vec<u8> {
    let mut body = Sink::new();
    body.push_u8(TAG_LEAF);
    body.push_var_bytes(leaf_value);
    for (hash, side) in siblings {
        body.push_u8(match side {
            Side::Left => TAG_LEFT,
            Side::Right => TAG_RIGHT,
        });
        body.push_hash32(&hash.0);
    }
    body.push_u8(TAG_END);
    let body_bytes = body.into_vec();

    let mut sink = Sink::new();
    sink.push_var_uint(body_bytes.len() as u64);
    let mut out = sink.into_vec();
    out.extend(body_bytes);
    out
}

/// Builds a full tree over `leaf_values` (hashing each with
/// `double_sha256` to seed its leaf node, duplicating the last node at
/// odd-sized levels per Bitcoin's convention) and returns a compact proof
/// for the leaf at `leaf_position`.
#[must_use]
pub fn build_compact_proof_from_values(leaf_values: &[Vec<u8>], leaf_position: usize) -> Vec<u8> {
    let mut level: Vec<H256> = leaf_values.iter().map(|v| double_sha256(v)).collect();
    let mut position = leaf_position;
    let mut siblings = Vec::new();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }

        if position % 2 == 1 {
            siblings.push((level[position - 1], Side::Left));
        } else {
            siblings.push((level[position + 1], Side::Right));
        }

        let mut next_level = Vec::with_capacity(level.len() / 2);
        for i in (0..level.len() - 1).step_by(2) {
            next_level.push(fold(&level[i], &level[i + 1]));
        }
        level = next_level;
        position /= 2;
    }

    encode_compact_proof(&leaf_values[leaf_position], &siblings)
}

fn fold(left: &H256, right: &H256) -> H256 {
    let mut concat = Vec::with_capacity(64);
    concat.extend_from_slice(&left.0);
    concat.extend_from_slice(&right.0);
    double_sha256(&concat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values() -> Vec<Vec<u8>> {
        vec![
            b"alpha value".to_vec(),
            b"bravo value".to_vec(),
            b"charlie value".to_vec(),
            b"delta value".to_vec(),
            b"echo value".to_vec(),
            b"foxtrot value".to_vec(),
            b"golf value".to_vec(),
            b"hotel value".to_vec(),
        ]
    }

    fn root_of(values: &[Vec<u8>]) -> H256 {
        let mut level: Vec<H256> = values.iter().map(|v| double_sha256(v)).collect();
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                level.push(*level.last().unwrap());
            }
            let mut next = Vec::with_capacity(level.len() / 2);
            for i in (0..level.len() - 1).step_by(2) {
                next.push(fold(&level[i], &level[i + 1]));
            }
            level = next;
        }
        level[0]
    }

    #[test]
    fn compact_proof_verifies_against_its_root() {
        let values = sample_values();
        let root = root_of(&values);
        let proof = build_compact_proof_from_values(&values, 0);
        let leaf = verify_compact_proof(&proof, &root).unwrap();
        assert_eq!(leaf, values[0]);
    }

    #[test]
    fn compact_proof_verifies_for_odd_leaf_count() {
        let values = sample_values()[..5].to_vec();
        let root = root_of(&values);
        let proof = build_compact_proof_from_values(&values, 4);
        let leaf = verify_compact_proof(&proof, &root).unwrap();
        assert_eq!(leaf, values[4]);
    }

    #[test]
    fn flipping_a_root_bit_rejects_the_proof() {
        let values = sample_values();
        let mut root = root_of(&values);
        let proof = build_compact_proof_from_values(&values, 0);
        root.0[0] ^= 0x01;
        assert_eq!(
            verify_compact_proof(&proof, &root),
            Err(ProofError::RootMismatch)
        );
    }

    #[test]
    fn flipping_a_proof_byte_rejects_the_proof() {
        let values = sample_values();
        let root = root_of(&values);
        let mut proof = build_compact_proof_from_values(&values, 0);
        let last = proof.len() - 2;
        proof[last] ^= 0x01;
        assert_eq!(
            verify_compact_proof(&proof, &root),
            Err(ProofError::RootMismatch)
        );
    }

    #[test]
    fn second_leaf_record_is_rejected() {
        let mut body = Sink::new();
        body.push_u8(TAG_LEAF);
        body.push_var_bytes(b"one");
        body.push_u8(TAG_LEAF);
        body.push_var_bytes(b"two");
        body.push_u8(TAG_END);
        let body_bytes = body.into_vec();
        let mut sink = Sink::new();
        sink.push_var_uint(body_bytes.len() as u64);
        let mut proof = sink.into_vec();
        proof.extend(body_bytes);

        assert_eq!(
            parse_compact_proof(&proof),
            Err(ProofError::MultipleLeaves)
        );
    }

    #[test]
    fn missing_leaf_record_is_rejected() {
        let mut body = Sink::new();
        body.push_u8(TAG_END);
        let body_bytes = body.into_vec();
        let mut sink = Sink::new();
        sink.push_var_uint(body_bytes.len() as u64);
        let mut proof = sink.into_vec();
        proof.extend(body_bytes);

        assert_eq!(parse_compact_proof(&proof), Err(ProofError::MissingLeaf));
    }

    #[test]
    fn trailing_bytes_after_end_are_rejected() {
        let mut proof = encode_compact_proof(b"solo leaf", &[]);
        proof.push(0xAA);
        // The leading varint no longer matches the actual remaining body,
        // so this is caught as a length mismatch before the stream is walked.
        assert!(parse_compact_proof(&proof).is_err());
    }
}
