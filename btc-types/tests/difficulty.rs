//! Property coverage for the PoW/difficulty evaluator (§4.4): target decode
//! rejects non-canonical `bits`, and work is a strictly decreasing function
//! of target (an easier, larger target yields strictly less work).

use btc_types::{Header, H256, U256};

fn header_with_bits(bits: u32) -> Header {
    Header {
        version: 1,
        prev_block_hash: H256([0u8; 32]),
        merkle_root: H256([0u8; 32]),
        time: 0,
        bits,
        nonce: 0,
    }
}

#[test]
fn a_larger_target_yields_strictly_less_work() {
    // 0x1d00ffff (mainnet minimum difficulty) decodes to a larger target
    // than 0x1c00ffff (one exponent step harder), so it must yield less work.
    let easy = header_with_bits(0x1d00_ffff).work().unwrap();
    let hard = header_with_bits(0x1c00_ffff).work().unwrap();
    assert!(easy < hard);
}

#[test]
fn work_is_nonzero_and_tracks_the_inverse_of_target() {
    let header = header_with_bits(0x1d00_ffff);
    let target = header.target().unwrap();
    let work = header.work().unwrap();

    assert!(!work.is_zero());
    assert_eq!(work, target.inverse());
}

#[test]
fn sign_bit_zero_mantissa_and_exponent_overflow_are_all_rejected() {
    assert!(header_with_bits(0x0180_0000).target().is_err());
    assert!(header_with_bits(0x0400_0000).target().is_err());
    assert!(header_with_bits(0xff12_3456).target().is_err());
}

#[test]
fn minimal_total_work_encoding_round_trips_through_be_bytes() {
    for value in [U256::ZERO, U256::ONE, U256::from(0xdead_beefu32), U256::MAX] {
        let minimal = value.to_be_bytes_minimal();
        assert_eq!(U256::from_be_bytes_minimal(&minimal).unwrap(), value);
    }
}
