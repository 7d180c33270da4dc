use serde::{Deserialize, Serialize};

use crate::{
    hash::{double_sha256, H256},
    u256::U256,
};

pub type Target = U256;
pub type Work = U256;

/// Bitcoin's 80-byte block header, independent of any network's consensus
/// parameters (those live in the header-sync engine that evaluates headers
/// against a chain).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Block version, now repurposed for soft fork signalling.
    pub version: i32,
    /// Reference to the previous block in the chain.
    pub prev_block_hash: H256,
    /// The root hash of the merkle tree of transactions in the block.
    pub merkle_root: H256,
    /// The timestamp of the block, as claimed by the miner.
    pub time: u32,
    /// The compact-form target value below which the blockhash must lie.
    pub bits: u32,
    /// The nonce, selected to obtain a low enough blockhash.
    pub nonce: u32,
}

impl Header {
    /// The number of bytes that the block header contributes to the size of a block.
    pub const SIZE: usize = 4 + 32 + 32 + 4 + 4 + 4; // 80

    /// Decodes the compact ("nBits") target encoding into a 256-bit target.
    ///
    /// This is a floating-point encoding originally used by OpenSSL that
    /// Bitcoin consensus inherited: the top byte is an exponent and the
    /// bottom three are a signed mantissa. Rejects the value if the mantissa
    /// carries the sign bit, or if the exponent shifts the mantissa past 256
    /// bits — both are non-canonical `bits` fields a real Bitcoin header
    /// never contains.
    pub fn target(&self) -> Result<Target, &'static str> {
        let unshifted_expt = self.bits >> 24;
        let (mant, expt) = if unshifted_expt <= 3 {
            ((self.bits & 0x00FF_FFFF) >> (8 * (3 - unshifted_expt)), 0)
        } else {
            (self.bits & 0x00FF_FFFF, 8 * (unshifted_expt - 3))
        };

        if mant & 0x0080_0000 != 0 {
            return Err("compact target has the sign bit set");
        }
        if mant == 0 {
            return Err("compact target is zero");
        }
        if expt > 256 - 24 {
            return Err("compact target overflows 256 bits");
        }

        Ok(U256::from(mant) << expt)
    }

    /// The work represented by this header's target: `floor(2**256 / (target + 1))`.
    pub fn work(&self) -> Result<Work, &'static str> {
        Ok(self.target()?.inverse())
    }

    #[must_use]
    pub fn block_hash(&self) -> H256 {
        double_sha256(&self.to_bytes())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&self.prev_block_hash.0);
        out[36..68].copy_from_slice(&self.merkle_root.0);
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut prev_block_hash = [0u8; 32];
        prev_block_hash.copy_from_slice(&bytes[4..36]);
        let mut merkle_root = [0u8; 32];
        merkle_root.copy_from_slice(&bytes[36..68]);
        Header {
            version: i32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            prev_block_hash: H256(prev_block_hash),
            merkle_root: H256(merkle_root),
            time: u32::from_le_bytes(bytes[68..72].try_into().unwrap()),
            bits: u32::from_le_bytes(bytes[72..76].try_into().unwrap()),
            nonce: u32::from_le_bytes(bytes[76..80].try_into().unwrap()),
        }
    }
}
