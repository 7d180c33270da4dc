use btc_types::{Header, H256, U256};
use codec::{DecodeError, Sink, Source};

/// A header plus the chain-local bookkeeping attached during sync: its
/// height and the cumulative work of the chain it sits atop. Owned by the
/// by-hash map; the best pointer and height index store only the 32-byte
/// hash and look the full record up from there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredHeader {
    pub header: Header,
    pub height: u32,
    pub total_work: U256,
}

impl StoredHeader {
    #[must_use]
    pub fn hash(&self) -> H256 {
        self.header.block_hash()
    }

    /// `wire_header(80 bytes) ‖ u32(height) ‖ var_bytes(total_work_be_minimal)`.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut sink = Sink::new();
        sink.push_bytes(&self.header.to_bytes());
        sink.push_u32(self.height);
        sink.push_var_bytes(&self.total_work.to_be_bytes_minimal());
        sink.into_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut source = Source::new(bytes);
        let wire: [u8; Header::SIZE] = source
            .next_bytes(Header::SIZE)?
            .try_into()
            .expect("length checked by next_bytes");
        let header = Header::from_bytes(&wire);
        let height = source.next_u32()?;
        let total_work_bytes = source.next_var_bytes()?;
        let total_work = U256::from_be_bytes_minimal(total_work_bytes)
            .map_err(DecodeError::Irregular)?;
        source.expect_exhausted()?;
        Ok(StoredHeader {
            header,
            height,
            total_work,
        })
    }
}
