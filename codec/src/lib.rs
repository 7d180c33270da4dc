//! Variable-length little-endian byte codec.
//!
//! Every on-wire and on-disk record in this workspace — headers, stored
//! header records, dispatcher parameters, cross-chain payloads, and compact
//! Merkle proofs — goes through this codec. There is no other source of
//! truth for how bytes map to values: if a format isn't expressible here, it
//! doesn't exist.
//!
//! Decoding reports two distinct failure modes rather than collapsing them
//! into one `Err`: [`DecodeError::Eof`] means the buffer ran out before a
//! value could be read, while [`DecodeError::Irregular`] means the buffer
//! decoded but violated canonical form (a non-minimal varint prefix, a
//! string that isn't valid UTF-8, trailing bytes after a record the caller
//! declared closed). Irregular data is rejected even when more bytes remain.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of buffer")]
    Eof,
    #[error("irregular framing: {0}")]
    Irregular(&'static str),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// A cursor over a borrowed byte slice. Every `next_*` method either advances
/// the cursor and returns the value, or leaves the cursor untouched and
/// returns an error.
pub struct Source<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Source { buf, pos: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Errors with [`DecodeError::Irregular`] if any bytes remain.
    pub fn expect_exhausted(&self) -> DecodeResult<()> {
        if self.remaining() != 0 {
            return Err(DecodeError::Irregular("trailing bytes after record"));
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::Eof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn next_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn next_u16(&mut self) -> DecodeResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn next_u32(&mut self) -> DecodeResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn next_i32(&mut self) -> DecodeResult<i32> {
        Ok(self.next_u32()? as i32)
    }

    pub fn next_u64(&mut self) -> DecodeResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn next_hash32(&mut self) -> DecodeResult<[u8; 32]> {
        let b = self.take(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Reads a fixed-size run of raw bytes with no length prefix (used for
    /// embedding an already self-delimiting record, like an 80-byte wire
    /// header, inside a larger one).
    pub fn next_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        self.take(n)
    }

    /// Bitcoin-style variable-length unsigned integer: a 1/3/5/9-byte prefix
    /// chosen by magnitude. Rejects non-minimal prefixes (e.g. encoding `5`
    /// with the `0xfd` + u16 form) as irregular.
    pub fn next_var_uint(&mut self) -> DecodeResult<u64> {
        let prefix = self.next_u8()?;
        match prefix {
            0..=0xfc => Ok(u64::from(prefix)),
            0xfd => {
                let v = u64::from(self.next_u16()?);
                if v <= 0xfc {
                    return Err(DecodeError::Irregular("non-minimal varint (u16 form)"));
                }
                Ok(v)
            }
            0xfe => {
                let v = u64::from(self.next_u32()?);
                if v <= u64::from(u16::MAX) {
                    return Err(DecodeError::Irregular("non-minimal varint (u32 form)"));
                }
                Ok(v)
            }
            0xff => {
                let v = self.next_u64()?;
                if v <= u64::from(u32::MAX) {
                    return Err(DecodeError::Irregular("non-minimal varint (u64 form)"));
                }
                Ok(v)
            }
        }
    }

    /// `var_uint(len) ‖ bytes`.
    pub fn next_var_bytes(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.next_var_uint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Irregular("length overflow"))?;
        self.take(len)
    }

    /// `var_bytes` interpreted as UTF-8.
    pub fn next_var_string(&mut self) -> DecodeResult<&'a str> {
        let bytes = self.next_var_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::Irregular("not valid utf-8"))
    }

    /// `var_bytes` of a known fixed length (used for addresses).
    pub fn next_address(&mut self, expected_len: usize) -> DecodeResult<&'a [u8]> {
        let bytes = self.next_var_bytes()?;
        if bytes.len() != expected_len {
            return Err(DecodeError::Irregular("address length mismatch"));
        }
        Ok(bytes)
    }
}

/// Write-side counterpart to [`Source`]. Encoding is always canonical: there
/// is exactly one way to write any value, which is what makes the
/// round-trip property (`decode(encode(x)) == x` and re-encoding yields the
/// original bytes) hold without a separate canonicalization pass.
#[derive(Default)]
pub struct Sink {
    buf: Vec<u8>,
}

impl Sink {
    #[must_use]
    pub fn new() -> Self {
        Sink::default()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn push_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn push_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_i32(&mut self, v: i32) {
        self.push_u32(v as u32);
    }

    pub fn push_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_hash32(&mut self, v: &[u8; 32]) {
        self.buf.extend_from_slice(v);
    }

    /// Writes a fixed-size run of raw bytes with no length prefix.
    pub fn push_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn push_var_uint(&mut self, v: u64) {
        if v <= 0xfc {
            self.push_u8(v as u8);
        } else if v <= u64::from(u16::MAX) {
            self.push_u8(0xfd);
            self.push_u16(v as u16);
        } else if v <= u64::from(u32::MAX) {
            self.push_u8(0xfe);
            self.push_u32(v as u32);
        } else {
            self.push_u8(0xff);
            self.push_u64(v);
        }
    }

    pub fn push_var_bytes(&mut self, v: &[u8]) {
        self.push_var_uint(v.len() as u64);
        self.buf.extend_from_slice(v);
    }

    pub fn push_var_string(&mut self, v: &str) {
        self.push_var_bytes(v.as_bytes());
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trips_all_size_classes() {
        for v in [0u64, 1, 252, 253, 0xfc, 0xfd, 0xffff, 0x1_0000, u64::from(u32::MAX), u64::from(u32::MAX) + 1, u64::MAX] {
            let mut sink = Sink::new();
            sink.push_var_uint(v);
            let bytes = sink.into_vec();
            let mut source = Source::new(&bytes);
            assert_eq!(source.next_var_uint().unwrap(), v);
            source.expect_exhausted().unwrap();
        }
    }

    #[test]
    fn varint_rejects_non_minimal_prefix() {
        // 5 encoded with the 0xfd (u16) form instead of a single byte.
        let bytes = [0xfd, 0x05, 0x00];
        let mut source = Source::new(&bytes);
        assert_eq!(
            source.next_var_uint(),
            Err(DecodeError::Irregular("non-minimal varint (u16 form)"))
        );
    }

    #[test]
    fn var_bytes_reports_eof_not_irregular_when_short() {
        let bytes = [0x05, 0x01, 0x02];
        let mut source = Source::new(&bytes);
        assert_eq!(source.next_var_bytes(), Err(DecodeError::Eof));
    }

    #[test]
    fn var_string_round_trip() {
        let mut sink = Sink::new();
        sink.push_var_string("hello cross-chain");
        let bytes = sink.into_vec();
        let mut source = Source::new(&bytes);
        assert_eq!(source.next_var_string().unwrap(), "hello cross-chain");
    }

    #[test]
    fn fixed_bytes_round_trip_without_length_prefix() {
        let mut sink = Sink::new();
        sink.push_bytes(&[9u8; 80]);
        let bytes = sink.into_vec();
        assert_eq!(bytes.len(), 80);
        let mut source = Source::new(&bytes);
        assert_eq!(source.next_bytes(80).unwrap(), &[9u8; 80][..]);
        source.expect_exhausted().unwrap();
    }

    #[test]
    fn trailing_bytes_are_irregular() {
        let bytes = [0x01, 0x02, 0x03];
        let mut source = Source::new(&bytes);
        source.next_u8().unwrap();
        assert_eq!(
            source.expect_exhausted(),
            Err(DecodeError::Irregular("trailing bytes after record"))
        );
    }
}
