use serde::de::{self, Visitor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A raw 32-byte digest. Hex (de)serialization is for test fixtures and
/// diagnostics only; the wire format always moves the bytes directly through
/// `codec::Source::next_hash32` / `Sink::push_hash32`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct H256(pub [u8; 32]);

impl H256 {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }
}

impl TryFrom<&[u8]> for H256 {
    type Error = &'static str;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(H256(value.try_into().map_err(|_| "invalid hash length")?))
    }
}

impl TryFrom<Vec<u8>> for H256 {
    type Error = &'static str;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(H256(value.try_into().map_err(|_| "invalid hash length")?))
    }
}

impl FromStr for H256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        bytes
            .try_into()
            .map(H256)
            .map_err(|_| hex::FromHexError::InvalidStringLength)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HexVisitor;

        impl<'de> Visitor<'de> for HexVisitor {
            type Value = H256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 32-byte hex string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

impl Serialize for H256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Bitcoin's `hash(header) = SHA256(SHA256(wire_bytes))`.
#[must_use]
pub fn double_sha256(input: &[u8]) -> H256 {
    H256(Sha256::digest(Sha256::digest(input)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let hash = H256([7u8; 32]);
        let s = hash.to_string();
        let parsed: H256 = s.parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn double_sha256_is_sha256_of_sha256() {
        let input = b"satoshi";
        let once = Sha256::digest(input);
        let twice = Sha256::digest(once);
        assert_eq!(double_sha256(input).0, <[u8; 32]>::from(twice));
    }
}
