use std::fmt;

use thiserror::Error;

/// The reason a header failed `CheckHeader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidHeaderReason {
    Pow,
    Timestamp,
    Difficulty,
    Link,
}

impl fmt::Display for InvalidHeaderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvalidHeaderReason::Pow => "pow",
            InvalidHeaderReason::Timestamp => "timestamp",
            InvalidHeaderReason::Difficulty => "difficulty",
            InvalidHeaderReason::Link => "link",
        })
    }
}

/// Closed error taxonomy for the engine, verifier, and dispatcher. `Display`
/// is the dispatcher's diagnostic string verbatim — there is no separate
/// message table to keep in sync.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed input")]
    MalformedInput,
    #[error("malformed header")]
    MalformedHeader,
    #[error("invalid header: {0}")]
    InvalidHeader(InvalidHeaderReason),
    #[error("orphan header: unknown parent")]
    OrphanHeader,
    #[error("orphan chain: reorg walk hit a missing ancestor")]
    OrphanChain,
    #[error("chain already initialized")]
    AlreadyInitialized,
    #[error("chain not initialized")]
    NotInitialized,
    #[error("proof mismatch: computed root does not equal the expected root")]
    ProofMismatch,
    #[error("malformed payload: leaf does not decode as ToMerkleValue")]
    MalformedPayload,
    #[error("caller is not authorized for this operation")]
    NotAuthorized,
    #[error("store error: {0}")]
    StoreError(String),
    #[error("not found")]
    NotFound,
}

impl From<codec::DecodeError> for Error {
    fn from(_: codec::DecodeError) -> Self {
        Error::MalformedInput
    }
}

impl From<merkle_tools::ProofError> for Error {
    fn from(e: merkle_tools::ProofError) -> Self {
        match e {
            merkle_tools::ProofError::RootMismatch => Error::ProofMismatch,
            _ => Error::MalformedPayload,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
