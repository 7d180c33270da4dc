//! Host-agnostic key-value store the engine runs against, plus the
//! deterministic key layout and "raw storage item" value envelope.

use std::collections::BTreeMap;

use codec::{Sink, Source};

use crate::error::{Error, Result};

/// `Get`/`Put`/`Delete` over byte-string keys. Production hosts adapt their
/// cache-db to this trait; all mutations are expected to land inside the
/// caller's own transactional batch and be visible to subsequent reads
/// within the same invocation.
pub trait Store {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &[u8], value: Vec<u8>);
    fn delete(&mut self, key: &[u8]);
}

/// `BTreeMap`-backed store used by tests and by hosts with no cache-db of
/// their own.
#[derive(Default)]
pub struct MemoryStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.map.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.map.remove(key);
    }
}

pub const TAG_GENESIS_HEADER: &[u8] = b"genesisHeader";
pub const TAG_BEST_HEADER: &[u8] = b"bestHeader";
pub const TAG_HEADER: &[u8] = b"header";
pub const TAG_HEIGHT_INDEX: &[u8] = b"heightIndex";
pub const TAG_CROSS_STATES_ROOT: &[u8] = b"crossStatesRoot";
pub const TAG_RELAYER: &[u8] = b"relayer";

fn concat_key(contract: &[u8], tag: &[u8], arg: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(contract.len() + tag.len() + arg.len());
    key.extend_from_slice(contract);
    key.extend_from_slice(tag);
    key.extend_from_slice(arg);
    key
}

#[must_use]
pub fn genesis_header_key(contract: &[u8], chain_id: u64) -> Vec<u8> {
    concat_key(contract, TAG_GENESIS_HEADER, &chain_id.to_be_bytes())
}

#[must_use]
pub fn best_header_key(contract: &[u8], chain_id: u64) -> Vec<u8> {
    concat_key(contract, TAG_BEST_HEADER, &chain_id.to_be_bytes())
}

#[must_use]
pub fn header_key(contract: &[u8], chain_id: u64, hash: &[u8; 32]) -> Vec<u8> {
    let mut arg = chain_id.to_be_bytes().to_vec();
    arg.extend_from_slice(hash);
    concat_key(contract, TAG_HEADER, &arg)
}

#[must_use]
pub fn height_index_key(contract: &[u8], chain_id: u64, height: u32) -> Vec<u8> {
    let mut arg = chain_id.to_be_bytes().to_vec();
    arg.extend_from_slice(&height.to_be_bytes());
    concat_key(contract, TAG_HEIGHT_INDEX, &arg)
}

#[must_use]
pub fn cross_states_root_key(contract: &[u8], chain_id: u64, height: u32) -> Vec<u8> {
    let mut arg = chain_id.to_be_bytes().to_vec();
    arg.extend_from_slice(&height.to_be_bytes());
    concat_key(contract, TAG_CROSS_STATES_ROOT, &arg)
}

#[must_use]
pub fn relayer_key(contract: &[u8], address: &[u8]) -> Vec<u8> {
    concat_key(contract, TAG_RELAYER, address)
}

const RAW_STORAGE_ITEM_TAG: u8 = 0x01;

/// Wraps a value in the "raw storage item" envelope so stored bytes can be
/// distinguished from future encodings sharing the same keyspace.
#[must_use]
pub fn gen_raw_storage_item(value: &[u8]) -> Vec<u8> {
    let mut sink = Sink::new();
    sink.push_u8(RAW_STORAGE_ITEM_TAG);
    sink.push_var_bytes(value);
    sink.into_vec()
}

/// Unwraps a "raw storage item" envelope, rejecting anything that isn't one.
pub fn get_value_from_raw_storage_item(raw: &[u8]) -> Result<Vec<u8>> {
    let mut source = Source::new(raw);
    let tag = source
        .next_u8()
        .map_err(|_| Error::StoreError("empty raw storage item".to_string()))?;
    if tag != RAW_STORAGE_ITEM_TAG {
        return Err(Error::StoreError(
            "unrecognized raw storage item tag".to_string(),
        ));
    }
    let bytes = source
        .next_var_bytes()
        .map_err(|_| Error::StoreError("malformed raw storage item".to_string()))?;
    source
        .expect_exhausted()
        .map_err(|_| Error::StoreError("trailing bytes in raw storage item".to_string()))?;
    Ok(bytes.to_vec())
}
