//! Thin inbound boundary a host wires its native-service registry to.
//!
//! Each entry point decodes a parameter record out of the invocation input
//! buffer, routes to the header-sync engine or the proof verifier, and
//! reports a single-byte success/failure indicator alongside a structured
//! [`Error`] on failure. The relayer-registry CRUD (`registerRelayer`,
//! `RemoveRelayer`) and its witness check are external collaborators per the
//! scope notes: this module only defines the seams (`Witness`,
//! `RelayerRegistry`) a host implements, the same way the engine leaves the
//! cache-db itself to a host-supplied [`Store`].

use btc_types::H256;
use codec::{Sink, Source};

use crate::engine::HeaderSyncEngine;
use crate::error::{Error, Result};
use crate::proof::verify_cross_chain_proof;
use crate::store::Store;

/// `BYTE_TRUE` / `BYTE_FALSE` style return value used by the original
/// native-contract dispatch convention: callers that only care about
/// success/failure can check this without inspecting the `Result`.
pub const BYTE_TRUE: u8 = 1;
pub const BYTE_FALSE: u8 = 0;

/// Checks that the current invocation is witnessed by `operator`. Left to
/// the host because witness/signature verification is ledger-specific.
pub trait Witness {
    fn check_witness(&self, operator: &[u8]) -> bool;
}

/// The relayer-manager registry CRUD this crate treats as an external
/// collaborator (§1). A host backs it with its own cache-db; the dispatcher
/// only needs to know the operator address to run the witness check against
/// and a place to route the two admin methods.
pub trait RelayerRegistry {
    fn operator_address(&self) -> &[u8];
    fn register_relayer(&mut self, address: &[u8]) -> Result<()>;
    fn remove_relayer(&mut self, address: &[u8]) -> Result<()>;
}

/// `chain_id:u64 ‖ var_bytes(genesis_header_raw)`.
pub struct SyncGenesisHeaderParam {
    pub chain_id: u64,
    pub genesis_header_raw: Vec<u8>,
}

impl SyncGenesisHeaderParam {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let chain_id = source.next_u64()?;
        let genesis_header_raw = source.next_var_bytes()?.to_vec();
        source.expect_exhausted()?;
        Ok(SyncGenesisHeaderParam {
            chain_id,
            genesis_header_raw,
        })
    }
}

/// `chain_id:u64 ‖ var_uint(n) ‖ [var_bytes(header_raw)]×n`.
pub struct SyncBlockHeaderParam {
    pub chain_id: u64,
    pub headers_raw: Vec<Vec<u8>>,
}

impl SyncBlockHeaderParam {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let chain_id = source.next_u64()?;
        let n = source.next_var_uint()?;
        let n = usize::try_from(n).map_err(|_| Error::MalformedInput)?;
        let mut headers_raw = Vec::with_capacity(n);
        for _ in 0..n {
            headers_raw.push(source.next_var_bytes()?.to_vec());
        }
        source.expect_exhausted()?;
        Ok(SyncBlockHeaderParam {
            chain_id,
            headers_raw,
        })
    }
}

/// `chain_id:u64 ‖ height:u32 ‖ var_bytes(merkle_proof) ‖ var_bytes(extra)`.
pub struct ImportCrossChainMsgParam {
    pub chain_id: u64,
    pub height: u32,
    pub merkle_proof: Vec<u8>,
    pub extra: Vec<u8>,
}

impl ImportCrossChainMsgParam {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let chain_id = source.next_u64()?;
        let height = source.next_u32()?;
        let merkle_proof = source.next_var_bytes()?.to_vec();
        let extra = source.next_var_bytes()?.to_vec();
        source.expect_exhausted()?;
        Ok(ImportCrossChainMsgParam {
            chain_id,
            height,
            merkle_proof,
            extra,
        })
    }
}

/// `{address}`, shared by `registerRelayer` and `RemoveRelayer`.
pub struct RelayerParam {
    pub address: Vec<u8>,
}

impl RelayerParam {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let address = source.next_var_bytes()?.to_vec();
        source.expect_exhausted()?;
        Ok(RelayerParam { address })
    }
}

/// Decodes a `SyncGenesisHeaderParam` from `input` and installs the genesis
/// header on `engine`. Permissionless: the header engine is
/// self-authenticating, so no witness check runs here.
pub fn sync_genesis_header(
    engine: &HeaderSyncEngine,
    store: &mut dyn Store,
    input: &[u8],
) -> (u8, Result<()>) {
    let result = (|| {
        let param = SyncGenesisHeaderParam::decode(input)?;
        engine.sync_genesis_header(store, &param.genesis_header_raw)
    })();
    respond(result)
}

/// Decodes a `SyncBlockHeaderParam` from `input` and commits each header in
/// order via the engine. Permissionless for the same reason as above.
pub fn sync_block_header(
    engine: &HeaderSyncEngine,
    store: &mut dyn Store,
    input: &[u8],
) -> (u8, Result<()>) {
    let result = (|| {
        let param = SyncBlockHeaderParam::decode(input)?;
        engine.sync_block_headers(store, &param.headers_raw)?;
        Ok(())
    })();
    respond(result)
}

/// Decodes an `ImportCrossChainMsgParam`, looks up the expected cross-states
/// root at `(chain_id, height)` from the engine's store, and feeds that root
/// plus the supplied proof into the pure verifier. Permissionless: validity
/// is self-contained in the Merkle proof and the header chain it descends
/// from.
pub fn import_cross_chain_msg(
    engine: &HeaderSyncEngine,
    store: &dyn Store,
    input: &[u8],
) -> (u8, Result<crate::payload::ToMerkleValue>) {
    let result = (|| {
        let param = ImportCrossChainMsgParam::decode(input)?;
        let expected_root = if param.extra.is_empty() {
            engine.get_cross_states_root(store, param.height)?
        } else {
            H256::try_from(param.extra.as_slice()).map_err(|_| Error::MalformedInput)?
        };
        verify_cross_chain_proof(&param.merkle_proof, &expected_root)
    })();
    let byte = if result.is_ok() { BYTE_TRUE } else { BYTE_FALSE };
    (byte, result)
}

/// `registerRelayer` — note the lowercase-first spelling is load-bearing for
/// wire compatibility (§6), unlike `RemoveRelayer` below.
pub fn register_relayer(
    registry: &mut dyn RelayerRegistry,
    witness: &dyn Witness,
    input: &[u8],
) -> (u8, Result<()>) {
    let result = (|| {
        if !witness.check_witness(registry.operator_address()) {
            return Err(Error::NotAuthorized);
        }
        let param = RelayerParam::decode(input)?;
        registry.register_relayer(&param.address)
    })();
    respond(result)
}

/// `RemoveRelayer` — capitalization preserved exactly per §6.
pub fn remove_relayer(
    registry: &mut dyn RelayerRegistry,
    witness: &dyn Witness,
    input: &[u8],
) -> (u8, Result<()>) {
    let result = (|| {
        if !witness.check_witness(registry.operator_address()) {
            return Err(Error::NotAuthorized);
        }
        let param = RelayerParam::decode(input)?;
        registry.remove_relayer(&param.address)
    })();
    respond(result)
}

fn respond(result: Result<()>) -> (u8, Result<()>) {
    let byte = if result.is_ok() { BYTE_TRUE } else { BYTE_FALSE };
    (byte, result)
}

/// Encodes `chain_id ‖ var_bytes(header_raw)` the way a host test harness or
/// relayer would build a `SyncGenesisHeaderParam` wire payload.
#[must_use]
pub fn encode_sync_genesis_header_param(chain_id: u64, header_raw: &[u8]) -> Vec<u8> {
    let mut sink = Sink::new();
    sink.push_u64(chain_id);
    sink.push_var_bytes(header_raw);
    sink.into_vec()
}
