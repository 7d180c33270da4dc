use btc_types::{Header, H256, U256};

use crate::error::{Error, InvalidHeaderReason, Result};
use crate::header::StoredHeader;
use crate::network::NetworkParams;
use crate::store::{
    best_header_key, cross_states_root_key, genesis_header_key, get_value_from_raw_storage_item,
    gen_raw_storage_item, header_key, height_index_key, Store,
};

/// Depth of the median-time-past window used to reject time-warped headers.
const MEDIAN_TIME_PAST_DEPTH: u32 = 11;

/// Outcome of committing a single header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub new_tip: bool,
    pub height: u32,
}

/// Tracks one foreign chain's best-known header chain inside a host's
/// cache-db, per the keyspace laid out in `store`. One engine instance is
/// scoped to a single `(contract_address, chain_id)` pair; a host tracking
/// several foreign networks constructs one engine per network.
pub struct HeaderSyncEngine {
    contract_address: Vec<u8>,
    chain_id: u64,
    params: NetworkParams,
}

impl HeaderSyncEngine {
    #[must_use]
    pub fn new(contract_address: Vec<u8>, chain_id: u64, params: NetworkParams) -> Self {
        HeaderSyncEngine {
            contract_address,
            chain_id,
            params,
        }
    }

    /// Installs the genesis header for this chain. Fails `AlreadyInitialized`
    /// if one is already present.
    pub fn sync_genesis_header(&self, store: &mut dyn Store, raw_header: &[u8]) -> Result<()> {
        if store
            .get(&genesis_header_key(&self.contract_address, self.chain_id))?
            .is_some()
        {
            return Err(Error::AlreadyInitialized);
        }
        let wire: [u8; Header::SIZE] = raw_header
            .try_into()
            .map_err(|_| Error::MalformedHeader)?;
        let header = Header::from_bytes(&wire);
        let stored = StoredHeader {
            header,
            height: 0,
            total_work: U256::ZERO,
        };
        let encoded = gen_raw_storage_item(&stored.encode());
        let hash = stored.hash();

        store.put(
            &genesis_header_key(&self.contract_address, self.chain_id),
            encoded.clone(),
        );
        store.put(
            &best_header_key(&self.contract_address, self.chain_id),
            encoded.clone(),
        );
        store.put(
            &header_key(&self.contract_address, self.chain_id, hash.as_bytes()),
            encoded,
        );
        store.put(
            &height_index_key(&self.contract_address, self.chain_id, 0),
            gen_raw_storage_item(&hash.0),
        );
        Ok(())
    }

    /// Commits each header in `raw_headers` in order via [`Self::commit_header`].
    /// Any per-header failure fails the whole call; the engine does not undo
    /// headers it already wrote in this call — that is the host transaction's
    /// job.
    pub fn sync_block_headers(
        &self,
        store: &mut dyn Store,
        raw_headers: &[Vec<u8>],
    ) -> Result<Vec<CommitOutcome>> {
        let mut outcomes = Vec::with_capacity(raw_headers.len());
        for raw_header in raw_headers {
            let wire: [u8; Header::SIZE] = raw_header
                .as_slice()
                .try_into()
                .map_err(|_| Error::MalformedHeader)?;
            let header = Header::from_bytes(&wire);
            outcomes.push(self.commit_header(store, header)?);
        }
        Ok(outcomes)
    }

    /// Validates and commits a single header against the chain's current
    /// tip, updating the best pointer and height index if it extends or
    /// replaces the best chain.
    pub fn commit_header(&self, store: &mut dyn Store, header: Header) -> Result<CommitOutcome> {
        let best = self.load_best_header(store)?;
        let new_hash = header.block_hash();

        if new_hash == best.hash() {
            return Ok(CommitOutcome {
                new_tip: false,
                height: best.height,
            });
        }

        let parent = if header.prev_block_hash == best.hash() {
            best.clone()
        } else {
            self.try_load_header(store, &header.prev_block_hash)?
                .ok_or(Error::OrphanHeader)?
        };

        self.check_header(store, &header, &parent)?;

        let work = header
            .work()
            .map_err(|_| Error::InvalidHeader(InvalidHeaderReason::Pow))?;
        let total_work = parent.total_work.overflowing_add(work).0;
        let stored = StoredHeader {
            header,
            height: parent.height + 1,
            total_work,
        };

        store.put(
            &header_key(&self.contract_address, self.chain_id, new_hash.as_bytes()),
            gen_raw_storage_item(&stored.encode()),
        );

        let becomes_tip = stored.total_work > best.total_work;
        if becomes_tip {
            store.put(
                &best_header_key(&self.contract_address, self.chain_id),
                gen_raw_storage_item(&stored.encode()),
            );

            if stored.header.prev_block_hash == best.hash() {
                store.put(
                    &height_index_key(&self.contract_address, self.chain_id, stored.height),
                    gen_raw_storage_item(&new_hash.0),
                );
            } else {
                self.reorg(store, &stored, &best)?;
            }
        }

        Ok(CommitOutcome {
            new_tip: becomes_tip,
            height: stored.height,
        })
    }

    fn reorg(&self, store: &mut dyn Store, new_tip: &StoredHeader, old_tip: &StoredHeader) -> Result<()> {
        let common = self.common_ancestor(store, new_tip, old_tip)?;
        log::warn!(
            "reorg on chain {}: old_tip_height={} new_tip_height={} common_height={}",
            self.chain_id,
            old_tip.height,
            new_tip.height,
            common.height
        );

        let mut cursor = new_tip.clone();
        loop {
            store.put(
                &height_index_key(&self.contract_address, self.chain_id, cursor.height),
                gen_raw_storage_item(&cursor.hash().0),
            );
            if cursor.height == common.height {
                break;
            }
            cursor = self.load_header_required(store, &cursor.header.prev_block_hash)?;
        }

        if old_tip.height > new_tip.height {
            for height in (new_tip.height + 1)..=old_tip.height {
                store.delete(&height_index_key(&self.contract_address, self.chain_id, height));
            }
        }

        Ok(())
    }

    fn common_ancestor(
        &self,
        store: &dyn Store,
        a: &StoredHeader,
        b: &StoredHeader,
    ) -> Result<StoredHeader> {
        let mut x = a.clone();
        let mut y = b.clone();
        let max_steps = u64::from(std::cmp::max(a.height, b.height)) + 1;
        let mut steps = 0u64;

        while x.height > y.height {
            x = self.load_header_required(store, &x.header.prev_block_hash)?;
            steps += 1;
            if steps > max_steps {
                return Err(Error::OrphanChain);
            }
        }
        while y.height > x.height {
            y = self.load_header_required(store, &y.header.prev_block_hash)?;
            steps += 1;
            if steps > max_steps {
                return Err(Error::OrphanChain);
            }
        }
        while x.hash() != y.hash() {
            if x.height == 0 {
                return Err(Error::OrphanChain);
            }
            x = self.load_header_required(store, &x.header.prev_block_hash)?;
            y = self.load_header_required(store, &y.header.prev_block_hash)?;
            steps += 1;
            if steps > max_steps {
                return Err(Error::OrphanChain);
            }
        }
        Ok(x)
    }

    fn check_header(&self, store: &dyn Store, header: &Header, parent: &StoredHeader) -> Result<()> {
        if header.prev_block_hash != parent.hash() {
            return Err(Error::InvalidHeader(InvalidHeaderReason::Link));
        }

        let target = header
            .target()
            .map_err(|_| Error::InvalidHeader(InvalidHeaderReason::Pow))?;
        if !hash_meets_target(&header.block_hash(), &target) {
            return Err(Error::InvalidHeader(InvalidHeaderReason::Pow));
        }

        let mtp = self.median_time_past(store, parent)?;
        if header.time <= mtp {
            return Err(Error::InvalidHeader(InvalidHeaderReason::Timestamp));
        }

        self.check_difficulty(store, header, parent)?;

        Ok(())
    }

    fn check_difficulty(&self, store: &dyn Store, header: &Header, parent: &StoredHeader) -> Result<()> {
        let new_height = parent.height + 1;

        if new_height % self.params.retarget_interval == 0 {
            let expected = self.retarget_bits(store, parent)?;
            if header.bits != expected {
                return Err(Error::InvalidHeader(InvalidHeaderReason::Difficulty));
            }
            return Ok(());
        }

        if !self.params.allow_min_difficulty_blocks {
            if header.bits != parent.header.bits {
                return Err(Error::InvalidHeader(InvalidHeaderReason::Difficulty));
            }
            return Ok(());
        }

        let pow_limit_bits = self.params.pow_limit.target_to_bits();
        let gap = u64::from(header.time.saturating_sub(parent.header.time));
        if gap > 2 * u64::from(self.params.target_spacing_secs) {
            if header.bits != pow_limit_bits {
                return Err(Error::InvalidHeader(InvalidHeaderReason::Difficulty));
            }
        } else {
            let expected = self.last_non_minimum_difficulty_bits(store, parent, pow_limit_bits)?;
            if header.bits != expected {
                return Err(Error::InvalidHeader(InvalidHeaderReason::Difficulty));
            }
        }

        Ok(())
    }

    fn retarget_bits(&self, store: &dyn Store, parent: &StoredHeader) -> Result<u32> {
        let steps_back = self.params.retarget_interval - 1;
        let first = self.ancestor_at_depth(store, parent, steps_back)?;

        let actual_timespan = parent
            .header
            .time
            .saturating_sub(first.header.time);
        let clamped = u64::from(actual_timespan).clamp(self.params.min_timespan(), self.params.max_timespan());

        let old_target = parent
            .header
            .target()
            .map_err(|_| Error::InvalidHeader(InvalidHeaderReason::Difficulty))?;
        let (scaled, overflow) = old_target.overflowing_mul(clamped);
        let new_target = scaled / U256::from(self.params.target_timespan_secs);

        let clamped_target = if overflow || new_target > self.params.pow_limit {
            self.params.pow_limit
        } else {
            new_target
        };

        Ok(clamped_target.target_to_bits())
    }

    fn last_non_minimum_difficulty_bits(
        &self,
        store: &dyn Store,
        parent: &StoredHeader,
        pow_limit_bits: u32,
    ) -> Result<u32> {
        let mut current = parent.clone();
        while current.height % self.params.retarget_interval != 0 && current.header.bits == pow_limit_bits {
            current = self.load_header_required(store, &current.header.prev_block_hash)?;
        }
        Ok(current.header.bits)
    }

    fn ancestor_at_depth(&self, store: &dyn Store, start: &StoredHeader, depth: u32) -> Result<StoredHeader> {
        let mut current = start.clone();
        for _ in 0..depth {
            if current.height == 0 {
                break;
            }
            current = self.load_header_required(store, &current.header.prev_block_hash)?;
        }
        Ok(current)
    }

    fn median_time_past(&self, store: &dyn Store, parent: &StoredHeader) -> Result<u32> {
        let mut times = Vec::with_capacity(MEDIAN_TIME_PAST_DEPTH as usize);
        let mut current = parent.clone();
        loop {
            times.push(current.header.time);
            if current.height == 0 || times.len() as u32 == MEDIAN_TIME_PAST_DEPTH {
                break;
            }
            current = self.load_header_required(store, &current.header.prev_block_hash)?;
        }
        times.sort_unstable();
        Ok(times[times.len() / 2])
    }

    fn load_best_header(&self, store: &dyn Store) -> Result<StoredHeader> {
        let raw = store
            .get(&best_header_key(&self.contract_address, self.chain_id))?
            .ok_or(Error::NotInitialized)?;
        let bytes = get_value_from_raw_storage_item(&raw)?;
        StoredHeader::decode(&bytes).map_err(|_| Error::StoreError("corrupt best header".to_string()))
    }

    fn try_load_header(&self, store: &dyn Store, hash: &H256) -> Result<Option<StoredHeader>> {
        let Some(raw) = store.get(&header_key(&self.contract_address, self.chain_id, hash.as_bytes()))? else {
            return Ok(None);
        };
        let bytes = get_value_from_raw_storage_item(&raw)?;
        let stored = StoredHeader::decode(&bytes)
            .map_err(|_| Error::StoreError("corrupt stored header".to_string()))?;
        Ok(Some(stored))
    }

    fn load_header_required(&self, store: &dyn Store, hash: &H256) -> Result<StoredHeader> {
        self.try_load_header(store, hash)?.ok_or(Error::OrphanChain)
    }

    pub fn get_header_by_hash(&self, store: &dyn Store, hash: &H256) -> Result<StoredHeader> {
        self.try_load_header(store, hash)?.ok_or(Error::NotFound)
    }

    pub fn get_header_by_height(&self, store: &dyn Store, height: u32) -> Result<StoredHeader> {
        let raw = store
            .get(&height_index_key(&self.contract_address, self.chain_id, height))?
            .ok_or(Error::NotFound)?;
        let hash_bytes = get_value_from_raw_storage_item(&raw)?;
        let hash = H256::try_from(hash_bytes.as_slice()).map_err(|_| Error::NotFound)?;
        self.get_header_by_hash(store, &hash)
    }

    pub fn get_best_header(&self, store: &dyn Store) -> Result<StoredHeader> {
        self.load_best_header(store)
    }

    pub fn get_cross_states_root(&self, store: &dyn Store, height: u32) -> Result<H256> {
        let raw = store
            .get(&cross_states_root_key(&self.contract_address, self.chain_id, height))?
            .ok_or(Error::NotFound)?;
        let bytes = get_value_from_raw_storage_item(&raw)?;
        H256::try_from(bytes.as_slice()).map_err(|_| Error::StoreError("corrupt cross states root".to_string()))
    }

    /// Persists a cross-states root supplied by the dispatcher's
    /// `ImportCrossChainMsg` side channel (§3.1) against the engine's chain.
    pub fn put_cross_states_root(&self, store: &mut dyn Store, height: u32, root: H256) {
        store.put(
            &cross_states_root_key(&self.contract_address, self.chain_id, height),
            gen_raw_storage_item(&root.0),
        );
    }
}

/// Interprets `hash` as a little-endian 256-bit integer and accepts iff it
/// is strictly below `target`.
#[must_use]
pub fn hash_meets_target(hash: &H256, target: &U256) -> bool {
    U256::from_le_bytes(&hash.0) < *target
}
