use btc_types::U256;

/// Consensus parameters for the foreign chain a `HeaderSyncEngine` tracks.
/// Passed to the engine's constructor rather than read from ambient state,
/// so one process can host engines for several differently-configured
/// chains (e.g. mainnet and testnet) side by side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkParams {
    /// Maximum (easiest) target any header may claim.
    pub pow_limit: U256,
    /// Blocks per difficulty period (2016 for Bitcoin).
    pub retarget_interval: u32,
    /// `retarget_interval * target_spacing_secs`.
    pub target_timespan_secs: u64,
    /// Seconds between blocks at target difficulty.
    pub target_spacing_secs: u32,
    /// Bitcoin testnet's rule allowing `pow_limit` after a 20-minute gap.
    pub allow_min_difficulty_blocks: bool,
}

impl NetworkParams {
    /// Bitcoin mainnet parameters: strict `bits` equality off retarget
    /// boundaries, no minimum-difficulty carve-out.
    #[must_use]
    pub fn bitcoin_mainnet() -> Self {
        NetworkParams {
            pow_limit: U256::new(
                0x0000_0000_ffff_ffff_ffff_ffff_ffff_ffff,
                0xffff_ffff_ffff_ffff_ffff_ffff_ffff_ffff,
            ),
            retarget_interval: 2016,
            target_timespan_secs: 2016 * 10 * 60,
            target_spacing_secs: 10 * 60,
            allow_min_difficulty_blocks: false,
        }
    }

    /// Bitcoin testnet3 parameters: same retarget cadence and `pow_limit`
    /// as mainnet, with the minimum-difficulty carve-out enabled.
    #[must_use]
    pub fn bitcoin_testnet() -> Self {
        NetworkParams {
            allow_min_difficulty_blocks: true,
            ..Self::bitcoin_mainnet()
        }
    }

    #[must_use]
    pub fn min_timespan(&self) -> u64 {
        self.target_timespan_secs / 4
    }

    #[must_use]
    pub fn max_timespan(&self) -> u64 {
        self.target_timespan_secs * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_disallows_minimum_difficulty() {
        assert!(!NetworkParams::bitcoin_mainnet().allow_min_difficulty_blocks);
    }

    #[test]
    fn testnet_allows_minimum_difficulty_and_keeps_mainnet_timing() {
        let testnet = NetworkParams::bitcoin_testnet();
        assert!(testnet.allow_min_difficulty_blocks);
        assert_eq!(
            testnet.target_timespan_secs,
            NetworkParams::bitcoin_mainnet().target_timespan_secs
        );
    }
}
