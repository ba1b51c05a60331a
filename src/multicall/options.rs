use alloy::{eips::BlockNumberOrTag, primitives::Address};
use std::{num::NonZeroUsize, time::Duration};
use tokio_util::sync::CancellationToken;

use super::{aggregate::Aggregator, transport::RequestGuard};

pub const DEFAULT_MAX_CALLS_PER_CHUNK: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Knobs for a multicall batch.
#[derive(Debug, Clone)]
pub struct MulticallOptions {
    /// Upper bound on the number of calls sent in one aggregate call.
    pub max_calls_per_chunk: NonZeroUsize,
    /// Block the calls are evaluated at.
    pub block: BlockNumberOrTag,
    /// Chain id to look the aggregator up with. Queried from the transport when absent.
    pub chain_id: Option<u64>,
    /// Aggregator to use instead of the per-network default.
    pub aggregator: Option<Aggregator>,
    /// Limit for each RPC request of the batch.
    pub timeout: Option<Duration>,
    /// Aborts the batch when cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl Default for MulticallOptions {
    fn default() -> Self {
        Self {
            max_calls_per_chunk: DEFAULT_MAX_CALLS_PER_CHUNK,
            block: BlockNumberOrTag::Latest,
            chain_id: None,
            aggregator: None,
            timeout: None,
            cancellation: None,
        }
    }
}

impl MulticallOptions {
    pub fn with_max_calls_per_chunk(mut self, max_calls_per_chunk: NonZeroUsize) -> Self {
        self.max_calls_per_chunk = max_calls_per_chunk;
        self
    }

    pub fn with_block(mut self, block: impl Into<BlockNumberOrTag>) -> Self {
        self.block = block.into();
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Overrides the aggregator address, assuming the `aggregate` (v1) interface.
    pub fn with_aggregator_address(self, address: Address) -> Self {
        self.with_aggregator(Aggregator::v1(address))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn guard(&self) -> RequestGuard {
        RequestGuard { timeout: self.timeout, cancellation: self.cancellation.clone() }
    }
}

/// Parses a block reference: a tag (`latest`, `earliest`, `pending`, `safe`,
/// `finalized`), a decimal height or a `0x`-prefixed hex height.
pub fn parse_block(s: &str) -> Result<BlockNumberOrTag, String> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "latest" => Ok(BlockNumberOrTag::Latest),
        "earliest" => Ok(BlockNumberOrTag::Earliest),
        "pending" => Ok(BlockNumberOrTag::Pending),
        "safe" => Ok(BlockNumberOrTag::Safe),
        "finalized" => Ok(BlockNumberOrTag::Finalized),
        other => {
            let height = match other.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => other.parse(),
            };
            height
                .map(BlockNumberOrTag::Number)
                .map_err(|e| format!("invalid block reference `{s}`: {e}"))
        }
    }
}
