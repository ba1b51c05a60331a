use alloy::primitives::{address, Address};

use super::aggregate::Aggregator;

pub const ETHEREUM_MAINNET: u64 = 1;
pub const BSC_MAINNET: u64 = 56;
pub const BSC_TESTNET: u64 = 97;

pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");
pub const BSC_MAINNET_MULTICALL_ADDRESS: Address = address!("7D82217018FAAcf81d4726134939C12300fF6B9E");
pub const BSC_TESTNET_MULTICALL_ADDRESS: Address = address!("7b6838b362f05bA2a0CAA8F9c1B34F3D619e7413");

/// Returns the aggregator deployed on `chain_id`, if one is known.
pub fn aggregator_for(chain_id: u64) -> Option<Aggregator> {
    match chain_id {
        ETHEREUM_MAINNET => Some(Aggregator::v3(MULTICALL3_ADDRESS)),
        BSC_MAINNET => Some(Aggregator::v1(BSC_MAINNET_MULTICALL_ADDRESS)),
        BSC_TESTNET => Some(Aggregator::v1(BSC_TESTNET_MULTICALL_ADDRESS)),
        _ => None,
    }
}
