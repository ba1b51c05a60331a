//! Batches read-only contract calls through an on-chain aggregator contract.
//!
//! Calls are split into chunks, each chunk is sent to the aggregator in a single
//! `eth_call`, and the returned blobs are decoded back into one result per call
//! in the caller's original order.

pub mod multicall;

pub use multicall::{
    multicall, multicall_dynamic_abi, multicall_dynamic_abi_grouped, multicall_grouped,
    AbiCall, Aggregator, AggregatorVersion, Call, ChainReader, DecodeError, EncodeError,
    MulticallError, MulticallOptions, Param,
};
