//! Multicall error types.

use alloy::{
    primitives::{Address, Bytes},
    transports::TransportError,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a multicall batch.
///
/// A batch either yields one decoded result per call or fails as a whole.
#[derive(Debug, Error)]
pub enum MulticallError {
    /// No aggregator is configured for the chain and none was supplied.
    #[error("no multicall aggregator defined for chain id {chain_id}")]
    UnsupportedNetwork {
        /// The chain that was looked up
        chain_id: u64,
    },
    /// A call could not be encoded against its ABI.
    #[error("failed to encode call #{index} to {target}: {source}")]
    Encoding {
        /// Position of the call in the whole batch
        index: usize,
        /// Target as supplied by the caller
        target: String,
        #[source]
        source: EncodeError,
    },
    /// The return data of a call does not match its ABI outputs.
    #[error("failed to decode result of call #{index} to {target}: {source}")]
    Decoding {
        /// Position of the call in the whole batch
        index: usize,
        /// Target contract
        target: Address,
        #[source]
        source: DecodeError,
    },
    /// The aggregator reply could not be decoded or has the wrong number of entries.
    #[error("invalid response from aggregator {aggregator}: {reason}")]
    AggregateResponse {
        /// Aggregator that was called
        aggregator: Address,
        /// What was wrong with the reply
        reason: String,
    },
    /// The RPC transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A transport request did not complete in time.
    #[error("rpc request timed out after {0:?}")]
    Timeout(Duration),
    /// The caller cancelled the batch.
    #[error("multicall cancelled")]
    Cancelled,
}

/// Reasons a single call fails to encode.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid target address: {0}")]
    InvalidTarget(String),
    #[error("function `{0}` not found in abi")]
    UnknownFunction(String),
    #[error("function `{name}` is ambiguous, {candidates} overloads take {args} arguments")]
    AmbiguousFunction { name: String, candidates: usize, args: usize },
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("argument {position} does not match abi type `{expected}`")]
    ArgumentType { position: usize, expected: String },
    #[error("argument {position} overflows `uint{bits}`")]
    Overflow { position: usize, bits: usize },
    #[error("invalid argument {position}: {source}")]
    InvalidArgument {
        position: usize,
        #[source]
        source: alloy::dyn_abi::Error,
    },
    #[error(transparent)]
    Abi(#[from] alloy::dyn_abi::Error),
}

/// Reasons a single result fails to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The aggregator reported the call as failed.
    #[error("call reverted with data {0}")]
    Reverted(Bytes),
    #[error(transparent)]
    Abi(#[from] alloy::dyn_abi::Error),
}
