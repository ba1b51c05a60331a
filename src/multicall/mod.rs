pub mod aggregate;
pub mod call;
pub mod chunk;
pub mod decode;
pub mod encode;
pub mod error;
pub mod networks;
pub mod options;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

use alloy::{dyn_abi::DynSolValue, eips::BlockId, json_abi::JsonAbi};
use tracing::{debug, instrument};

pub use aggregate::{Aggregator, AggregatorVersion, ReturnData};
pub use call::{AbiCall, Call, Param};
pub use encode::EncodedCall;
pub use error::{DecodeError, EncodeError, MulticallError};
pub use options::MulticallOptions;
pub use transport::ChainReader;

use call::CallRef;
use transport::RequestGuard;

/// Decoded return values of one call.
pub type CallResult = Vec<DynSolValue>;

/// Batch calls to contracts sharing one ABI.
///
/// Calls are sent to the network's aggregator contract in chunks of at most
/// `options.max_calls_per_chunk`. Returns one result per call, in call order;
/// each result holds the function's return values in declaration order.
pub async fn multicall<R: ChainReader>(
    reader: &R,
    abi: &JsonAbi,
    calls: &[Call],
    options: &MulticallOptions,
) -> Result<Vec<CallResult>, MulticallError> {
    let calls: Vec<CallRef<'_>> = calls.iter().map(|call| CallRef::Shared { call, abi }).collect();
    execute(reader, &calls, options).await
}

/// Batch calls that each carry their own ABI.
pub async fn multicall_dynamic_abi<R: ChainReader>(
    reader: &R,
    calls: &[AbiCall],
    options: &MulticallOptions,
) -> Result<Vec<CallResult>, MulticallError> {
    let calls: Vec<CallRef<'_>> = calls.iter().map(CallRef::Dynamic).collect();
    execute(reader, &calls, options).await
}

/// Batch groups of calls that each carry their own ABI, returning results in the same grouping.
///
/// All groups are dispatched together, so group boundaries do not affect chunking.
pub async fn multicall_dynamic_abi_grouped<R: ChainReader>(
    reader: &R,
    groups: &[Vec<AbiCall>],
    options: &MulticallOptions,
) -> Result<Vec<Vec<CallResult>>, MulticallError> {
    let (flat, lengths) = chunk::flatten(groups);
    let calls: Vec<CallRef<'_>> = flat.into_iter().map(CallRef::Dynamic).collect();
    let results = execute(reader, &calls, options).await?;
    Ok(chunk::regroup(results, &lengths))
}

/// Batch groups of calls sharing one ABI, returning results in the same grouping.
pub async fn multicall_grouped<R: ChainReader>(
    reader: &R,
    abi: &JsonAbi,
    groups: &[Vec<Call>],
    options: &MulticallOptions,
) -> Result<Vec<Vec<CallResult>>, MulticallError> {
    let (flat, lengths) = chunk::flatten(groups);
    let calls: Vec<CallRef<'_>> = flat.into_iter().map(|call| CallRef::Shared { call, abi }).collect();
    let results = execute(reader, &calls, options).await?;
    Ok(chunk::regroup(results, &lengths))
}

#[instrument(skip_all, fields(calls = calls.len(), chunk_size = options.max_calls_per_chunk.get()))]
async fn execute<R: ChainReader>(
    reader: &R,
    calls: &[CallRef<'_>],
    options: &MulticallOptions,
) -> Result<Vec<CallResult>, MulticallError> {
    let guard = options.guard();
    let aggregator = resolve_aggregator(reader, options, &guard).await?;
    let block = BlockId::Number(options.block);

    let mut results = Vec::with_capacity(calls.len());
    for (index, chunk) in chunk::chunk(calls, options.max_calls_per_chunk).enumerate() {
        guard.ensure_active()?;
        let offset = results.len();
        debug!(chunk = index, offset, size = chunk.len(), %aggregator, "processing chunk");

        let prepared = encode::encode_chunk(chunk, offset)?;
        let encoded: Vec<EncodedCall> = prepared.iter().map(|call| call.encoded.clone()).collect();
        let returned = aggregate::aggregate(reader, &aggregator, &encoded, block, &guard).await?;
        results.extend(decode::decode_chunk(&prepared, returned, offset)?);
    }

    Ok(results)
}

/// Picks the aggregator: explicit override, then the table entry for the chain.
///
/// The chain id is taken from the options or queried once from the transport.
async fn resolve_aggregator<R: ChainReader>(
    reader: &R,
    options: &MulticallOptions,
    guard: &RequestGuard,
) -> Result<Aggregator, MulticallError> {
    if let Some(aggregator) = options.aggregator {
        return Ok(aggregator);
    }

    let chain_id = match options.chain_id {
        Some(chain_id) => chain_id,
        None => guard.run(reader.chain_id()).await?,
    };

    networks::aggregator_for(chain_id).ok_or(MulticallError::UnsupportedNetwork { chain_id })
}
