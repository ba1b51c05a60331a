use alloy::{
    eips::BlockId,
    primitives::{Address, Bytes},
    sol,
    sol_types::SolCall,
};
use std::{fmt, str::FromStr};
use tracing::trace;

use super::{
    encode::EncodedCall,
    error::MulticallError,
    transport::{ChainReader, RequestGuard},
};

sol! {
    interface IMulticall {
        struct Call {
            // Target contract to call.
            address target;
            // Data to call on the target contract.
            bytes callData;
        }

        /// @notice Aggregate calls, reverting if any of them fails
        /// @param calls An array of Call structs
        /// @return blockNumber The block the calls were executed at
        /// @return returnData An array of return data, one per call
        function aggregate(Call[] memory calls) public returns (uint256 blockNumber, bytes[] memory returnData);
    }
}

sol! {
    interface IMulticall3 {
        struct Call3 {
            // Target contract to call.
            address target;
            // If false, the entire call will revert if the call fails.
            bool allowFailure;
            // Data to call on the target contract.
            bytes callData;
        }

        struct Result {
            // True if the call succeeded, false otherwise.
            bool success;
            // Return data if the call succeeded, or revert data if the call reverted.
            bytes returnData;
        }

        /// @notice Aggregate calls, ensuring each returns success if required
        /// @param calls An array of Call3 structs
        /// @return returnData An array of Result structs
        function aggregate3(Call3[] calldata calls) public payable returns (Result[] memory returnData);
    }
}

/// Which aggregator interface a deployment speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregatorVersion {
    /// `aggregate((address,bytes)[])`, a failing call reverts the whole batch.
    #[default]
    V1,
    /// Multicall3 `aggregate3`, failures are reported per call.
    V3,
}

impl FromStr for AggregatorVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" | "aggregate" => Ok(Self::V1),
            "v3" | "3" | "aggregate3" => Ok(Self::V3),
            other => Err(format!("unknown aggregator version `{other}`, expected v1 or v3")),
        }
    }
}

/// A deployed aggregator contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    pub address: Address,
    pub version: AggregatorVersion,
}

impl Aggregator {
    pub const fn v1(address: Address) -> Self {
        Self { address, version: AggregatorVersion::V1 }
    }

    pub const fn v3(address: Address) -> Self {
        Self { address, version: AggregatorVersion::V3 }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.address, self.version)
    }
}

/// Return data of one call as reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnData {
    pub success: bool,
    pub data: Bytes,
}

/// Runs one chunk through the aggregator in a single `eth_call`.
///
/// The result holds exactly one entry per call, in call order.
pub(crate) async fn aggregate<R: ChainReader>(
    reader: &R,
    aggregator: &Aggregator,
    calls: &[EncodedCall],
    block: BlockId,
    guard: &RequestGuard,
) -> Result<Vec<ReturnData>, MulticallError> {
    let calldata = encode_aggregate(aggregator.version, calls);
    trace!(aggregator = %aggregator.address, calls = calls.len(), bytes = calldata.len(), "dispatching aggregate");

    let raw = guard.run(reader.static_call(aggregator.address, calldata, block)).await?;
    let results = decode_aggregate(aggregator, &raw)?;

    if results.len() != calls.len() {
        return Err(MulticallError::AggregateResponse {
            aggregator: aggregator.address,
            reason: format!("expected {} results, got {}", calls.len(), results.len()),
        });
    }
    Ok(results)
}

fn encode_aggregate(version: AggregatorVersion, calls: &[EncodedCall]) -> Bytes {
    match version {
        AggregatorVersion::V1 => IMulticall::aggregateCall {
            calls: calls
                .iter()
                .map(|call| IMulticall::Call { target: call.target, callData: call.calldata.clone() })
                .collect(),
        }
        .abi_encode(),
        // Failures are decoded per call so the error can name the offending position.
        AggregatorVersion::V3 => IMulticall3::aggregate3Call {
            calls: calls
                .iter()
                .map(|call| IMulticall3::Call3 {
                    target: call.target,
                    allowFailure: true,
                    callData: call.calldata.clone(),
                })
                .collect(),
        }
        .abi_encode(),
    }
    .into()
}

fn decode_aggregate(aggregator: &Aggregator, raw: &[u8]) -> Result<Vec<ReturnData>, MulticallError> {
    let malformed = |e: alloy::sol_types::Error| MulticallError::AggregateResponse {
        aggregator: aggregator.address,
        reason: e.to_string(),
    };

    match aggregator.version {
        AggregatorVersion::V1 => {
            let reply = IMulticall::aggregateCall::abi_decode_returns(raw).map_err(malformed)?;
            Ok(reply
                .returnData
                .into_iter()
                .map(|data| ReturnData { success: true, data })
                .collect())
        }
        AggregatorVersion::V3 => {
            let results = IMulticall3::aggregate3Call::abi_decode_returns(raw).map_err(malformed)?;
            Ok(results
                .into_iter()
                .map(|result| ReturnData { success: result.success, data: result.returnData })
                .collect())
        }
    }
}
