//! In-memory aggregator used by the tests.

use alloy::{
    eips::BlockId,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, SolValue},
    transports::{TransportErrorKind, TransportResult},
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use super::{
    aggregate::{IMulticall, IMulticall3},
    encode::EncodedCall,
    transport::ChainReader,
};

type Handler = Box<dyn Fn(Address, &Bytes) -> Result<Bytes, Bytes> + Send + Sync>;

/// One aggregate call as seen by the mock.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub aggregator: Address,
    pub calls: Vec<EncodedCall>,
    pub block: BlockId,
}

/// Answers aggregate calls by running `handler` on every inner call.
///
/// The handler returns the call's return data, or its revert data.
pub struct MockReader {
    chain_id: u64,
    handler: Handler,
    chain_id_queries: AtomicUsize,
    dispatched: Mutex<Vec<Dispatch>>,
    drop_last_result: bool,
    raw_reply: Option<Bytes>,
    delay: Option<Duration>,
    chain_id_fails: bool,
}

impl MockReader {
    pub fn new(
        chain_id: u64,
        handler: impl Fn(Address, &Bytes) -> Result<Bytes, Bytes> + Send + Sync + 'static,
    ) -> Self {
        Self {
            chain_id,
            handler: Box::new(handler),
            chain_id_queries: AtomicUsize::new(0),
            dispatched: Mutex::new(Vec::new()),
            drop_last_result: false,
            raw_reply: None,
            delay: None,
            chain_id_fails: false,
        }
    }

    /// Replies with one result fewer than requested.
    pub fn drop_last_result(mut self) -> Self {
        self.drop_last_result = true;
        self
    }

    /// Replies with fixed bytes instead of an encoded aggregate result.
    pub fn with_raw_reply(mut self, raw: Bytes) -> Self {
        self.raw_reply = Some(raw);
        self
    }

    /// Delays every static call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails every chain id query with a transport error.
    pub fn with_failing_chain_id(mut self) -> Self {
        self.chain_id_fails = true;
        self
    }

    pub fn chain_id_queries(&self) -> usize {
        self.chain_id_queries.load(Ordering::SeqCst)
    }

    pub fn dispatched(&self) -> Vec<Dispatch> {
        self.dispatched.lock().unwrap().clone()
    }

    /// Sizes of the dispatched chunks, in dispatch order.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.dispatched().iter().map(|d| d.calls.len()).collect()
    }

    fn reply(&self, to: Address, calldata: &Bytes, block: BlockId) -> TransportResult<Bytes> {
        if calldata.starts_with(&IMulticall::aggregateCall::SELECTOR) {
            let request = IMulticall::aggregateCall::abi_decode(calldata).map_err(TransportErrorKind::custom)?;
            let calls: Vec<EncodedCall> = request
                .calls
                .into_iter()
                .map(|call| EncodedCall { target: call.target, calldata: call.callData })
                .collect();
            self.record(to, &calls, block);

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                match (self.handler)(call.target, &call.calldata) {
                    Ok(data) => results.push(data),
                    Err(_) => {
                        return Err(TransportErrorKind::custom_str(
                            "execution reverted: Multicall aggregate: call failed",
                        ))
                    }
                }
            }
            if self.drop_last_result {
                results.pop();
            }
            Ok(self.raw_reply.clone().unwrap_or_else(|| (U256::from(1u64), results).abi_encode_params().into()))
        } else if calldata.starts_with(&IMulticall3::aggregate3Call::SELECTOR) {
            let request = IMulticall3::aggregate3Call::abi_decode(calldata).map_err(TransportErrorKind::custom)?;
            let calls: Vec<EncodedCall> = request
                .calls
                .into_iter()
                .map(|call| EncodedCall { target: call.target, calldata: call.callData })
                .collect();
            self.record(to, &calls, block);

            let mut results: Vec<IMulticall3::Result> = calls
                .iter()
                .map(|call| match (self.handler)(call.target, &call.calldata) {
                    Ok(data) => IMulticall3::Result { success: true, returnData: data },
                    Err(data) => IMulticall3::Result { success: false, returnData: data },
                })
                .collect();
            if self.drop_last_result {
                results.pop();
            }
            Ok(self.raw_reply.clone().unwrap_or_else(|| (results,).abi_encode_params().into()))
        } else {
            Err(TransportErrorKind::custom_str("unknown aggregator selector"))
        }
    }

    fn record(&self, aggregator: Address, calls: &[EncodedCall], block: BlockId) {
        self.dispatched.lock().unwrap().push(Dispatch { aggregator, calls: calls.to_vec(), block });
    }
}

impl ChainReader for MockReader {
    fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send {
        self.chain_id_queries.fetch_add(1, Ordering::SeqCst);
        let reply = if self.chain_id_fails {
            Err(TransportErrorKind::custom_str("connection refused"))
        } else {
            Ok(self.chain_id)
        };
        async move { reply }
    }

    fn static_call(
        &self,
        to: Address,
        calldata: Bytes,
        block: BlockId,
    ) -> impl Future<Output = TransportResult<Bytes>> + Send {
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply(to, &calldata, block)
        }
    }
}

/// A minimal ERC-20 ABI.
pub fn erc20_abi() -> JsonAbi {
    serde_json::from_value(serde_json::json!([
        { "type": "function", "name": "totalSupply", "stateMutability": "view",
          "inputs": [], "outputs": [{ "name": "", "type": "uint256" }] },
        { "type": "function", "name": "symbol", "stateMutability": "view",
          "inputs": [], "outputs": [{ "name": "", "type": "string" }] },
        { "type": "function", "name": "balanceOf", "stateMutability": "view",
          "inputs": [{ "name": "account", "type": "address" }], "outputs": [{ "name": "", "type": "uint256" }] }
    ]))
    .unwrap()
}

/// ABI with a single `getStakeTokenFeeBalance() returns (uint256)` function.
pub fn stake_fee_abi() -> JsonAbi {
    serde_json::from_value(serde_json::json!([
        { "type": "function", "name": "getStakeTokenFeeBalance", "stateMutability": "view",
          "inputs": [], "outputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }] }
    ]))
    .unwrap()
}
