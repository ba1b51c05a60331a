//! The RPC seam used by the batching pipeline.

use alloy::{
    eips::BlockId,
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::Provider,
    rpc::types::TransactionRequest,
    transports::TransportResult,
};
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;

use super::error::MulticallError;

/// The two RPC primitives a multicall needs.
///
/// Implemented for every alloy [`Provider`]; tests substitute an in-memory reader.
pub trait ChainReader: Send + Sync {
    /// Returns the chain id of the connected network (`eth_chainId`).
    fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Executes a read-only call against `to` at `block` (`eth_call`).
    fn static_call(
        &self,
        to: Address,
        calldata: Bytes,
        block: BlockId,
    ) -> impl Future<Output = TransportResult<Bytes>> + Send;
}

impl<P> ChainReader for P
where
    P: Provider,
{
    fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send {
        async move { self.get_chain_id().await }
    }

    fn static_call(
        &self,
        to: Address,
        calldata: Bytes,
        block: BlockId,
    ) -> impl Future<Output = TransportResult<Bytes>> + Send {
        async move {
            let tx = TransactionRequest::default().with_to(to).with_input(calldata);
            self.call(tx).block(block).await
        }
    }
}

/// Timeout and cancellation applied to every request of a batch.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestGuard {
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationToken>,
}

impl RequestGuard {
    pub(crate) fn ensure_active(&self) -> Result<(), MulticallError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(MulticallError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Runs a transport request, failing if it times out or the batch is cancelled first.
    pub(crate) async fn run<T, F>(&self, request: F) -> Result<T, MulticallError>
    where
        F: Future<Output = TransportResult<T>>,
    {
        self.ensure_active()?;

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, request)
                    .await
                    .map_err(|_| MulticallError::Timeout(limit))?
                    .map_err(MulticallError::from),
                None => request.await.map_err(MulticallError::from),
            }
        };

        match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(MulticallError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }
}
