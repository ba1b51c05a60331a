use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockNumberOrTag,
    json_abi::JsonAbi,
    primitives::{hex, Address},
    providers::ProviderBuilder,
    transports::http::reqwest::Url,
};
use clap::Parser;
use eyre::{Result, WrapErr};
use multicall_batch::{
    multicall,
    multicall::options::{parse_block, DEFAULT_MAX_CALLS_PER_CHUNK},
    multicall_dynamic_abi, AbiCall, Aggregator, AggregatorVersion, Call, MulticallOptions,
};
use serde_json::Value;
use std::{fs, num::NonZeroUsize, path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Batch read-only contract calls through an on-chain aggregator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// RPC endpoint to send the aggregate calls to.
    #[arg(long, env = "MULTICALL_RPC_URL")]
    rpc_url: Url,

    /// JSON file with the calls: `[{"address", "functionName", "params", "abi"}]`.
    #[arg(long)]
    calls: PathBuf,

    /// ABI shared by every call. Without it each call must carry its own `abi`.
    #[arg(long)]
    abi: Option<PathBuf>,

    /// Maximum number of calls per aggregate call.
    #[arg(long, default_value_t = DEFAULT_MAX_CALLS_PER_CHUNK)]
    chunk_size: NonZeroUsize,

    /// Block to read at: latest, earliest, pending, safe, finalized or a block number.
    #[arg(long, default_value = "latest", value_parser = parse_block)]
    block: BlockNumberOrTag,

    /// Chain id to look the aggregator up with, instead of asking the node.
    #[arg(long)]
    chain_id: Option<u64>,

    /// Aggregator contract to use instead of the network default.
    #[arg(long)]
    aggregator: Option<Address>,

    /// Interface of `--aggregator`: v1 (aggregate) or v3 (aggregate3).
    #[arg(long, default_value = "v1")]
    aggregator_version: AggregatorVersion,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn options(&self) -> MulticallOptions {
        let mut options = MulticallOptions::default()
            .with_max_calls_per_chunk(self.chunk_size)
            .with_block(self.block);
        if let Some(chain_id) = self.chain_id {
            options = options.with_chain_id(chain_id);
        }
        if let Some(address) = self.aggregator {
            options = options.with_aggregator(Aggregator { address, version: self.aggregator_version });
        }
        if let Some(secs) = self.timeout_secs {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = args.options();
    let provider = ProviderBuilder::new().connect_http(args.rpc_url.clone());

    let calls_json = fs::read_to_string(&args.calls)
        .wrap_err_with(|| format!("failed to read calls from {}", args.calls.display()))?;

    let results = match &args.abi {
        Some(abi_path) => {
            let abi_json = fs::read_to_string(abi_path)
                .wrap_err_with(|| format!("failed to read abi from {}", abi_path.display()))?;
            let abi: JsonAbi = serde_json::from_str(&abi_json).wrap_err("invalid abi")?;
            let calls: Vec<Call> = serde_json::from_str(&calls_json).wrap_err("invalid calls file")?;
            info!(calls = calls.len(), "running multicall with shared abi");
            multicall(&provider, &abi, &calls, &options).await?
        }
        None => {
            let calls: Vec<AbiCall> = serde_json::from_str(&calls_json).wrap_err("invalid calls file")?;
            info!(calls = calls.len(), "running multicall with per-call abi");
            multicall_dynamic_abi(&provider, &calls, &options).await?
        }
    };

    let output: Vec<Value> = results.iter().map(|values| Value::Array(values.iter().map(to_json).collect())).collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Renders a decoded value: integers as decimal strings, bytes as hex, addresses checksummed.
fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::Function(function) => Value::String(hex::encode_prefixed(function.as_slice())),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}
