use alloy::dyn_abi::{DynSolValue, FunctionExt};

use super::{
    aggregate::ReturnData,
    encode::PreparedCall,
    error::{DecodeError, MulticallError},
};

/// Decodes the aggregator results of one chunk.
///
/// Result `i` is decoded with the function of `prepared[i]`; `offset` is the
/// position of the chunk's first call in the whole batch.
pub(crate) fn decode_chunk(
    prepared: &[PreparedCall<'_>],
    results: Vec<ReturnData>,
    offset: usize,
) -> Result<Vec<Vec<DynSolValue>>, MulticallError> {
    debug_assert_eq!(prepared.len(), results.len());

    prepared
        .iter()
        .zip(results)
        .enumerate()
        .map(|(i, (call, result))| {
            decode_result(call, result).map_err(|source| MulticallError::Decoding {
                index: offset + i,
                target: call.encoded.target,
                source,
            })
        })
        .collect()
}

fn decode_result(call: &PreparedCall<'_>, result: ReturnData) -> Result<Vec<DynSolValue>, DecodeError> {
    if !result.success {
        return Err(DecodeError::Reverted(result.data));
    }
    Ok(call.function.abi_decode_output(&result.data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicall::{
        call::{Call, CallRef},
        encode::encode_call,
        test_utils::erc20_abi,
    };
    use alloy::{
        json_abi::JsonAbi,
        primitives::{address, bytes, Address, Bytes, U256},
        sol_types::SolValue,
    };

    fn ok(data: Vec<u8>) -> ReturnData {
        ReturnData { success: true, data: data.into() }
    }

    #[test]
    fn decode_chunk_test() {
        let abi = erc20_abi();
        let token = address!("e9e7CEA3DedcA5984780Bafc599bD69ADd087D56");
        let calls = vec![
            Call::new(token, "totalSupply"),
            Call::new(token, "symbol"),
            Call::new(token, "balanceOf").with_param(token.to_string()),
        ];
        let prepared: Vec<_> = calls
            .iter()
            .map(|call| encode_call(CallRef::Shared { call, abi: &abi }).unwrap())
            .collect();

        let decoded = decode_chunk(
            &prepared,
            vec![
                ok(U256::from(1_000u64).abi_encode()),
                ok("BUSD".to_string().abi_encode()),
                ok(U256::from(7u64).abi_encode()),
            ],
            0,
        )
        .unwrap();

        assert_eq!(
            decoded,
            vec![
                vec![DynSolValue::Uint(U256::from(1_000u64), 256)],
                vec![DynSolValue::String("BUSD".into())],
                vec![DynSolValue::Uint(U256::from(7u64), 256)],
            ]
        );
    }

    #[test]
    fn decode_multiple_outputs() {
        let abi: JsonAbi = serde_json::from_value(serde_json::json!([
            { "type": "function", "name": "getReserves", "stateMutability": "view", "inputs": [],
              "outputs": [
                { "name": "reserve0", "type": "uint112" },
                { "name": "reserve1", "type": "uint112" },
                { "name": "blockTimestampLast", "type": "uint32" }
              ] }
        ]))
        .unwrap();
        let call = Call::new(Address::ZERO, "getReserves");
        let prepared = vec![encode_call(CallRef::Shared { call: &call, abi: &abi }).unwrap()];

        let data = (U256::from(10u64), U256::from(20u64), U256::from(30u64)).abi_encode_params();
        let decoded = decode_chunk(&prepared, vec![ok(data)], 0).unwrap();

        assert_eq!(
            decoded[0],
            vec![
                DynSolValue::Uint(U256::from(10u64), 112),
                DynSolValue::Uint(U256::from(20u64), 112),
                DynSolValue::Uint(U256::from(30u64), 32),
            ]
        );
    }

    #[test]
    fn empty_return_data_is_a_decoding_error() {
        let abi = erc20_abi();
        let token = Address::with_last_byte(9);
        let calls = vec![Call::new(token, "totalSupply"), Call::new(token, "totalSupply")];
        let prepared: Vec<_> = calls
            .iter()
            .map(|call| encode_call(CallRef::Shared { call, abi: &abi }).unwrap())
            .collect();

        let err = decode_chunk(
            &prepared,
            vec![ok(U256::from(1u64).abi_encode()), ReturnData { success: true, data: Bytes::new() }],
            10,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MulticallError::Decoding { index: 11, target, source: DecodeError::Abi(_) } if target == token
        ));
    }

    #[test]
    fn failed_call_keeps_revert_data() {
        let abi = erc20_abi();
        let call = Call::new(Address::ZERO, "totalSupply");
        let prepared = vec![encode_call(CallRef::Shared { call: &call, abi: &abi }).unwrap()];

        let err = decode_chunk(
            &prepared,
            vec![ReturnData { success: false, data: bytes!("08c379a0") }],
            0,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MulticallError::Decoding { index: 0, source: DecodeError::Reverted(data), .. } if data == bytes!("08c379a0")
        ));
    }
}
