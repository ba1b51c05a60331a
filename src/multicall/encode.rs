use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
    primitives::{Address, Bytes, U256},
};

use super::{
    call::{CallRef, Param},
    error::{EncodeError, MulticallError},
};

/// Target address and calldata for one call of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub target: Address,
    pub calldata: Bytes,
}

/// An encoded call plus the ABI function its return data must be decoded with.
#[derive(Debug, Clone)]
pub(crate) struct PreparedCall<'a> {
    pub encoded: EncodedCall,
    pub function: &'a Function,
}

/// Encodes every call of a chunk. `offset` is the position of the first call in the whole batch.
pub(crate) fn encode_chunk<'a>(
    calls: &[CallRef<'a>],
    offset: usize,
) -> Result<Vec<PreparedCall<'a>>, MulticallError> {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            encode_call(*call).map_err(|source| MulticallError::Encoding {
                index: offset + i,
                target: call.call().address.clone(),
                source,
            })
        })
        .collect()
}

pub(crate) fn encode_call(call_ref: CallRef<'_>) -> Result<PreparedCall<'_>, EncodeError> {
    let call = call_ref.call();
    let target = parse_target(&call.address)?;
    let function = resolve_function(call_ref.abi(), &call.function_name, call.params.len())?;
    let args = coerce_params(function, &call.params)?;
    let calldata = function.abi_encode_input(&args)?;

    Ok(PreparedCall {
        encoded: EncodedCall { target, calldata: calldata.into() },
        function,
    })
}

/// Parses a target address. Letter case carries no meaning here, checksums are not enforced.
pub fn parse_target(address: &str) -> Result<Address, EncodeError> {
    address
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| EncodeError::InvalidTarget(address.to_string()))
}

/// Finds the function a call refers to.
///
/// A name containing `(` is matched against full signatures. A bare name picks
/// the only overload, or the only overload taking `args` arguments.
pub fn resolve_function<'a>(abi: &'a JsonAbi, name: &str, args: usize) -> Result<&'a Function, EncodeError> {
    if name.contains('(') {
        let wanted: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        return abi
            .functions()
            .find(|f| f.signature() == wanted)
            .ok_or_else(|| EncodeError::UnknownFunction(name.to_string()));
    }

    let overloads = abi
        .function(name)
        .filter(|overloads| !overloads.is_empty())
        .ok_or_else(|| EncodeError::UnknownFunction(name.to_string()))?;

    if let [function] = overloads.as_slice() {
        return Ok(function);
    }

    let mut matching = overloads.iter().filter(|f| f.inputs.len() == args);
    match (matching.next(), matching.next()) {
        (Some(function), None) => Ok(function),
        (None, _) => Err(EncodeError::UnknownFunction(format!("{name} with {args} arguments"))),
        (Some(_), Some(_)) => Err(EncodeError::AmbiguousFunction {
            name: name.to_string(),
            candidates: 2 + matching.count(),
            args,
        }),
    }
}

fn coerce_params(function: &Function, params: &[Param]) -> Result<Vec<DynSolValue>, EncodeError> {
    if function.inputs.len() != params.len() {
        return Err(EncodeError::ArgumentCount { expected: function.inputs.len(), actual: params.len() });
    }

    function
        .inputs
        .iter()
        .zip(params)
        .enumerate()
        .map(|(position, (input, param))| {
            let ty = input.resolve()?;
            coerce_param(&ty, param, position)
        })
        .collect()
}

fn coerce_param(ty: &DynSolType, param: &Param, position: usize) -> Result<DynSolValue, EncodeError> {
    let value = match param {
        Param::Text(text) => ty
            .coerce_str(text)
            .map_err(|source| EncodeError::InvalidArgument { position, source })?,
        Param::Value(value) => {
            if !ty.matches(value) {
                return Err(EncodeError::ArgumentType { position, expected: ty.to_string() });
            }
            value.clone()
        }
    };

    check_bounds(&value).map_err(|bits| EncodeError::Overflow { position, bits })?;
    Ok(value)
}

/// Checks every integer inside `value` fits its declared width. Returns the offending width.
fn check_bounds(value: &DynSolValue) -> Result<(), usize> {
    match value {
        DynSolValue::Uint(v, bits) if *bits < 256 && v.bit_len() > *bits => Err(*bits),
        DynSolValue::Int(v, bits) if *bits < 256 => {
            // two's complement range is [-2^(bits-1), 2^(bits-1) - 1]
            let magnitude = v.unsigned_abs();
            let fits = magnitude.bit_len() < *bits
                || (v.is_negative() && magnitude == U256::from(1u8) << (*bits - 1));
            if fits {
                Ok(())
            } else {
                Err(*bits)
            }
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            items.iter().try_for_each(check_bounds)
        }
        _ => Ok(()),
    }
}
