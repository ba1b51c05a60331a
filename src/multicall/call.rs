use alloy::{dyn_abi::DynSolValue, json_abi::JsonAbi};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single read-only call: target contract, function and arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Contract address in any letter case.
    #[serde(alias = "target")]
    pub address: String,
    /// Function name (`balanceOf`) or full signature (`balanceOf(address)`).
    pub function_name: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Call {
    pub fn new(address: impl ToString, function_name: impl Into<String>) -> Self {
        Self { address: address.to_string(), function_name: function_name.into(), params: Vec::new() }
    }

    pub fn with_params<P: Into<Param>>(mut self, params: impl IntoIterator<Item = P>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_param(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Attaches an ABI to this call for use with the dynamic ABI operations.
    pub fn with_abi(self, abi: JsonAbi) -> AbiCall {
        AbiCall { call: self, abi }
    }
}

/// A call that carries its own ABI.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiCall {
    #[serde(flatten)]
    pub call: Call,
    pub abi: JsonAbi,
}

/// A call argument.
///
/// `Text` arguments are coerced against the declared input type when the call
/// is encoded, so `"0x5798…"`, `"1000"` or `"[1,2]"` are all accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(DynSolValue),
    Text(String),
}

impl From<DynSolValue> for Param {
    fn from(value: DynSolValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Param {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Param {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<'de> Deserialize<'de> for Param {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::Text(json_to_text(&Value::deserialize(deserializer)?)))
    }
}

// Renders JSON arguments in the syntax understood by `DynSolType::coerce_str`.
fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(json_to_text).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// A call together with the ABI used to encode it and decode its result.
///
/// Shared-ABI and per-call-ABI batches both go through this so the pipeline
/// has a single code path.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CallRef<'a> {
    Shared { call: &'a Call, abi: &'a JsonAbi },
    Dynamic(&'a AbiCall),
}

impl<'a> CallRef<'a> {
    pub(crate) fn call(&self) -> &'a Call {
        match self {
            CallRef::Shared { call, .. } => call,
            CallRef::Dynamic(abi_call) => &abi_call.call,
        }
    }

    pub(crate) fn abi(&self) -> &'a JsonAbi {
        match self {
            CallRef::Shared { abi, .. } => abi,
            CallRef::Dynamic(abi_call) => &abi_call.abi,
        }
    }
}
