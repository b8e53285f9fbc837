//! ABI encoding of queries and decoding of call results.
//!
//! Query arguments are JSON values. They are rendered as Solidity literals and
//! coerced to each input's declared type, so `"0x90F7..."` becomes an address
//! and `["0x..", "0x.."]` an `address[]`. Decoded results are rendered back to
//! JSON: integers as decimal strings, byte strings as 0x hex and addresses in
//! checksum form.

use crate::ChannelError;
use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::Function;
use bank_types::{with_0x_prefix, ContractDescriptor, ContractQuery, Payload};
use serde_json::Value;

/// Finds the function a query calls.
///
/// Overloads are told apart by argument count.
pub fn find_function<'a>(
	descriptor: &'a ContractDescriptor,
	query: &ContractQuery,
) -> Result<&'a Function, ChannelError> {
	let overloads = descriptor
		.abi
		.function(query.function_name())
		.ok_or_else(|| ChannelError::UnknownFunction(query.function_name().to_string()))?;

	overloads
		.iter()
		.find(|f| f.inputs.len() == query.args().len())
		.ok_or_else(|| {
			ChannelError::Encoding(format!(
				"{} does not take {} arguments",
				query.function_name(),
				query.args().len()
			))
		})
}

/// Encodes a query as calldata, selector included.
pub fn encode_call(function: &Function, query: &ContractQuery) -> Result<Vec<u8>, ChannelError> {
	let values = function
		.inputs
		.iter()
		.zip(query.args())
		.map(|(param, arg)| {
			let ty: DynSolType = param
				.resolve()
				.map_err(|e| ChannelError::Encoding(format!("{}: {}", param.name, e)))?;
			let literal = to_literal(arg, true)?;
			ty.coerce_str(&literal).map_err(|e| {
				ChannelError::Encoding(format!("Argument {} ({}): {}", param.name, param.ty, e))
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	function
		.abi_encode_input(&values)
		.map_err(|e| ChannelError::Encoding(e.to_string()))
}

/// Decodes the return data of a call into a payload.
///
/// A single return value is unwrapped; no return values decode to `null`.
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Payload, ChannelError> {
	let mut values = function
		.abi_decode_output(data)
		.map_err(|e| ChannelError::Decoding(format!("{}: {}", function.name, e)))?;

	let raw = match values.len() {
		0 => Value::Null,
		1 => to_json(values.remove(0))?,
		_ => to_json_array(values)?,
	};
	Ok(Payload::new(raw))
}

/// Renders a JSON argument in the literal syntax `DynSolType::coerce_str` parses.
fn to_literal(value: &Value, top_level: bool) -> Result<String, ChannelError> {
	match value {
		Value::String(s) if top_level => Ok(s.clone()),
		Value::String(s) if s.contains([',', '[', ']', '(', ')', '"']) => {
			Ok(format!("\"{}\"", s.replace('"', "\\\"")))
		},
		Value::String(s) => Ok(s.clone()),
		Value::Number(n) => Ok(n.to_string()),
		Value::Bool(b) => Ok(b.to_string()),
		Value::Array(items) => {
			let items = items
				.iter()
				.map(|item| to_literal(item, false))
				.collect::<Result<Vec<_>, _>>()?;
			Ok(format!("[{}]", items.join(",")))
		},
		Value::Null | Value::Object(_) => Err(ChannelError::Encoding(format!(
			"Unsupported argument {}",
			value
		))),
	}
}

/// Renders a decoded value as JSON. Values with no JSON rendering are errors.
fn to_json(value: DynSolValue) -> Result<Value, ChannelError> {
	Ok(match value {
		DynSolValue::Bool(b) => Value::Bool(b),
		DynSolValue::Int(i, _) => Value::String(i.to_string()),
		DynSolValue::Uint(u, _) => Value::String(u.to_string()),
		DynSolValue::FixedBytes(word, size) => hex_value(&word[..size]),
		DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
		DynSolValue::Function(function) => hex_value(function.as_slice()),
		DynSolValue::Bytes(bytes) => hex_value(&bytes),
		DynSolValue::String(s) => Value::String(s),
		DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
			to_json_array(items)?
		},
		#[allow(unreachable_patterns)]
		other => {
			return Err(ChannelError::Decoding(format!(
				"Unsupported return value {:?}",
				other
			)))
		},
	})
}

fn to_json_array(items: Vec<DynSolValue>) -> Result<Value, ChannelError> {
	items
		.into_iter()
		.map(to_json)
		.collect::<Result<Vec<_>, _>>()
		.map(Value::Array)
}

fn hex_value(bytes: &[u8]) -> Value {
	Value::String(with_0x_prefix(&hex::encode(bytes)))
}
