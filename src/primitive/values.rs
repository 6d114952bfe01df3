// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Positional and named value lists bound to `QUERY`, `EXECUTE`, and
//! `BATCH` bodies.

use bytes::{Buf, BufMut};
use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	ReadableWithContext,
	Result,
	ResultExt,
	WireSize,
	WritableWithContext,
};

use super::{read_string, string_size, write_string};
use crate::value::Value;

fn value_count(count: usize) -> Result<u16> {
	u16::try_from(count).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: count as i64,
			expected: "no more than 65535 values",
		})
	})
}

/// Reads a positional value list: a `[short]` count of cells.
///
/// # Errors
///
/// Fails when any cell fails, including `UNSET` cells under protocol
/// version 3.
pub fn read_positional_values(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Vec<Value>> {
	let count = buf.try_get_u16().context("cannot read value count")?;
	let mut values = Vec::with_capacity(usize::from(count));

	for index in 0..count {
		values.push(
			Value::read_with(buf, &version).with_context(|| format!("cannot read value {index}"))?,
		);
	}

	Ok(values)
}

/// Writes a positional value list.
///
/// # Errors
///
/// Fails when there are more than 65 535 values or any cell fails.
pub fn write_positional_values(
	values: &[Value],
	buf: &mut impl BufMut,
	version: ProtocolVersion,
) -> Result<()> {
	buf.try_put_u16(value_count(values.len())?)?;

	for (index, value) in values.iter().enumerate() {
		value
			.write_with(buf, &version)
			.with_context(|| format!("cannot write value {index}"))?;
	}

	Ok(())
}

/// The encoded size of a positional value list.
#[must_use]
pub fn positional_values_size(values: &[Value]) -> usize {
	u16::WIRE_SIZE + values.iter().map(WireSize::wire_size).sum::<usize>()
}

/// Reads a named value list: a `[short]` count of `([string], cell)`
/// pairs, preserving order.
///
/// # Errors
///
/// Fails when any name or cell fails.
pub fn read_named_values(
	buf: &mut impl Buf,
	version: ProtocolVersion,
) -> Result<Vec<(String, Value)>> {
	let count = buf.try_get_u16().context("cannot read value count")?;
	let mut values = Vec::with_capacity(usize::from(count));

	for index in 0..count {
		let name =
			read_string(buf).with_context(|| format!("cannot read value name {index}"))?;
		let value = Value::read_with(buf, &version)
			.with_context(|| format!("cannot read value {index}"))?;

		values.push((name, value));
	}

	Ok(values)
}

/// Writes a named value list in the order given.
///
/// # Errors
///
/// Fails when there are more than 65 535 values or any name or cell fails.
pub fn write_named_values(
	values: &[(String, Value)],
	buf: &mut impl BufMut,
	version: ProtocolVersion,
) -> Result<()> {
	buf.try_put_u16(value_count(values.len())?)?;

	for (index, (name, value)) in values.iter().enumerate() {
		write_string(name, buf).with_context(|| format!("cannot write value name {index}"))?;
		value
			.write_with(buf, &version)
			.with_context(|| format!("cannot write value {index}"))?;
	}

	Ok(())
}

/// The encoded size of a named value list.
#[must_use]
pub fn named_values_size(values: &[(String, Value)]) -> usize {
	u16::WIRE_SIZE
		+ values
			.iter()
			.map(|(name, value)| string_size(name) + value.wire_size())
			.sum::<usize>()
}
