// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The notations the whole wire format is spelled in.
//!
//! Every structure the protocol exchanges is composed from a small alphabet
//! of length-prefixed notations. The naming follows the protocol
//! specification:
//!
//! - `[string]` - unsigned 16-bit length, then that many UTF-8 bytes.
//! - `[long string]` - signed 32-bit length (non-negative), then bytes.
//! - `[bytes]` - signed 32-bit length; `-1` is the null blob, distinct
//!   from the empty blob of length `0`.
//! - `[short bytes]` - unsigned 16-bit length; no null form.
//! - `[string list]` - unsigned 16-bit count of `[string]`s, order kept.
//! - `[string map]`, `[string multimap]`, `[bytes map]` - unsigned 16-bit
//!   entry counts; entry order on the wire is unspecified.
//! - `[uuid]` - exactly 16 raw bytes.
//! - `[inetaddr]`, `[inet]`, the reason map - the address notations, a
//!   1-byte length of 4 or 16 ahead of the raw address.
//! - value cells and value lists - see [`Value`](crate::Value) and
//!   [`read_positional_values`].
//!
//! Each notation comes as a read/write/size triple; the size functions are
//! exact, which is what lets the frame codec allocate its output buffer
//! once.

mod inet;
mod values;

pub use inet::{
	inetaddr_size,
	read_inet,
	read_inetaddr,
	read_reason_map,
	reason_map_size,
	write_inet,
	write_inetaddr,
	write_reason_map,
	Inet,
};
pub use values::{
	named_values_size,
	positional_values_size,
	read_named_values,
	read_positional_values,
	write_named_values,
	write_positional_values,
};

use std::collections::HashMap;

use bytes::{Buf, BufMut};
use cqlkit::{BufExt, BufMutExt, ConstantWireSize, Error, ErrorKind, Result, ResultExt};
use uuid::Uuid;

/// The size of a `[uuid]` on the wire: 16 raw bytes, no prefix.
pub const UUID_SIZE: usize = 16;

const NULL_BYTES_LENGTH: i32 = -1;

fn short_length(length: usize, of_what: &'static str) -> Result<u16> {
	u16::try_from(length).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: length as i64,
			expected: of_what,
		})
	})
}

fn int_length(length: usize, of_what: &'static str) -> Result<i32> {
	i32::try_from(length).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: length as i64,
			expected: of_what,
		})
	})
}

/// Reads a `[string]`.
///
/// # Errors
///
/// Fails on a short buffer or content that is not UTF-8.
pub fn read_string(buf: &mut impl Buf) -> Result<String> {
	let length = buf.try_get_u16().context("cannot read string length")?;
	let content = buf
		.try_copy_to_vec(usize::from(length))
		.context("cannot read string content")?;

	String::from_utf8(content).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: i64::from(length),
			expected: "well-formed UTF-8 string content",
		})
	})
}

/// Writes a `[string]`.
///
/// # Errors
///
/// Fails when `string` is longer than 65 535 bytes, or on a writer out of
/// capacity.
pub fn write_string(string: &str, buf: &mut impl BufMut) -> Result<()> {
	let length = short_length(string.len(), "a string no longer than 65535 bytes")?;

	buf.try_put_u16(length)?;
	buf.try_put_slice(string.as_bytes())
}

/// The encoded size of a `[string]`.
#[must_use]
pub fn string_size(string: &str) -> usize {
	u16::WIRE_SIZE + string.len()
}

/// Reads a `[long string]`.
///
/// # Errors
///
/// Fails on a negative length, a short buffer, or content that is not
/// UTF-8.
pub fn read_long_string(buf: &mut impl Buf) -> Result<String> {
	let length = buf.try_get_i32().context("cannot read long string length")?;
	let length = usize::try_from(length).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: i64::from(length),
			expected: "a non-negative long string length",
		})
	})?;
	let content = buf
		.try_copy_to_vec(length)
		.context("cannot read long string content")?;

	String::from_utf8(content).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: length as i64,
			expected: "well-formed UTF-8 string content",
		})
	})
}

/// Writes a `[long string]`.
///
/// # Errors
///
/// Fails when `string` does not fit a signed 32-bit length, or on a writer
/// out of capacity.
pub fn write_long_string(string: &str, buf: &mut impl BufMut) -> Result<()> {
	let length = int_length(string.len(), "a string no longer than 2147483647 bytes")?;

	buf.try_put_i32(length)?;
	buf.try_put_slice(string.as_bytes())
}

/// The encoded size of a `[long string]`.
#[must_use]
pub fn long_string_size(string: &str) -> usize {
	i32::WIRE_SIZE + string.len()
}

/// Reads a `[bytes]` blob; `None` is the null blob.
///
/// # Errors
///
/// Fails on a length below `-1` or a short buffer.
pub fn read_bytes(buf: &mut impl Buf) -> Result<Option<Vec<u8>>> {
	let length = buf.try_get_i32().context("cannot read bytes length")?;

	match length {
		NULL_BYTES_LENGTH => Ok(None),
		negative if negative < 0 => Err(Error::new(ErrorKind::InvalidLength {
			length: i64::from(negative),
			expected: "a bytes length of -1 or greater",
		})),
		_ => {
			#[allow(clippy::cast_sign_loss)]
			let content = buf
				.try_copy_to_vec(length as usize)
				.context("cannot read bytes content")?;

			Ok(Some(content))
		},
	}
}

/// Writes a `[bytes]` blob; `None` emits the `-1` null sentinel.
///
/// # Errors
///
/// Fails when the blob does not fit a signed 32-bit length, or on a writer
/// out of capacity.
pub fn write_bytes(bytes: Option<&[u8]>, buf: &mut impl BufMut) -> Result<()> {
	match bytes {
		None => buf.try_put_i32(NULL_BYTES_LENGTH),
		Some(content) => {
			let length = int_length(content.len(), "a blob no longer than 2147483647 bytes")?;

			buf.try_put_i32(length)?;
			buf.try_put_slice(content)
		},
	}
}

/// The encoded size of a `[bytes]` blob.
#[must_use]
pub fn bytes_size(bytes: Option<&[u8]>) -> usize {
	i32::WIRE_SIZE + bytes.map_or(0, <[u8]>::len)
}

/// Reads a `[short bytes]` blob.
///
/// # Errors
///
/// Fails on a short buffer.
pub fn read_short_bytes(buf: &mut impl Buf) -> Result<Vec<u8>> {
	let length = buf.try_get_u16().context("cannot read short bytes length")?;

	buf.try_copy_to_vec(usize::from(length))
		.context("cannot read short bytes content")
}

/// Writes a `[short bytes]` blob.
///
/// # Errors
///
/// Fails when the blob is longer than 65 535 bytes, or on a writer out of
/// capacity.
pub fn write_short_bytes(bytes: &[u8], buf: &mut impl BufMut) -> Result<()> {
	let length = short_length(bytes.len(), "a blob no longer than 65535 bytes")?;

	buf.try_put_u16(length)?;
	buf.try_put_slice(bytes)
}

/// The encoded size of a `[short bytes]` blob.
#[must_use]
pub fn short_bytes_size(bytes: &[u8]) -> usize {
	u16::WIRE_SIZE + bytes.len()
}

/// Reads a `[string list]`, preserving order.
///
/// # Errors
///
/// Fails when any element fails.
pub fn read_string_list(buf: &mut impl Buf) -> Result<Vec<String>> {
	let count = buf.try_get_u16().context("cannot read string list count")?;
	let mut list = Vec::with_capacity(usize::from(count));

	for index in 0..count {
		list.push(
			read_string(buf).with_context(|| format!("cannot read string list element {index}"))?,
		);
	}

	Ok(list)
}

/// Writes a `[string list]` in the order given.
///
/// # Errors
///
/// Fails when the list holds more than 65 535 strings or any element
/// fails.
pub fn write_string_list(list: &[String], buf: &mut impl BufMut) -> Result<()> {
	let count = short_length(list.len(), "a list of no more than 65535 strings")?;

	buf.try_put_u16(count)?;

	for string in list {
		write_string(string, buf)?;
	}

	Ok(())
}

/// The encoded size of a `[string list]`.
#[must_use]
pub fn string_list_size(list: &[String]) -> usize {
	u16::WIRE_SIZE + list.iter().map(|string| string_size(string)).sum::<usize>()
}

/// Reads a `[string map]`.
///
/// Well-formed input has unique keys; a duplicate key keeps the later
/// entry.
///
/// # Errors
///
/// Fails when any entry fails.
pub fn read_string_map(buf: &mut impl Buf) -> Result<HashMap<String, String>> {
	let count = buf.try_get_u16().context("cannot read string map count")?;
	let mut map = HashMap::with_capacity(usize::from(count));

	for index in 0..count {
		let key =
			read_string(buf).with_context(|| format!("cannot read string map key {index}"))?;
		let value =
			read_string(buf).with_context(|| format!("cannot read string map value {index}"))?;

		map.insert(key, value);
	}

	Ok(map)
}

/// Writes a `[string map]`. Entry order on the wire is unspecified.
///
/// # Errors
///
/// Fails when the map holds more than 65 535 entries or any entry fails.
pub fn write_string_map(map: &HashMap<String, String>, buf: &mut impl BufMut) -> Result<()> {
	let count = short_length(map.len(), "a map of no more than 65535 entries")?;

	buf.try_put_u16(count)?;

	for (key, value) in map {
		write_string(key, buf)?;
		write_string(value, buf)?;
	}

	Ok(())
}

/// The encoded size of a `[string map]`.
#[must_use]
pub fn string_map_size(map: &HashMap<String, String>) -> usize {
	u16::WIRE_SIZE
		+ map
			.iter()
			.map(|(key, value)| string_size(key) + string_size(value))
			.sum::<usize>()
}

/// Reads a `[string multimap]`.
///
/// # Errors
///
/// Fails when any entry fails.
pub fn read_string_multimap(buf: &mut impl Buf) -> Result<HashMap<String, Vec<String>>> {
	let count = buf
		.try_get_u16()
		.context("cannot read string multimap count")?;
	let mut map = HashMap::with_capacity(usize::from(count));

	for index in 0..count {
		let key =
			read_string(buf).with_context(|| format!("cannot read string multimap key {index}"))?;
		let values = read_string_list(buf)
			.with_context(|| format!("cannot read string multimap values {index}"))?;

		map.insert(key, values);
	}

	Ok(map)
}

/// Writes a `[string multimap]`. Entry order on the wire is unspecified.
///
/// # Errors
///
/// Fails when the map holds more than 65 535 entries or any entry fails.
pub fn write_string_multimap(
	map: &HashMap<String, Vec<String>>,
	buf: &mut impl BufMut,
) -> Result<()> {
	let count = short_length(map.len(), "a map of no more than 65535 entries")?;

	buf.try_put_u16(count)?;

	for (key, values) in map {
		write_string(key, buf)?;
		write_string_list(values, buf)?;
	}

	Ok(())
}

/// The encoded size of a `[string multimap]`.
#[must_use]
pub fn string_multimap_size(map: &HashMap<String, Vec<String>>) -> usize {
	u16::WIRE_SIZE
		+ map
			.iter()
			.map(|(key, values)| string_size(key) + string_list_size(values))
			.sum::<usize>()
}

/// Reads a `[bytes map]`; values are nullable blobs.
///
/// # Errors
///
/// Fails when any entry fails.
pub fn read_bytes_map(buf: &mut impl Buf) -> Result<HashMap<String, Option<Vec<u8>>>> {
	let count = buf.try_get_u16().context("cannot read bytes map count")?;
	let mut map = HashMap::with_capacity(usize::from(count));

	for index in 0..count {
		let key = read_string(buf).with_context(|| format!("cannot read bytes map key {index}"))?;
		let value =
			read_bytes(buf).with_context(|| format!("cannot read bytes map value {index}"))?;

		map.insert(key, value);
	}

	Ok(map)
}

/// Writes a `[bytes map]`. Entry order on the wire is unspecified.
///
/// # Errors
///
/// Fails when the map holds more than 65 535 entries or any entry fails.
pub fn write_bytes_map(
	map: &HashMap<String, Option<Vec<u8>>>,
	buf: &mut impl BufMut,
) -> Result<()> {
	let count = short_length(map.len(), "a map of no more than 65535 entries")?;

	buf.try_put_u16(count)?;

	for (key, value) in map {
		write_string(key, buf)?;
		write_bytes(value.as_deref(), buf)?;
	}

	Ok(())
}

/// The encoded size of a `[bytes map]`.
#[must_use]
pub fn bytes_map_size(map: &HashMap<String, Option<Vec<u8>>>) -> usize {
	u16::WIRE_SIZE
		+ map
			.iter()
			.map(|(key, value)| string_size(key) + bytes_size(value.as_deref()))
			.sum::<usize>()
}

/// Reads a `[uuid]`: 16 raw bytes.
///
/// # Errors
///
/// Fails on a short buffer.
pub fn read_uuid(buf: &mut impl Buf) -> Result<Uuid> {
	let mut raw = [0; UUID_SIZE];
	buf.try_copy_to_slice(&mut raw)
		.context("cannot read uuid")?;

	Ok(Uuid::from_bytes(raw))
}

/// Writes a `[uuid]`.
///
/// # Errors
///
/// Fails on a writer out of capacity.
pub fn write_uuid(uuid: Uuid, buf: &mut impl BufMut) -> Result<()> {
	buf.try_put_slice(uuid.as_bytes())
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_string_round_trip() {
		let mut buf = Vec::new();
		write_string("CQL_VERSION", &mut buf).unwrap();

		assert_eq!(buf.len(), string_size("CQL_VERSION"));
		assert_eq!(&buf[..2], [0x00, 0x0B]);
		assert_eq!(read_string(&mut &buf[..]).unwrap(), "CQL_VERSION");
	}

	#[test]
	fn test_empty_string_is_representable() {
		let mut buf = Vec::new();
		write_string("", &mut buf).unwrap();

		assert_eq!(buf, [0x00, 0x00]);
		assert_eq!(read_string(&mut &buf[..]).unwrap(), "");
	}

	#[test]
	fn test_oversized_string_is_rejected() {
		let string = "x".repeat(usize::from(u16::MAX) + 1);
		let mut buf = Vec::new();

		assert!(matches!(
			write_string(&string, &mut buf).unwrap_err().kind(),
			cqlkit::ErrorKind::InvalidLength { .. }
		));
	}

	#[test]
	fn test_invalid_utf8_is_rejected() {
		let bytes = [0x00, 0x02, 0xC3, 0x28];

		assert!(read_string(&mut &bytes[..]).is_err());
	}

	#[test]
	fn test_long_string_rejects_negative_length() {
		let bytes = [0xFF, 0xFF, 0xFF, 0xFF];

		assert!(matches!(
			read_long_string(&mut &bytes[..]).unwrap_err().kind(),
			cqlkit::ErrorKind::InvalidLength { length: -1, .. }
		));
	}

	#[test]
	fn test_null_and_empty_blobs_are_distinct() {
		let mut null = Vec::new();
		write_bytes(None, &mut null).unwrap();
		let mut empty = Vec::new();
		write_bytes(Some(&[]), &mut empty).unwrap();

		assert_eq!(null, [0xFF, 0xFF, 0xFF, 0xFF]);
		assert_eq!(empty, [0x00, 0x00, 0x00, 0x00]);
		assert_eq!(read_bytes(&mut &null[..]).unwrap(), None);
		assert_eq!(read_bytes(&mut &empty[..]).unwrap(), Some(Vec::new()));
	}

	#[test]
	fn test_bytes_rejects_length_below_null() {
		let bytes = [0xFF, 0xFF, 0xFF, 0xFE];

		assert!(matches!(
			read_bytes(&mut &bytes[..]).unwrap_err().kind(),
			cqlkit::ErrorKind::InvalidLength { length: -2, .. }
		));
	}

	#[test]
	fn test_string_list_preserves_order() {
		let list = vec!["b".to_owned(), "a".to_owned(), "c".to_owned()];
		let mut buf = Vec::new();
		write_string_list(&list, &mut buf).unwrap();

		assert_eq!(buf.len(), string_list_size(&list));
		assert_eq!(read_string_list(&mut &buf[..]).unwrap(), list);
	}

	#[test]
	fn test_string_map_round_trip() {
		let map: HashMap<_, _> = [
			("CQL_VERSION".to_owned(), "3.0.0".to_owned()),
			("COMPRESSION".to_owned(), "lz4".to_owned()),
		]
		.into();
		let mut buf = Vec::new();
		write_string_map(&map, &mut buf).unwrap();

		assert_eq!(buf.len(), string_map_size(&map));
		assert_eq!(read_string_map(&mut &buf[..]).unwrap(), map);
	}

	#[test]
	fn test_string_multimap_round_trip() {
		let map: HashMap<_, _> = [(
			"COMPRESSION".to_owned(),
			vec!["lz4".to_owned(), "snappy".to_owned()],
		)]
		.into();
		let mut buf = Vec::new();
		write_string_multimap(&map, &mut buf).unwrap();

		assert_eq!(buf.len(), string_multimap_size(&map));
		assert_eq!(read_string_multimap(&mut &buf[..]).unwrap(), map);
	}

	#[test]
	fn test_bytes_map_round_trip_with_null_value() {
		let map: HashMap<_, _> = [
			("present".to_owned(), Some(vec![1, 2])),
			("absent".to_owned(), None),
		]
		.into();
		let mut buf = Vec::new();
		write_bytes_map(&map, &mut buf).unwrap();

		assert_eq!(buf.len(), bytes_map_size(&map));
		assert_eq!(read_bytes_map(&mut &buf[..]).unwrap(), map);
	}

	#[test]
	fn test_uuid_is_sixteen_raw_bytes() {
		let uuid = Uuid::parse_str("C0D1D21E-BB01-4196-86DB-BC317BC1796A").unwrap();
		let mut buf = Vec::new();
		write_uuid(uuid, &mut buf).unwrap();

		assert_eq!(buf.len(), UUID_SIZE);
		assert_eq!(read_uuid(&mut &buf[..]).unwrap(), uuid);
	}

	#[test]
	fn test_truncation_never_succeeds() {
		let mut buf = Vec::new();
		write_string("truncate me", &mut buf).unwrap();

		for cut in 0..buf.len() {
			assert!(read_string(&mut &buf[..cut]).is_err());
		}
	}
}
