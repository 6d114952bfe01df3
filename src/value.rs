// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The three-state value cell bound to queries and batches.
//!
//! A cell is `NULL`, `UNSET`, or a regular blob of bytes - and the three
//! must not be conflated: `NULL` writes a tombstone, `UNSET` leaves the
//! column alone, and an empty blob is a value like any other. The wire
//! spells the first two as the negative length sentinels `-1` and `-2`.

use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	ReadableWithContext,
	Result,
	WireSize,
	WritableWithContext,
};

const NULL_LENGTH: i32 = -1;
const UNSET_LENGTH: i32 = -2;

/// A single value cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	/// An explicit `NULL`.
	Null,
	/// A value intentionally left unbound. Only exists from protocol
	/// version 4 onwards.
	Unset,
	/// A regular value, as the raw bytes of its serialized form.
	Regular(Vec<u8>),
}

impl From<Vec<u8>> for Value {
	fn from(content: Vec<u8>) -> Self {
		Self::Regular(content)
	}
}

impl WireSize for Value {
	fn wire_size(&self) -> usize {
		match self {
			Self::Null | Self::Unset => i32::WIRE_SIZE,
			Self::Regular(content) => i32::WIRE_SIZE + content.len(),
		}
	}
}

impl ReadableWithContext for Value {
	type Context = ProtocolVersion;

	fn read_with(reader: &mut impl bytes::Buf, version: &ProtocolVersion) -> Result<Self> {
		let length = reader.try_get_i32()?;

		match length {
			NULL_LENGTH => Ok(Self::Null),
			UNSET_LENGTH if *version >= ProtocolVersion::V4 => Ok(Self::Unset),
			UNSET_LENGTH => Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: *version,
				feature: "unset values",
			})),
			negative if negative < 0 => Err(Error::new(ErrorKind::InvalidLength {
				length: i64::from(negative),
				expected: "a value length of -2, -1, or greater",
			})),
			_ => {
				#[allow(clippy::cast_sign_loss)]
				let content = reader.try_copy_to_vec(length as usize)?;

				Ok(Self::Regular(content))
			},
		}
	}
}

impl WritableWithContext for Value {
	type Context = ProtocolVersion;

	fn write_with(&self, writer: &mut impl bytes::BufMut, version: &ProtocolVersion) -> Result<()> {
		match self {
			Self::Null => writer.try_put_i32(NULL_LENGTH),
			Self::Unset if *version >= ProtocolVersion::V4 => writer.try_put_i32(UNSET_LENGTH),
			Self::Unset => Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: *version,
				feature: "unset values",
			})),
			Self::Regular(content) => {
				let length = i32::try_from(content.len()).map_err(|_| {
					Error::new(ErrorKind::InvalidLength {
						length: content.len() as i64,
						expected: "a value no longer than 2147483647 bytes",
					})
				})?;

				writer.try_put_i32(length)?;
				writer.try_put_slice(content)
			},
		}
	}
}
