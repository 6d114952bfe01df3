// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The consistency level carried by queries, batches, and error bodies.

use std::fmt;

use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	Readable,
	Result,
	Writable,
	WireSize,
};

/// A consistency level, serialized as an unsigned 16-bit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Consistency {
	Any = 0x0000,
	One = 0x0001,
	Two = 0x0002,
	Three = 0x0003,
	Quorum = 0x0004,
	All = 0x0005,
	LocalQuorum = 0x0006,
	EachQuorum = 0x0007,
	Serial = 0x0008,
	LocalSerial = 0x0009,
	LocalOne = 0x000A,
}

impl Consistency {
	/// The wire code for this level.
	#[must_use]
	pub const fn code(self) -> u16 {
		self as u16
	}

	/// The protocol's name for this level.
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Any => "ANY",
			Self::One => "ONE",
			Self::Two => "TWO",
			Self::Three => "THREE",
			Self::Quorum => "QUORUM",
			Self::All => "ALL",
			Self::LocalQuorum => "LOCAL_QUORUM",
			Self::EachQuorum => "EACH_QUORUM",
			Self::Serial => "SERIAL",
			Self::LocalSerial => "LOCAL_SERIAL",
			Self::LocalOne => "LOCAL_ONE",
		}
	}
}

impl Default for Consistency {
	fn default() -> Self {
		Self::One
	}
}

impl TryFrom<u16> for Consistency {
	type Error = Error;

	fn try_from(code: u16) -> Result<Self> {
		Ok(match code {
			0x0000 => Self::Any,
			0x0001 => Self::One,
			0x0002 => Self::Two,
			0x0003 => Self::Three,
			0x0004 => Self::Quorum,
			0x0005 => Self::All,
			0x0006 => Self::LocalQuorum,
			0x0007 => Self::EachQuorum,
			0x0008 => Self::Serial,
			0x0009 => Self::LocalSerial,
			0x000A => Self::LocalOne,
			other => {
				return Err(Error::new(ErrorKind::UnknownTag {
					kind: "consistency level",
					tag: format!("{other:#06X}"),
				}))
			},
		})
	}
}

impl fmt::Display for Consistency {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl ConstantWireSize for Consistency {
	const WIRE_SIZE: usize = 2;
}

impl WireSize for Consistency {
	fn wire_size(&self) -> usize {
		Self::WIRE_SIZE
	}
}

impl Readable for Consistency {
	fn read_from(reader: &mut impl bytes::Buf) -> Result<Self> {
		Self::try_from(reader.try_get_u16()?)
	}
}

impl Writable for Consistency {
	fn write_to(&self, writer: &mut impl bytes::BufMut) -> Result<()> {
		writer.try_put_u16(self.code())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_codes_round_trip() {
		for code in 0x0000..=0x000A_u16 {
			let level = Consistency::try_from(code).unwrap();
			assert_eq!(level.code(), code);
		}
	}

	#[test]
	fn test_unknown_code_is_rejected() {
		assert!(matches!(
			Consistency::try_from(0x000B).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "consistency level",
				..
			}
		));
	}

	#[test]
	fn test_wire_round_trip() {
		let mut buf = Vec::new();
		Consistency::LocalQuorum.write_to(&mut buf).unwrap();

		assert_eq!(buf, [0x00, 0x06]);
		assert_eq!(
			Consistency::read_from(&mut &buf[..]).unwrap(),
			Consistency::LocalQuorum
		);
	}
}
