// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The recursive codec for CQL schema type descriptors.
//!
//! A descriptor is a 2-byte type code followed by a code-specific body.
//! Collection, tuple, and user-defined types nest further descriptors, so
//! both directions recurse; the decode direction caps the nesting depth,
//! since the input is attacker-controlled.

use bytes::{Buf, BufMut};
use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	Result,
	ResultExt,
	WireSize,
};

use crate::primitive::{read_string, string_size, write_string};

/// Type codes as they appear on the wire.
mod code {
	pub const CUSTOM: u16 = 0x0000;
	pub const ASCII: u16 = 0x0001;
	pub const BIGINT: u16 = 0x0002;
	pub const BLOB: u16 = 0x0003;
	pub const BOOLEAN: u16 = 0x0004;
	pub const COUNTER: u16 = 0x0005;
	pub const DECIMAL: u16 = 0x0006;
	pub const DOUBLE: u16 = 0x0007;
	pub const FLOAT: u16 = 0x0008;
	pub const INT: u16 = 0x0009;
	pub const TIMESTAMP: u16 = 0x000B;
	pub const UUID: u16 = 0x000C;
	pub const VARCHAR: u16 = 0x000D;
	pub const VARINT: u16 = 0x000E;
	pub const TIMEUUID: u16 = 0x000F;
	pub const INET: u16 = 0x0010;
	pub const DATE: u16 = 0x0011;
	pub const TIME: u16 = 0x0012;
	pub const SMALLINT: u16 = 0x0013;
	pub const TINYINT: u16 = 0x0014;
	pub const DURATION: u16 = 0x0015;
	pub const LIST: u16 = 0x0020;
	pub const MAP: u16 = 0x0021;
	pub const SET: u16 = 0x0022;
	pub const UDT: u16 = 0x0030;
	pub const TUPLE: u16 = 0x0031;
}

// Bounds recursion on decode. Real schemas nest a handful of levels; an
// input deeper than this is hostile.
const MAX_DEPTH: usize = 64;

/// A user-defined type: keyspace, name, and ordered fields.
///
/// Field order is part of the type's identity and of its wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdtType {
	/// The keyspace the type is defined in.
	pub keyspace: String,
	/// The name of the type.
	pub name: String,
	/// The fields, in definition order.
	pub fields: Vec<(String, DataType)>,
}

/// A CQL schema type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DataType {
	/// An opaque server-side class, identified by name.
	Custom(String),
	Ascii,
	Bigint,
	Blob,
	Boolean,
	Counter,
	Decimal,
	Double,
	Float,
	Int,
	Timestamp,
	Uuid,
	Varchar,
	Varint,
	Timeuuid,
	Inet,
	Date,
	Time,
	Smallint,
	Tinyint,
	/// Only exists from protocol version 5 onwards.
	Duration,
	List(Box<DataType>),
	Set(Box<DataType>),
	Map(Box<DataType>, Box<DataType>),
	/// An anonymous tuple of up to 65 535 fields.
	Tuple(Vec<DataType>),
	Udt(UdtType),
}

impl From<UdtType> for DataType {
	fn from(udt: UdtType) -> Self {
		Self::Udt(udt)
	}
}

impl DataType {
	/// The 2-byte wire code for this descriptor.
	#[must_use]
	pub const fn code(&self) -> u16 {
		match self {
			Self::Custom(_) => code::CUSTOM,
			Self::Ascii => code::ASCII,
			Self::Bigint => code::BIGINT,
			Self::Blob => code::BLOB,
			Self::Boolean => code::BOOLEAN,
			Self::Counter => code::COUNTER,
			Self::Decimal => code::DECIMAL,
			Self::Double => code::DOUBLE,
			Self::Float => code::FLOAT,
			Self::Int => code::INT,
			Self::Timestamp => code::TIMESTAMP,
			Self::Uuid => code::UUID,
			Self::Varchar => code::VARCHAR,
			Self::Varint => code::VARINT,
			Self::Timeuuid => code::TIMEUUID,
			Self::Inet => code::INET,
			Self::Date => code::DATE,
			Self::Time => code::TIME,
			Self::Smallint => code::SMALLINT,
			Self::Tinyint => code::TINYINT,
			Self::Duration => code::DURATION,
			Self::List(_) => code::LIST,
			Self::Map(..) => code::MAP,
			Self::Set(_) => code::SET,
			Self::Udt(_) => code::UDT,
			Self::Tuple(_) => code::TUPLE,
		}
	}

	/// Decodes a descriptor.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::CodecNotFound`] on a reserved code, with
	/// [`ErrorKind::UnsupportedInVersion`] for `duration` before version
	/// 5, and with [`ErrorKind::InvalidLength`] when the nesting runs
	/// deeper than the codec is willing to follow.
	pub fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		Self::decode_at(buf, version, 0)
	}

	fn decode_at(buf: &mut impl Buf, version: ProtocolVersion, depth: usize) -> Result<Self> {
		if depth >= MAX_DEPTH {
			return Err(Error::new(ErrorKind::InvalidLength {
				length: depth as i64,
				expected: "type nesting of no more than 64 levels",
			}));
		}

		let type_code = buf.try_get_u16().context("cannot read data type code")?;

		Ok(match type_code {
			code::CUSTOM => {
				Self::Custom(read_string(buf).context("cannot read custom class name")?)
			},
			code::ASCII => Self::Ascii,
			code::BIGINT => Self::Bigint,
			code::BLOB => Self::Blob,
			code::BOOLEAN => Self::Boolean,
			code::COUNTER => Self::Counter,
			code::DECIMAL => Self::Decimal,
			code::DOUBLE => Self::Double,
			code::FLOAT => Self::Float,
			code::INT => Self::Int,
			code::TIMESTAMP => Self::Timestamp,
			code::UUID => Self::Uuid,
			code::VARCHAR => Self::Varchar,
			code::VARINT => Self::Varint,
			code::TIMEUUID => Self::Timeuuid,
			code::INET => Self::Inet,
			code::DATE => Self::Date,
			code::TIME => Self::Time,
			code::SMALLINT => Self::Smallint,
			code::TINYINT => Self::Tinyint,
			code::DURATION => {
				if version < ProtocolVersion::V5 {
					return Err(Error::new(ErrorKind::UnsupportedInVersion {
						version,
						feature: "the duration data type",
					}));
				}

				Self::Duration
			},
			code::LIST => Self::List(Box::new(
				Self::decode_at(buf, version, depth + 1)
					.context("cannot read list element type")?,
			)),
			code::SET => Self::Set(Box::new(
				Self::decode_at(buf, version, depth + 1).context("cannot read set element type")?,
			)),
			code::MAP => {
				let key = Self::decode_at(buf, version, depth + 1)
					.context("cannot read map key type")?;
				let value = Self::decode_at(buf, version, depth + 1)
					.context("cannot read map value type")?;

				Self::Map(Box::new(key), Box::new(value))
			},
			code::TUPLE => {
				let count = buf.try_get_u16().context("cannot read tuple field count")?;
				let mut fields = Vec::with_capacity(usize::from(count));

				for index in 0..count {
					fields.push(
						Self::decode_at(buf, version, depth + 1)
							.with_context(|| format!("cannot read tuple field {index} type"))?,
					);
				}

				Self::Tuple(fields)
			},
			code::UDT => {
				let keyspace = read_string(buf).context("cannot read UDT keyspace")?;
				let name = read_string(buf).context("cannot read UDT name")?;
				let count = buf.try_get_u16().context("cannot read UDT field count")?;
				let mut fields = Vec::with_capacity(usize::from(count));

				for index in 0..count {
					let field_name = read_string(buf)
						.with_context(|| format!("cannot read UDT field {index} name"))?;
					let field_type = Self::decode_at(buf, version, depth + 1)
						.with_context(|| format!("cannot read UDT field {index} type"))?;

					fields.push((field_name, field_type));
				}

				Self::Udt(UdtType {
					keyspace,
					name,
					fields,
				})
			},
			reserved => {
				return Err(Error::new(ErrorKind::CodecNotFound {
					version,
					what: format!("data type code {reserved:#06X}"),
				}))
			},
		})
	}

	/// Encodes this descriptor: the 2-byte code, then the code-specific
	/// body.
	///
	/// The bytes emitted always equal [`wire_size`](WireSize::wire_size).
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::UnsupportedInVersion`] for `duration`
	/// before version 5, with [`ErrorKind::InvalidLength`] for a tuple or
	/// UDT of more than 65 535 fields, and on a writer out of capacity.
	pub fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		if matches!(self, Self::Duration) && version < ProtocolVersion::V5 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "the duration data type",
			}));
		}

		buf.try_put_u16(self.code())?;

		match self {
			Self::Custom(class) => write_string(class, buf)?,
			Self::List(element) | Self::Set(element) => element.encode(buf, version)?,
			Self::Map(key, value) => {
				key.encode(buf, version)?;
				value.encode(buf, version)?;
			},
			Self::Tuple(fields) => {
				let count = u16::try_from(fields.len()).map_err(|_| {
					Error::new(ErrorKind::InvalidLength {
						length: fields.len() as i64,
						expected: "a tuple of no more than 65535 fields",
					})
				})?;

				buf.try_put_u16(count)?;

				for field in fields {
					field.encode(buf, version)?;
				}
			},
			Self::Udt(udt) => {
				write_string(&udt.keyspace, buf)?;
				write_string(&udt.name, buf)?;

				let count = u16::try_from(udt.fields.len()).map_err(|_| {
					Error::new(ErrorKind::InvalidLength {
						length: udt.fields.len() as i64,
						expected: "a UDT of no more than 65535 fields",
					})
				})?;

				buf.try_put_u16(count)?;

				for (field_name, field_type) in &udt.fields {
					write_string(field_name, buf)?;
					field_type.encode(buf, version)?;
				}
			},
			_ => {},
		}

		Ok(())
	}
}

impl WireSize for UdtType {
	fn wire_size(&self) -> usize {
		string_size(&self.keyspace)
			+ string_size(&self.name)
			+ u16::WIRE_SIZE
			+ self
				.fields
				.iter()
				.map(|(name, data_type)| string_size(name) + data_type.wire_size())
				.sum::<usize>()
	}
}

impl WireSize for DataType {
	fn wire_size(&self) -> usize {
		u16::WIRE_SIZE
			+ match self {
				Self::Custom(class) => string_size(class),
				Self::List(element) | Self::Set(element) => element.wire_size(),
				Self::Map(key, value) => key.wire_size() + value.wire_size(),
				Self::Tuple(fields) => u16::WIRE_SIZE + fields.wire_size(),
				Self::Udt(udt) => udt.wire_size(),
				_ => 0,
			}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	fn encoded(data_type: &DataType, version: ProtocolVersion) -> Vec<u8> {
		let mut buf = Vec::new();
		data_type.encode(&mut buf, version).unwrap();

		assert_eq!(buf.len(), data_type.wire_size());
		buf
	}

	#[test]
	fn test_list_of_varchar() {
		assert_eq!(
			encoded(&DataType::List(Box::new(DataType::Varchar)), V4),
			[0x00, 0x20, 0x00, 0x0D]
		);
	}

	#[test]
	fn test_round_trip_every_version() {
		let udt = DataType::from(UdtType {
			keyspace: "ks".to_owned(),
			name: "address".to_owned(),
			fields: vec![
				("street".to_owned(), DataType::Varchar),
				("zips".to_owned(), DataType::Set(Box::new(DataType::Int))),
			],
		});
		let types = [
			DataType::Ascii,
			DataType::Custom("org.apache.cassandra.db.marshal.BytesType".to_owned()),
			DataType::Map(Box::new(DataType::Uuid), Box::new(DataType::Blob)),
			DataType::Tuple(vec![DataType::Inet, DataType::Smallint]),
			udt,
		];

		for version in [V3, V4, V5] {
			for data_type in &types {
				let buf = encoded(data_type, version);

				assert_eq!(
					&DataType::decode(&mut &buf[..], version).unwrap(),
					data_type
				);
			}
		}
	}

	#[test]
	fn test_duration_is_v5_only() {
		let buf = encoded(&DataType::Duration, V5);
		assert_eq!(buf, [0x00, 0x15]);
		assert_eq!(
			DataType::decode(&mut &buf[..], V5).unwrap(),
			DataType::Duration
		);

		for version in [V3, V4] {
			let mut sink = Vec::new();
			assert!(matches!(
				DataType::Duration
					.encode(&mut sink, version)
					.unwrap_err()
					.kind(),
				ErrorKind::UnsupportedInVersion { .. }
			));
			assert!(matches!(
				DataType::decode(&mut &buf[..], version).unwrap_err().kind(),
				ErrorKind::UnsupportedInVersion { .. }
			));
		}
	}

	#[test]
	fn test_reserved_code_has_no_codec() {
		let buf = [0x00, 0x0A];

		assert!(matches!(
			DataType::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::CodecNotFound { .. }
		));
	}

	#[test]
	fn test_hostile_nesting_is_bounded() {
		// 65 list codes followed by nothing.
		let mut buf = Vec::new();
		for _ in 0..65 {
			buf.extend([0x00, 0x20]);
		}

		assert!(matches!(
			DataType::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::InvalidLength { .. }
		));
	}

	#[test]
	fn test_truncated_udt_names_the_field() {
		let udt = DataType::from(UdtType {
			keyspace: "ks".to_owned(),
			name: "t".to_owned(),
			fields: vec![
				("a".to_owned(), DataType::Int),
				("b".to_owned(), DataType::Varchar),
			],
		});
		let buf = encoded(&udt, V4);

		let error = DataType::decode(&mut &buf[..buf.len() - 1], V4).unwrap_err();

		assert!(error.to_string().contains("cannot read UDT field 1 type"));
		assert!(matches!(error.kind(), ErrorKind::ShortBuffer { .. }));
	}
}
