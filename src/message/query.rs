// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `QUERY` request and the query-options block.
//!
//! The options block is shared verbatim by `EXECUTE`. Its flags field is
//! one byte up to protocol version 4 and widens to four bytes in version
//! 5, where the two version-5-only options got the bits past the byte
//! boundary.

use bitflags::bitflags;
use bytes::{Buf, BufMut};
use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	Readable,
	Result,
	ResultExt,
	Writable,
};

use super::body_codec;
use crate::consistency::Consistency;
use crate::primitive::{
	bytes_size,
	long_string_size,
	named_values_size,
	positional_values_size,
	read_bytes,
	read_long_string,
	read_named_values,
	read_positional_values,
	read_string,
	string_size,
	write_bytes,
	write_long_string,
	write_named_values,
	write_positional_values,
	write_string,
};
use crate::value::Value;

bitflags! {
	/// The bits gating the optional trailing fields of a query-options
	/// block, in the order the fields appear.
	pub(crate) struct QueryFlags: u32 {
		const VALUES = 0x0001;
		const SKIP_METADATA = 0x0002;
		const PAGE_SIZE = 0x0004;
		const PAGING_STATE = 0x0008;
		const SERIAL_CONSISTENCY = 0x0010;
		const DEFAULT_TIMESTAMP = 0x0020;
		const NAMED_VALUES = 0x0040;
		const KEYSPACE = 0x0080;
		const NOW_IN_SECONDS = 0x0100;
	}
}

/// The values bound to a query, if any.
///
/// Named values only make sense for `QUERY`; prepared statements bind
/// positionally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryValues {
	/// No values.
	#[default]
	None,
	/// Values bound by position.
	Positional(Vec<Value>),
	/// Values bound by name, order preserved.
	Named(Vec<(String, Value)>),
}

/// Everything about a query besides its statement: consistency, bound
/// values, paging, timestamps.
///
/// Fields left `None` are absent on the wire and take their server-side
/// defaults - the serial consistency defaults to `SERIAL`, timestamp and
/// now-in-seconds to "let the server pick". The `keyspace` and
/// `now_in_seconds` options only exist from protocol version 5 onwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryOptions {
	/// The consistency level for the query.
	pub consistency: Consistency,
	/// The bound values.
	pub values: QueryValues,
	/// Ask the server to omit result metadata it knows the client has.
	pub skip_metadata: bool,
	/// The desired page size, in rows.
	pub page_size: Option<i32>,
	/// The paging state from a previous result page.
	pub paging_state: Option<Vec<u8>>,
	/// The consistency for the serial phase of conditional updates.
	pub serial_consistency: Option<Consistency>,
	/// The default timestamp, in microseconds.
	pub timestamp: Option<i64>,
	/// The keyspace to resolve unqualified names in. Version 5 onwards.
	pub keyspace: Option<String>,
	/// The "current time" for TTL computations. Version 5 onwards.
	pub now_in_seconds: Option<i32>,
}

impl QueryOptions {
	fn flags(&self) -> QueryFlags {
		let mut flags = QueryFlags::empty();

		match &self.values {
			QueryValues::None => {},
			QueryValues::Positional(values) => {
				if !values.is_empty() {
					flags |= QueryFlags::VALUES;
				}
			},
			QueryValues::Named(values) => {
				if !values.is_empty() {
					flags |= QueryFlags::VALUES | QueryFlags::NAMED_VALUES;
				}
			},
		}

		if self.skip_metadata {
			flags |= QueryFlags::SKIP_METADATA;
		}
		if self.page_size.is_some() {
			flags |= QueryFlags::PAGE_SIZE;
		}
		if self.paging_state.is_some() {
			flags |= QueryFlags::PAGING_STATE;
		}
		if self.serial_consistency.is_some() {
			flags |= QueryFlags::SERIAL_CONSISTENCY;
		}
		if self.timestamp.is_some() {
			flags |= QueryFlags::DEFAULT_TIMESTAMP;
		}
		if self.keyspace.is_some() {
			flags |= QueryFlags::KEYSPACE;
		}
		if self.now_in_seconds.is_some() {
			flags |= QueryFlags::NOW_IN_SECONDS;
		}

		flags
	}

	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		if version >= ProtocolVersion::V5 {
			return Ok(());
		}

		if self.keyspace.is_some() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "per-query keyspaces",
			}));
		}
		if self.now_in_seconds.is_some() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "the now-in-seconds option",
			}));
		}

		Ok(())
	}

	const fn flags_size(version: ProtocolVersion) -> usize {
		if matches!(version, ProtocolVersion::V5) {
			4
		} else {
			1
		}
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check_version(version)?;

		let mut size = Consistency::WIRE_SIZE + Self::flags_size(version);

		match &self.values {
			QueryValues::Positional(values) if !values.is_empty() => {
				size += positional_values_size(values);
			},
			QueryValues::Named(values) if !values.is_empty() => {
				size += named_values_size(values);
			},
			_ => {},
		}

		if self.page_size.is_some() {
			size += i32::WIRE_SIZE;
		}
		if let Some(state) = &self.paging_state {
			size += bytes_size(Some(state));
		}
		if self.serial_consistency.is_some() {
			size += Consistency::WIRE_SIZE;
		}
		if self.timestamp.is_some() {
			size += i64::WIRE_SIZE;
		}
		if let Some(keyspace) = &self.keyspace {
			size += string_size(keyspace);
		}
		if self.now_in_seconds.is_some() {
			size += i32::WIRE_SIZE;
		}

		Ok(size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		self.consistency.write_to(buf)?;

		let flags = self.flags();
		if version >= ProtocolVersion::V5 {
			buf.try_put_u32(flags.bits())?;
		} else {
			#[allow(clippy::cast_possible_truncation)]
			buf.try_put_u8(flags.bits() as u8)?;
		}

		match &self.values {
			QueryValues::Positional(values) if !values.is_empty() => {
				write_positional_values(values, buf, version)?;
			},
			QueryValues::Named(values) if !values.is_empty() => {
				write_named_values(values, buf, version)?;
			},
			_ => {},
		}

		if let Some(page_size) = self.page_size {
			buf.try_put_i32(page_size)?;
		}
		if let Some(state) = &self.paging_state {
			write_bytes(Some(state), buf)?;
		}
		if let Some(serial) = self.serial_consistency {
			serial.write_to(buf)?;
		}
		if let Some(timestamp) = self.timestamp {
			buf.try_put_i64(timestamp)?;
		}
		if let Some(keyspace) = &self.keyspace {
			write_string(keyspace, buf)?;
		}
		if let Some(now) = self.now_in_seconds {
			buf.try_put_i32(now)?;
		}

		Ok(())
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let consistency = Consistency::read_from(buf).context("cannot read consistency")?;

		let bits = if version >= ProtocolVersion::V5 {
			buf.try_get_u32().context("cannot read query flags")?
		} else {
			u32::from(buf.try_get_u8().context("cannot read query flags")?)
		};
		let flags = QueryFlags::from_bits_truncate(bits);

		let values = if flags.contains(QueryFlags::VALUES) {
			if flags.contains(QueryFlags::NAMED_VALUES) {
				QueryValues::Named(
					read_named_values(buf, version).context("cannot read named values")?,
				)
			} else {
				QueryValues::Positional(
					read_positional_values(buf, version).context("cannot read values")?,
				)
			}
		} else {
			QueryValues::None
		};

		let page_size = flags
			.contains(QueryFlags::PAGE_SIZE)
			.then(|| buf.try_get_i32().context("cannot read page size"))
			.transpose()?;
		let paging_state = if flags.contains(QueryFlags::PAGING_STATE) {
			read_bytes(buf).context("cannot read paging state")?
		} else {
			None
		};
		let serial_consistency = flags
			.contains(QueryFlags::SERIAL_CONSISTENCY)
			.then(|| Consistency::read_from(buf).context("cannot read serial consistency"))
			.transpose()?;
		let timestamp = flags
			.contains(QueryFlags::DEFAULT_TIMESTAMP)
			.then(|| buf.try_get_i64().context("cannot read default timestamp"))
			.transpose()?;

		let keyspace = if flags.contains(QueryFlags::KEYSPACE) {
			if version < ProtocolVersion::V5 {
				return Err(Error::new(ErrorKind::UnsupportedInVersion {
					version,
					feature: "per-query keyspaces",
				}));
			}

			Some(read_string(buf).context("cannot read query keyspace")?)
		} else {
			None
		};
		let now_in_seconds = if flags.contains(QueryFlags::NOW_IN_SECONDS) {
			if version < ProtocolVersion::V5 {
				return Err(Error::new(ErrorKind::UnsupportedInVersion {
					version,
					feature: "the now-in-seconds option",
				}));
			}

			Some(buf.try_get_i32().context("cannot read now-in-seconds")?)
		} else {
			None
		};

		Ok(Self {
			consistency,
			values,
			skip_metadata: flags.contains(QueryFlags::SKIP_METADATA),
			page_size,
			paging_state,
			serial_consistency,
			timestamp,
			keyspace,
			now_in_seconds,
		})
	}
}

/// Performs a CQL query. The body is the statement as a `[long string]`
/// followed by the query-options block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	/// The CQL statement.
	pub query: String,
	/// The query options.
	pub options: QueryOptions,
}

impl Query {
	/// A query with default options.
	#[must_use]
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			options: QueryOptions::default(),
		}
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		Ok(long_string_size(&self.query) + self.options.encoded_size(version)?)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		write_long_string(&self.query, buf).context("cannot write query statement")?;
		self.options.encode(buf, version)
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		Ok(Self {
			query: read_long_string(buf).context("cannot read query statement")?,
			options: QueryOptions::decode(buf, version)?,
		})
	}
}

body_codec! {
	/// Codec for [`Query`].
	QueryCodec, Query, Query
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	fn full_options(version: ProtocolVersion) -> QueryOptions {
		QueryOptions {
			consistency: Consistency::Quorum,
			values: QueryValues::Positional(vec![
				Value::Regular(vec![0, 0, 0, 1]),
				Value::Null,
			]),
			skip_metadata: true,
			page_size: Some(5000),
			paging_state: Some(vec![0xCA, 0xFE]),
			serial_consistency: Some(Consistency::LocalSerial),
			timestamp: Some(1_234_567_890),
			keyspace: (version >= V5).then(|| "ks".to_owned()),
			now_in_seconds: (version >= V5).then_some(86_400),
		}
	}

	#[test]
	fn test_options_round_trip_every_version() {
		for version in [V3, V4, V5] {
			let options = full_options(version);
			let mut buf = Vec::new();
			options.encode(&mut buf, version).unwrap();

			assert_eq!(buf.len(), options.encoded_size(version).unwrap());
			assert_eq!(QueryOptions::decode(&mut &buf[..], version).unwrap(), options);
		}
	}

	#[test]
	fn test_flags_width_depends_on_version() {
		let options = QueryOptions::default();

		// Consistency plus one flags byte...
		assert_eq!(options.encoded_size(V4).unwrap(), 3);
		// ...or four flags bytes on v5.
		assert_eq!(options.encoded_size(V5).unwrap(), 6);
	}

	#[test]
	fn test_named_values_round_trip() {
		let query = Query {
			query: "UPDATE t SET v = :v WHERE k = :k".to_owned(),
			options: QueryOptions {
				values: QueryValues::Named(vec![
					("v".to_owned(), Value::Regular(vec![7])),
					("k".to_owned(), Value::Unset),
				]),
				..QueryOptions::default()
			},
		};
		let mut buf = Vec::new();
		query.encode(&mut buf, V4).unwrap();

		assert_eq!(buf.len(), query.encoded_size(V4).unwrap());
		assert_eq!(Query::decode(&mut &buf[..], V4).unwrap(), query);
	}

	#[test]
	fn test_version_five_options_are_gated() {
		let options = QueryOptions {
			keyspace: Some("ks".to_owned()),
			..QueryOptions::default()
		};

		let mut buf = Vec::new();
		assert!(matches!(
			options.encode(&mut buf, V4).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion {
				feature: "per-query keyspaces",
				..
			}
		));
	}

	#[test]
	fn test_empty_positional_values_write_no_flag() {
		let options = QueryOptions {
			values: QueryValues::Positional(Vec::new()),
			..QueryOptions::default()
		};
		let mut buf = Vec::new();
		options.encode(&mut buf, V4).unwrap();

		// Consistency, then a zero flags byte.
		assert_eq!(buf, [0x00, 0x01, 0x00]);
	}
}
