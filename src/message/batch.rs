// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `BATCH` request.

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
use super::query::QueryFlags;
use crate::consistency::Consistency;
use crate::primitive::{
	long_string_size,
	positional_values_size,
	read_long_string,
	read_positional_values,
	read_short_bytes,
	read_string,
	short_bytes_size,
	string_size,
	write_long_string,
	write_positional_values,
	write_short_bytes,
	write_string,
};
use crate::value::Value;

const QUERY_KIND: u8 = 0;
const PREPARED_KIND: u8 = 1;

/// How the queries of a batch are applied together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatchType {
	/// Atomic through the batch log.
	Logged = 0,
	/// No batch log; no atomicity guarantee.
	Unlogged = 1,
	/// For counter updates, which are not idempotent.
	Counter = 2,
}

impl TryFrom<u8> for BatchType {
	type Error = Error;

	fn try_from(byte: u8) -> Result<Self> {
		match byte {
			0 => Ok(Self::Logged),
			1 => Ok(Self::Unlogged),
			2 => Ok(Self::Counter),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "batch type",
				tag: other.to_string(),
			})),
		}
	}
}

/// One statement of a batch: a raw query or a prepared statement id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatement {
	/// A CQL statement, as a `[long string]`.
	Query(String),
	/// A prepared statement id, as `[short bytes]`.
	Prepared(Vec<u8>),
}

/// One entry of a batch: a statement and its positionally bound values.
///
/// The wire reserves room for named values here, but no server released
/// so far accepts them in batches, so they are not modeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQuery {
	/// The statement.
	pub statement: BatchStatement,
	/// The bound values, by position.
	pub values: Vec<Value>,
}

/// Applies a set of modification statements together. The shared options
/// tail mirrors the query-options block, minus paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
	/// How the batch is applied.
	pub batch_type: BatchType,
	/// The statements and their values.
	pub queries: Vec<BatchQuery>,
	/// The consistency level.
	pub consistency: Consistency,
	/// The consistency for the serial phase of conditional updates.
	pub serial_consistency: Option<Consistency>,
	/// The default timestamp, in microseconds.
	pub timestamp: Option<i64>,
	/// The keyspace to resolve unqualified names in. Version 5 onwards.
	pub keyspace: Option<String>,
	/// The "current time" for TTL computations. Version 5 onwards.
	pub now_in_seconds: Option<i32>,
}

impl Batch {
	fn flags(&self) -> QueryFlags {
		let mut flags = QueryFlags::empty();

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
				feature: "per-batch keyspaces",
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

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check_version(version)?;

		let mut size = u8::WIRE_SIZE + u16::WIRE_SIZE;

		for query in &self.queries {
			size += u8::WIRE_SIZE
				+ match &query.statement {
					BatchStatement::Query(statement) => long_string_size(statement),
					BatchStatement::Prepared(id) => short_bytes_size(id),
				} + positional_values_size(&query.values);
		}

		size += Consistency::WIRE_SIZE;
		size += if version >= ProtocolVersion::V5 { 4 } else { 1 };

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

		buf.try_put_u8(self.batch_type as u8)?;

		let count = u16::try_from(self.queries.len()).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: self.queries.len() as i64,
				expected: "a batch of no more than 65535 queries",
			})
		})?;
		buf.try_put_u16(count)?;

		for (index, query) in self.queries.iter().enumerate() {
			match &query.statement {
				BatchStatement::Query(statement) => {
					buf.try_put_u8(QUERY_KIND)?;
					write_long_string(statement, buf)
						.with_context(|| format!("cannot write batch statement {index}"))?;
				},
				BatchStatement::Prepared(id) => {
					buf.try_put_u8(PREPARED_KIND)?;
					write_short_bytes(id, buf)
						.with_context(|| format!("cannot write batch statement {index} id"))?;
				},
			}

			write_positional_values(&query.values, buf, version)
				.with_context(|| format!("cannot write batch statement {index} values"))?;
		}

		self.consistency.write_to(buf)?;

		let flags = self.flags();
		if version >= ProtocolVersion::V5 {
			buf.try_put_u32(flags.bits())?;
		} else {
			#[allow(clippy::cast_possible_truncation)]
			buf.try_put_u8(flags.bits() as u8)?;
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
		let batch_type = BatchType::try_from(
			buf.try_get_u8().context("cannot read batch type")?,
		)?;

		let count = buf.try_get_u16().context("cannot read batch query count")?;
		let mut queries = Vec::with_capacity(usize::from(count));

		for index in 0..count {
			let kind = buf
				.try_get_u8()
				.with_context(|| format!("cannot read batch statement {index} kind"))?;
			let statement = match kind {
				QUERY_KIND => BatchStatement::Query(
					read_long_string(buf)
						.with_context(|| format!("cannot read batch statement {index}"))?,
				),
				PREPARED_KIND => BatchStatement::Prepared(
					read_short_bytes(buf)
						.with_context(|| format!("cannot read batch statement {index} id"))?,
				),
				other => {
					return Err(Error::new(ErrorKind::UnknownTag {
						kind: "batch statement kind",
						tag: other.to_string(),
					}))
				},
			};
			let values = read_positional_values(buf, version)
				.with_context(|| format!("cannot read batch statement {index} values"))?;

			queries.push(BatchQuery { statement, values });
		}

		let consistency = Consistency::read_from(buf).context("cannot read batch consistency")?;

		let bits = if version >= ProtocolVersion::V5 {
			buf.try_get_u32().context("cannot read batch flags")?
		} else {
			u32::from(buf.try_get_u8().context("cannot read batch flags")?)
		};
		let flags = QueryFlags::from_bits_truncate(bits);

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
					feature: "per-batch keyspaces",
				}));
			}

			Some(read_string(buf).context("cannot read batch keyspace")?)
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
			batch_type,
			queries,
			consistency,
			serial_consistency,
			timestamp,
			keyspace,
			now_in_seconds,
		})
	}
}

body_codec! {
	/// Codec for [`Batch`].
	BatchCodec, Batch, Batch
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	fn batch(version: ProtocolVersion) -> Batch {
		Batch {
			batch_type: BatchType::Logged,
			queries: vec![
				BatchQuery {
					statement: BatchStatement::Query(
						"INSERT INTO t (k, v) VALUES (?, ?)".to_owned(),
					),
					values: vec![Value::Regular(vec![1]), Value::Regular(vec![2])],
				},
				BatchQuery {
					statement: BatchStatement::Prepared(vec![0xAB; 16]),
					values: vec![Value::Null],
				},
			],
			consistency: Consistency::Quorum,
			serial_consistency: Some(Consistency::Serial),
			timestamp: Some(1_234_567_890),
			keyspace: (version >= V5).then(|| "ks".to_owned()),
			now_in_seconds: None,
		}
	}

	#[test]
	fn test_round_trip_every_version() {
		for version in [V3, V4, V5] {
			let batch = batch(version);
			let mut buf = Vec::new();
			batch.encode(&mut buf, version).unwrap();

			assert_eq!(buf.len(), batch.encoded_size(version).unwrap());
			assert_eq!(Batch::decode(&mut &buf[..], version).unwrap(), batch);
		}
	}

	#[test]
	fn test_unknown_batch_type_is_rejected() {
		let buf = [0x03, 0x00, 0x00];

		assert!(matches!(
			Batch::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "batch type",
				..
			}
		));
	}

	#[test]
	fn test_unset_values_follow_the_version_gate() {
		let batch = Batch {
			queries: vec![BatchQuery {
				statement: BatchStatement::Query("UPDATE t SET v = ? WHERE k = 1".to_owned()),
				values: vec![Value::Unset],
			}],
			..batch(V3)
		};
		let mut buf = Vec::new();

		assert!(matches!(
			batch.encode(&mut buf, V3).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
	}
}
