// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `ERROR` response.
//!
//! Every error body starts with a 32-bit code and a `[string]` message;
//! some codes append details of their own. The read and write failure
//! bodies changed shape in protocol version 5: the bare failure count
//! was replaced by a reason map from replica address to failure code.

use std::fmt;
use std::net::IpAddr;

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
	read_reason_map,
	read_short_bytes,
	read_string,
	read_string_list,
	reason_map_size,
	short_bytes_size,
	string_list_size,
	string_size,
	write_reason_map,
	write_short_bytes,
	write_string,
	write_string_list,
};

/// Error codes as they appear on the wire.
mod code {
	pub const SERVER: i32 = 0x0000;
	pub const PROTOCOL: i32 = 0x000A;
	pub const AUTHENTICATION: i32 = 0x0100;
	pub const UNAVAILABLE: i32 = 0x1000;
	pub const OVERLOADED: i32 = 0x1001;
	pub const IS_BOOTSTRAPPING: i32 = 0x1002;
	pub const TRUNCATE: i32 = 0x1003;
	pub const WRITE_TIMEOUT: i32 = 0x1100;
	pub const READ_TIMEOUT: i32 = 0x1200;
	pub const READ_FAILURE: i32 = 0x1300;
	pub const FUNCTION_FAILURE: i32 = 0x1400;
	pub const WRITE_FAILURE: i32 = 0x1500;
	pub const SYNTAX: i32 = 0x2000;
	pub const UNAUTHORIZED: i32 = 0x2100;
	pub const INVALID: i32 = 0x2200;
	pub const CONFIG: i32 = 0x2300;
	pub const ALREADY_EXISTS: i32 = 0x2400;
	pub const UNPREPARED: i32 = 0x2500;
}

/// The kind of write a timeout or failure happened during.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum WriteType {
	Simple,
	Batch,
	UnloggedBatch,
	Counter,
	BatchLog,
	View,
	Cdc,
}

impl WriteType {
	const fn as_str(self) -> &'static str {
		match self {
			Self::Simple => "SIMPLE",
			Self::Batch => "BATCH",
			Self::UnloggedBatch => "UNLOGGED_BATCH",
			Self::Counter => "COUNTER",
			Self::BatchLog => "BATCH_LOG",
			Self::View => "VIEW",
			Self::Cdc => "CDC",
		}
	}

	fn from_wire(name: &str) -> Result<Self> {
		match name {
			"SIMPLE" => Ok(Self::Simple),
			"BATCH" => Ok(Self::Batch),
			"UNLOGGED_BATCH" => Ok(Self::UnloggedBatch),
			"COUNTER" => Ok(Self::Counter),
			"BATCH_LOG" => Ok(Self::BatchLog),
			"VIEW" => Ok(Self::View),
			"CDC" => Ok(Self::Cdc),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "write type",
				tag: other.to_owned(),
			})),
		}
	}
}

impl fmt::Display for WriteType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Which replicas failed, in the shape the version dictates.
///
/// Protocol versions 3 and 4 only carry a count; version 5 carries the
/// reason map. Encoding the form that does not belong to the version
/// fails rather than converting silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReasons {
	/// How many replicas failed. Versions 3 and 4.
	Count(i32),
	/// Each failed replica and its 16-bit failure code. Version 5.
	PerEndpoint(Vec<(IpAddr, u16)>),
}

impl FailureReasons {
	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		match self {
			Self::Count(_) if version >= ProtocolVersion::V5 => {
				Err(Error::new(ErrorKind::UnsupportedInVersion {
					version,
					feature: "bare failure counts",
				}))
			},
			Self::PerEndpoint(_) if version < ProtocolVersion::V5 => {
				Err(Error::new(ErrorKind::UnsupportedInVersion {
					version,
					feature: "failure reason maps",
				}))
			},
			_ => Ok(()),
		}
	}

	fn size(&self) -> usize {
		match self {
			Self::Count(_) => i32::WIRE_SIZE,
			Self::PerEndpoint(reasons) => reason_map_size(reasons),
		}
	}

	fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		match self {
			Self::Count(count) => buf.try_put_i32(*count),
			Self::PerEndpoint(reasons) => write_reason_map(reasons, buf),
		}
	}

	fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		if version >= ProtocolVersion::V5 {
			Ok(Self::PerEndpoint(
				read_reason_map(buf).context("cannot read failure reasons")?,
			))
		} else {
			Ok(Self::Count(
				buf.try_get_i32().context("cannot read failure count")?,
			))
		}
	}
}

/// The code-specific tail of an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetails {
	/// Something unexpected happened server-side.
	Server,
	/// The frame violated the protocol.
	Protocol,
	/// Authentication failed.
	Authentication,
	/// Not enough live replicas for the consistency level.
	Unavailable {
		/// The consistency level of the query.
		consistency: Consistency,
		/// How many replicas the level requires.
		required: i32,
		/// How many were alive.
		alive: i32,
	},
	/// The coordinator is shedding load.
	Overloaded,
	/// The coordinator was still bootstrapping.
	IsBootstrapping,
	/// A truncation failed.
	Truncate,
	/// Not enough replicas answered a write in time.
	WriteTimeout {
		/// The consistency level of the write.
		consistency: Consistency,
		/// How many replicas acknowledged.
		received: i32,
		/// How many the level required.
		block_for: i32,
		/// What kind of write it was.
		write_type: WriteType,
	},
	/// Not enough replicas answered a read in time.
	ReadTimeout {
		/// The consistency level of the read.
		consistency: Consistency,
		/// How many replicas answered.
		received: i32,
		/// How many the level required.
		block_for: i32,
		/// Whether the replica asked for data answered.
		data_present: bool,
	},
	/// A replica failed (rather than timed out) during a read.
	ReadFailure {
		/// The consistency level of the read.
		consistency: Consistency,
		/// How many replicas answered.
		received: i32,
		/// How many the level required.
		block_for: i32,
		/// Which replicas failed.
		reasons: FailureReasons,
		/// Whether the replica asked for data answered.
		data_present: bool,
	},
	/// A user-defined function failed.
	FunctionFailure {
		/// The keyspace of the function.
		keyspace: String,
		/// The function name.
		function: String,
		/// The CQL names of the argument types.
		arg_types: Vec<String>,
	},
	/// A replica failed (rather than timed out) during a write.
	WriteFailure {
		/// The consistency level of the write.
		consistency: Consistency,
		/// How many replicas acknowledged.
		received: i32,
		/// How many the level required.
		block_for: i32,
		/// Which replicas failed.
		reasons: FailureReasons,
		/// What kind of write it was.
		write_type: WriteType,
	},
	/// The query could not be parsed.
	Syntax,
	/// The user is not authorized for the operation.
	Unauthorized,
	/// The query was syntactically correct but invalid.
	Invalid,
	/// The query was invalid because of a configuration issue.
	Config,
	/// The keyspace or table to create already exists.
	AlreadyExists {
		/// The keyspace.
		keyspace: String,
		/// The table, or empty for a keyspace creation.
		table: String,
	},
	/// The prepared statement id is unknown to the coordinator.
	Unprepared {
		/// The unknown id.
		id: Vec<u8>,
	},
}

/// A server-side error. The body is the 32-bit code, the message, then
/// code-specific details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlError {
	/// The human-readable message.
	pub message: String,
	/// The code-specific details.
	pub details: ErrorDetails,
}

impl CqlError {
	/// The wire code for this error.
	#[must_use]
	pub const fn code(&self) -> i32 {
		match &self.details {
			ErrorDetails::Server => code::SERVER,
			ErrorDetails::Protocol => code::PROTOCOL,
			ErrorDetails::Authentication => code::AUTHENTICATION,
			ErrorDetails::Unavailable { .. } => code::UNAVAILABLE,
			ErrorDetails::Overloaded => code::OVERLOADED,
			ErrorDetails::IsBootstrapping => code::IS_BOOTSTRAPPING,
			ErrorDetails::Truncate => code::TRUNCATE,
			ErrorDetails::WriteTimeout { .. } => code::WRITE_TIMEOUT,
			ErrorDetails::ReadTimeout { .. } => code::READ_TIMEOUT,
			ErrorDetails::ReadFailure { .. } => code::READ_FAILURE,
			ErrorDetails::FunctionFailure { .. } => code::FUNCTION_FAILURE,
			ErrorDetails::WriteFailure { .. } => code::WRITE_FAILURE,
			ErrorDetails::Syntax => code::SYNTAX,
			ErrorDetails::Unauthorized => code::UNAUTHORIZED,
			ErrorDetails::Invalid => code::INVALID,
			ErrorDetails::Config => code::CONFIG,
			ErrorDetails::AlreadyExists { .. } => code::ALREADY_EXISTS,
			ErrorDetails::Unprepared { .. } => code::UNPREPARED,
		}
	}

	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		let gated = matches!(self.details, ErrorDetails::FunctionFailure { .. });

		if gated && version < ProtocolVersion::V4 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "function failure errors",
			}));
		}

		Ok(())
	}

	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		let details_size = match &self.details {
			ErrorDetails::Unavailable { .. } => {
				Consistency::WIRE_SIZE + 2 * i32::WIRE_SIZE
			},
			ErrorDetails::WriteTimeout { write_type, .. } => {
				Consistency::WIRE_SIZE + 2 * i32::WIRE_SIZE + string_size(write_type.as_str())
			},
			ErrorDetails::ReadTimeout { .. } => {
				Consistency::WIRE_SIZE + 2 * i32::WIRE_SIZE + u8::WIRE_SIZE
			},
			ErrorDetails::ReadFailure { reasons, .. } => {
				Consistency::WIRE_SIZE + 2 * i32::WIRE_SIZE + reasons.size() + u8::WIRE_SIZE
			},
			ErrorDetails::WriteFailure {
				reasons,
				write_type,
				..
			} => {
				Consistency::WIRE_SIZE
					+ 2 * i32::WIRE_SIZE
					+ reasons.size()
					+ string_size(write_type.as_str())
			},
			ErrorDetails::FunctionFailure {
				keyspace,
				function,
				arg_types,
			} => string_size(keyspace) + string_size(function) + string_list_size(arg_types),
			ErrorDetails::AlreadyExists { keyspace, table } => {
				string_size(keyspace) + string_size(table)
			},
			ErrorDetails::Unprepared { id } => short_bytes_size(id),
			_ => 0,
		};

		Ok(i32::WIRE_SIZE + string_size(&self.message) + details_size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		buf.try_put_i32(self.code())?;
		write_string(&self.message, buf).context("cannot write error message")?;

		match &self.details {
			ErrorDetails::Unavailable {
				consistency,
				required,
				alive,
			} => {
				consistency.write_to(buf)?;
				buf.try_put_i32(*required)?;
				buf.try_put_i32(*alive)
			},
			ErrorDetails::WriteTimeout {
				consistency,
				received,
				block_for,
				write_type,
			} => {
				consistency.write_to(buf)?;
				buf.try_put_i32(*received)?;
				buf.try_put_i32(*block_for)?;
				write_string(write_type.as_str(), buf)
			},
			ErrorDetails::ReadTimeout {
				consistency,
				received,
				block_for,
				data_present,
			} => {
				consistency.write_to(buf)?;
				buf.try_put_i32(*received)?;
				buf.try_put_i32(*block_for)?;
				buf.try_put_u8(u8::from(*data_present))
			},
			ErrorDetails::ReadFailure {
				consistency,
				received,
				block_for,
				reasons,
				data_present,
			} => {
				consistency.write_to(buf)?;
				buf.try_put_i32(*received)?;
				buf.try_put_i32(*block_for)?;
				reasons.encode(buf, version)?;
				buf.try_put_u8(u8::from(*data_present))
			},
			ErrorDetails::WriteFailure {
				consistency,
				received,
				block_for,
				reasons,
				write_type,
			} => {
				consistency.write_to(buf)?;
				buf.try_put_i32(*received)?;
				buf.try_put_i32(*block_for)?;
				reasons.encode(buf, version)?;
				write_string(write_type.as_str(), buf)
			},
			ErrorDetails::FunctionFailure {
				keyspace,
				function,
				arg_types,
			} => {
				write_string(keyspace, buf)?;
				write_string(function, buf)?;
				write_string_list(arg_types, buf)
			},
			ErrorDetails::AlreadyExists { keyspace, table } => {
				write_string(keyspace, buf)?;
				write_string(table, buf)
			},
			ErrorDetails::Unprepared { id } => write_short_bytes(id, buf),
			_ => Ok(()),
		}
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let error_code = buf.try_get_i32().context("cannot read error code")?;
		let message = read_string(buf).context("cannot read error message")?;

		let details = match error_code {
			code::SERVER => ErrorDetails::Server,
			code::PROTOCOL => ErrorDetails::Protocol,
			code::AUTHENTICATION => ErrorDetails::Authentication,
			code::OVERLOADED => ErrorDetails::Overloaded,
			code::IS_BOOTSTRAPPING => ErrorDetails::IsBootstrapping,
			code::TRUNCATE => ErrorDetails::Truncate,
			code::SYNTAX => ErrorDetails::Syntax,
			code::UNAUTHORIZED => ErrorDetails::Unauthorized,
			code::INVALID => ErrorDetails::Invalid,
			code::CONFIG => ErrorDetails::Config,
			code::UNAVAILABLE => ErrorDetails::Unavailable {
				consistency: Consistency::read_from(buf)
					.context("cannot read unavailable consistency")?,
				required: buf.try_get_i32().context("cannot read required replicas")?,
				alive: buf.try_get_i32().context("cannot read alive replicas")?,
			},
			code::WRITE_TIMEOUT => ErrorDetails::WriteTimeout {
				consistency: Consistency::read_from(buf)
					.context("cannot read timeout consistency")?,
				received: buf.try_get_i32().context("cannot read received count")?,
				block_for: buf.try_get_i32().context("cannot read block-for count")?,
				write_type: WriteType::from_wire(
					&read_string(buf).context("cannot read write type")?,
				)?,
			},
			code::READ_TIMEOUT => ErrorDetails::ReadTimeout {
				consistency: Consistency::read_from(buf)
					.context("cannot read timeout consistency")?,
				received: buf.try_get_i32().context("cannot read received count")?,
				block_for: buf.try_get_i32().context("cannot read block-for count")?,
				data_present: buf.try_get_u8().context("cannot read data-present flag")? != 0,
			},
			code::READ_FAILURE => ErrorDetails::ReadFailure {
				consistency: Consistency::read_from(buf)
					.context("cannot read failure consistency")?,
				received: buf.try_get_i32().context("cannot read received count")?,
				block_for: buf.try_get_i32().context("cannot read block-for count")?,
				reasons: FailureReasons::decode(buf, version)?,
				data_present: buf.try_get_u8().context("cannot read data-present flag")? != 0,
			},
			code::WRITE_FAILURE => ErrorDetails::WriteFailure {
				consistency: Consistency::read_from(buf)
					.context("cannot read failure consistency")?,
				received: buf.try_get_i32().context("cannot read received count")?,
				block_for: buf.try_get_i32().context("cannot read block-for count")?,
				reasons: FailureReasons::decode(buf, version)?,
				write_type: WriteType::from_wire(
					&read_string(buf).context("cannot read write type")?,
				)?,
			},
			code::FUNCTION_FAILURE => ErrorDetails::FunctionFailure {
				keyspace: read_string(buf).context("cannot read function keyspace")?,
				function: read_string(buf).context("cannot read function name")?,
				arg_types: read_string_list(buf).context("cannot read argument types")?,
			},
			code::ALREADY_EXISTS => ErrorDetails::AlreadyExists {
				keyspace: read_string(buf).context("cannot read keyspace")?,
				table: read_string(buf).context("cannot read table")?,
			},
			code::UNPREPARED => ErrorDetails::Unprepared {
				id: read_short_bytes(buf).context("cannot read statement id")?,
			},
			other => {
				return Err(Error::new(ErrorKind::UnknownTag {
					kind: "error code",
					tag: format!("{other:#06X}"),
				}))
			},
		};

		let error = Self { message, details };
		error.check_version(version)?;

		Ok(error)
	}
}

body_codec! {
	/// Codec for [`CqlError`].
	ErrorCodec, Error, CqlError
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4, V5};
	use std::net::Ipv4Addr;

	fn round_trip(error: &CqlError, version: ProtocolVersion) {
		let mut buf = Vec::new();
		error.encode(&mut buf, version).unwrap();

		assert_eq!(buf.len(), error.encoded_size(version).unwrap());
		assert_eq!(&CqlError::decode(&mut &buf[..], version).unwrap(), error);
	}

	#[test]
	fn test_plain_errors_round_trip() {
		round_trip(
			&CqlError {
				message: "unconfigured table".to_owned(),
				details: ErrorDetails::Invalid,
			},
			V3,
		);
	}

	#[test]
	fn test_unavailable_round_trip() {
		round_trip(
			&CqlError {
				message: "cannot achieve consistency level QUORUM".to_owned(),
				details: ErrorDetails::Unavailable {
					consistency: Consistency::Quorum,
					required: 3,
					alive: 1,
				},
			},
			V4,
		);
	}

	#[test]
	fn test_write_timeout_round_trip() {
		round_trip(
			&CqlError {
				message: "timed out".to_owned(),
				details: ErrorDetails::WriteTimeout {
					consistency: Consistency::All,
					received: 2,
					block_for: 3,
					write_type: WriteType::BatchLog,
				},
			},
			V3,
		);
	}

	#[test]
	fn test_read_failure_uses_count_before_v5() {
		round_trip(
			&CqlError {
				message: "replica failure".to_owned(),
				details: ErrorDetails::ReadFailure {
					consistency: Consistency::One,
					received: 0,
					block_for: 1,
					reasons: FailureReasons::Count(1),
					data_present: false,
				},
			},
			V4,
		);
	}

	#[test]
	fn test_write_failure_uses_reason_map_on_v5() {
		round_trip(
			&CqlError {
				message: "replica failure".to_owned(),
				details: ErrorDetails::WriteFailure {
					consistency: Consistency::LocalQuorum,
					received: 1,
					block_for: 2,
					reasons: FailureReasons::PerEndpoint(vec![
						(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), 0x0001),
						(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 8)), 0x0002),
					]),
					write_type: WriteType::Simple,
				},
			},
			V5,
		);
	}

	#[test]
	fn test_function_failure_round_trip() {
		round_trip(
			&CqlError {
				message: "execution of ks.my_fn failed".to_owned(),
				details: ErrorDetails::FunctionFailure {
					keyspace: "ks".to_owned(),
					function: "my_fn".to_owned(),
					arg_types: vec!["int".to_owned(), "text".to_owned()],
				},
			},
			V4,
		);
	}

	#[test]
	fn test_function_failure_needs_version_four() {
		let error = CqlError {
			message: "execution of ks.my_fn failed".to_owned(),
			details: ErrorDetails::FunctionFailure {
				keyspace: "ks".to_owned(),
				function: "my_fn".to_owned(),
				arg_types: vec!["int".to_owned()],
			},
		};

		let mut buf = Vec::new();
		assert!(matches!(
			error.encode(&mut buf, V3).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));

		let mut encoded = Vec::new();
		error.encode(&mut encoded, V4).unwrap();
		assert!(matches!(
			CqlError::decode(&mut &encoded[..], V3).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
		assert_eq!(CqlError::decode(&mut &encoded[..], V4).unwrap(), error);
	}

	#[test]
	fn test_failure_shape_is_version_checked() {
		let premature = CqlError {
			message: "m".to_owned(),
			details: ErrorDetails::ReadFailure {
				consistency: Consistency::One,
				received: 0,
				block_for: 1,
				reasons: FailureReasons::PerEndpoint(Vec::new()),
				data_present: false,
			},
		};
		let mut buf = Vec::new();

		assert!(matches!(
			premature.encode(&mut buf, V4).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
	}

	#[test]
	fn test_unprepared_round_trip() {
		round_trip(
			&CqlError {
				message: "unknown id".to_owned(),
				details: ErrorDetails::Unprepared {
					id: vec![0xDE, 0xAD],
				},
			},
			V4,
		);
	}

	#[test]
	fn test_unknown_code_is_rejected() {
		let mut buf = Vec::new();
		buf.extend(0x9999_i32.to_be_bytes());
		buf.extend([0x00, 0x01, b'x']);

		assert!(matches!(
			CqlError::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "error code",
				..
			}
		));
	}
}
