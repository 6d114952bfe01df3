// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `PREPARE` request.

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
};

use super::body_codec;
use crate::primitive::{
	long_string_size,
	read_long_string,
	read_string,
	string_size,
	write_long_string,
	write_string,
};

// The only prepare flag so far.
const WITH_KEYSPACE: u32 = 0x01;

/// Prepares a statement for later `EXECUTE`s, answered by a `RESULT` of
/// kind `Prepared`. Protocol version 5 added a flags field with an
/// optional keyspace to resolve unqualified names in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare {
	/// The CQL statement to prepare.
	pub query: String,
	/// The keyspace to resolve unqualified names in. Version 5 onwards.
	pub keyspace: Option<String>,
}

impl Prepare {
	/// A prepare with no keyspace override.
	#[must_use]
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			keyspace: None,
		}
	}

	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		if version < ProtocolVersion::V5 && self.keyspace.is_some() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "per-prepare keyspaces",
			}));
		}

		Ok(())
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check_version(version)?;

		let mut size = long_string_size(&self.query);
		if version >= ProtocolVersion::V5 {
			size += u32::WIRE_SIZE;
			if let Some(keyspace) = &self.keyspace {
				size += string_size(keyspace);
			}
		}

		Ok(size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		write_long_string(&self.query, buf).context("cannot write statement")?;

		if version >= ProtocolVersion::V5 {
			let flags = if self.keyspace.is_some() {
				WITH_KEYSPACE
			} else {
				0
			};
			buf.try_put_u32(flags)?;

			if let Some(keyspace) = &self.keyspace {
				write_string(keyspace, buf).context("cannot write prepare keyspace")?;
			}
		}

		Ok(())
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let query = read_long_string(buf).context("cannot read statement")?;

		let keyspace = if version >= ProtocolVersion::V5 {
			let flags = buf.try_get_u32().context("cannot read prepare flags")?;

			(flags & WITH_KEYSPACE != 0)
				.then(|| read_string(buf).context("cannot read prepare keyspace"))
				.transpose()?
		} else {
			None
		};

		Ok(Self { query, keyspace })
	}
}

body_codec! {
	/// Codec for [`Prepare`].
	PrepareCodec, Prepare, Prepare
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	#[test]
	fn test_round_trip_pre_v5_is_just_the_statement() {
		let prepare = Prepare::new("SELECT * FROM t WHERE k = ?");
		let mut buf = Vec::new();
		prepare.encode(&mut buf, V3).unwrap();

		assert_eq!(buf.len(), long_string_size(&prepare.query));
		assert_eq!(Prepare::decode(&mut &buf[..], V3).unwrap(), prepare);
	}

	#[test]
	fn test_round_trip_v5_keyspace() {
		let prepare = Prepare {
			query: "SELECT * FROM t".to_owned(),
			keyspace: Some("ks".to_owned()),
		};
		let mut buf = Vec::new();
		prepare.encode(&mut buf, V5).unwrap();

		assert_eq!(buf.len(), prepare.encoded_size(V5).unwrap());
		assert_eq!(Prepare::decode(&mut &buf[..], V5).unwrap(), prepare);
	}

	#[test]
	fn test_keyspace_needs_v5() {
		let prepare = Prepare {
			query: "SELECT 1".to_owned(),
			keyspace: Some("ks".to_owned()),
		};
		let mut buf = Vec::new();

		assert!(matches!(
			prepare.encode(&mut buf, V4).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
	}
}
