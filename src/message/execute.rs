// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `EXECUTE` request.

use bytes::{Buf, BufMut};
use cqlkit::{Error, ErrorKind, ProtocolVersion, Result, ResultExt};

use super::body_codec;
use super::query::QueryOptions;
use crate::primitive::{read_short_bytes, short_bytes_size, write_short_bytes};

/// Executes a prepared statement by id. From protocol version 5 onwards
/// the body also carries the result-metadata id the client holds, so the
/// server can tell it about schema drift through `METADATA_CHANGED`
/// results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
	/// The prepared statement id, from `RESULT`/`Prepared`.
	pub id: Vec<u8>,
	/// The result-metadata id the client knows. Mandatory on version 5,
	/// absent before it.
	pub result_metadata_id: Option<Vec<u8>>,
	/// The query options.
	pub options: QueryOptions,
}

impl Execute {
	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		if version >= ProtocolVersion::V5 && self.result_metadata_id.is_none() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "EXECUTE without a result metadata id",
			}));
		}
		if version < ProtocolVersion::V5 && self.result_metadata_id.is_some() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "result metadata ids",
			}));
		}

		Ok(())
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check_version(version)?;

		let metadata_id_size = self
			.result_metadata_id
			.as_deref()
			.map_or(0, short_bytes_size);

		Ok(short_bytes_size(&self.id) + metadata_id_size + self.options.encoded_size(version)?)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		write_short_bytes(&self.id, buf).context("cannot write prepared statement id")?;
		if let Some(metadata_id) = &self.result_metadata_id {
			write_short_bytes(metadata_id, buf).context("cannot write result metadata id")?;
		}

		self.options.encode(buf, version)
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let id = read_short_bytes(buf).context("cannot read prepared statement id")?;
		let result_metadata_id = if version >= ProtocolVersion::V5 {
			Some(read_short_bytes(buf).context("cannot read result metadata id")?)
		} else {
			None
		};

		Ok(Self {
			id,
			result_metadata_id,
			options: QueryOptions::decode(buf, version)?,
		})
	}
}

body_codec! {
	/// Codec for [`Execute`].
	ExecuteCodec, Execute, Execute
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::consistency::Consistency;
	use cqlkit::ProtocolVersion::{V4, V5};

	#[test]
	fn test_round_trip_v4() {
		let execute = Execute {
			id: vec![0xAB; 16],
			result_metadata_id: None,
			options: QueryOptions {
				consistency: Consistency::LocalOne,
				..QueryOptions::default()
			},
		};
		let mut buf = Vec::new();
		execute.encode(&mut buf, V4).unwrap();

		assert_eq!(buf.len(), execute.encoded_size(V4).unwrap());
		assert_eq!(Execute::decode(&mut &buf[..], V4).unwrap(), execute);
	}

	#[test]
	fn test_round_trip_v5_carries_metadata_id() {
		let execute = Execute {
			id: vec![0xAB; 16],
			result_metadata_id: Some(vec![0xCD; 16]),
			options: QueryOptions::default(),
		};
		let mut buf = Vec::new();
		execute.encode(&mut buf, V5).unwrap();

		assert_eq!(buf.len(), execute.encoded_size(V5).unwrap());
		assert_eq!(Execute::decode(&mut &buf[..], V5).unwrap(), execute);
	}

	#[test]
	fn test_metadata_id_presence_is_version_checked() {
		let mut buf = Vec::new();

		let missing = Execute {
			id: vec![1],
			result_metadata_id: None,
			options: QueryOptions::default(),
		};
		assert!(missing.encode(&mut buf, V5).is_err());

		let premature = Execute {
			id: vec![1],
			result_metadata_id: Some(vec![2]),
			options: QueryOptions::default(),
		};
		assert!(premature.encode(&mut buf, V4).is_err());
	}
}
