// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `STARTUP` request: the first message of every connection.

use std::collections::HashMap;

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{read_string_map, string_map_size, write_string_map};

/// Initializes the connection. The body is a `[string map]` of options;
/// `CQL_VERSION` is mandatory, `COMPRESSION` names the algorithm the
/// client wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Startup {
	/// The startup options.
	pub options: HashMap<String, String>,
}

impl Startup {
	/// The mandatory CQL version option key.
	pub const CQL_VERSION: &'static str = "CQL_VERSION";
	/// The compression option key.
	pub const COMPRESSION: &'static str = "COMPRESSION";

	/// A startup asking for compression with `algorithm`.
	#[must_use]
	pub fn with_compression(algorithm: &str) -> Self {
		let mut startup = Self::default();
		startup
			.options
			.insert(Self::COMPRESSION.to_owned(), algorithm.to_owned());
		startup
	}

	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		Ok(string_map_size(&self.options))
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		write_string_map(&self.options, buf)
	}

	pub(crate) fn decode(buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		Ok(Self {
			options: read_string_map(buf)?,
		})
	}
}

impl Default for Startup {
	fn default() -> Self {
		Self {
			options: [(Self::CQL_VERSION.to_owned(), "3.0.0".to_owned())].into(),
		}
	}
}

body_codec! {
	/// Codec for [`Startup`].
	StartupCodec, Startup, super::Startup
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V4;

	#[test]
	fn test_default_body_bytes() {
		let startup = Startup::default();
		let mut buf = Vec::new();
		startup.encode(&mut buf, V4).unwrap();

		assert_eq!(buf.len(), startup.encoded_size(V4).unwrap());
		assert_eq!(
			buf,
			hex::decode("0001000b43514c5f56455253494f4e0005332e302e30").unwrap()
		);
	}

	#[test]
	fn test_round_trip_with_compression() {
		let startup = Startup::with_compression("lz4");
		let mut buf = Vec::new();
		startup.encode(&mut buf, V4).unwrap();

		assert_eq!(Startup::decode(&mut &buf[..], V4).unwrap(), startup);
	}
}
