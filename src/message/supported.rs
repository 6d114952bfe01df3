// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `SUPPORTED` response.

use std::collections::HashMap;

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{read_string_multimap, string_multimap_size, write_string_multimap};

/// Answers `OPTIONS` with the startup options the server accepts and the
/// values it accepts for them, as a `[string multimap]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Supported {
	/// Option name to accepted values.
	pub options: HashMap<String, Vec<String>>,
}

impl Supported {
	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		Ok(string_multimap_size(&self.options))
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		write_string_multimap(&self.options, buf)
	}

	pub(crate) fn decode(buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		Ok(Self {
			options: read_string_multimap(buf)?,
		})
	}
}

body_codec! {
	/// Codec for [`Supported`].
	SupportedCodec, Supported, Supported
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V4;

	#[test]
	fn test_round_trip() {
		let supported = Supported {
			options: [
				(
					"CQL_VERSION".to_owned(),
					vec!["3.0.0".to_owned(), "3.4.5".to_owned()],
				),
				(
					"COMPRESSION".to_owned(),
					vec!["lz4".to_owned(), "snappy".to_owned()],
				),
			]
			.into(),
		};
		let mut buf = Vec::new();
		supported.encode(&mut buf, V4).unwrap();

		assert_eq!(buf.len(), supported.encoded_size(V4).unwrap());
		assert_eq!(Supported::decode(&mut &buf[..], V4).unwrap(), supported);
	}
}
