// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `AUTHENTICATE` response.

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{read_string, string_size, write_string};

/// The server requires authentication before it will accept queries. The
/// body names the authenticator class the client must satisfy through
/// `AUTH_RESPONSE`/`AUTH_CHALLENGE` exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticate {
	/// The fully qualified authenticator class name.
	pub authenticator: String,
}

impl Authenticate {
	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		Ok(string_size(&self.authenticator))
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		write_string(&self.authenticator, buf)
	}

	pub(crate) fn decode(buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		Ok(Self {
			authenticator: read_string(buf)?,
		})
	}
}

body_codec! {
	/// Codec for [`Authenticate`].
	AuthenticateCodec, Authenticate, Authenticate
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V3;

	#[test]
	fn test_round_trip() {
		let authenticate = Authenticate {
			authenticator: "org.apache.cassandra.auth.PasswordAuthenticator".to_owned(),
		};
		let mut buf = Vec::new();
		authenticate.encode(&mut buf, V3).unwrap();

		assert_eq!(buf.len(), authenticate.encoded_size(V3).unwrap());
		assert_eq!(Authenticate::decode(&mut &buf[..], V3).unwrap(), authenticate);
	}
}
