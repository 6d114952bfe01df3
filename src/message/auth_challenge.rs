// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `AUTH_CHALLENGE` response.

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{bytes_size, read_bytes, write_bytes};

/// A further challenge from the server's authenticator, answered by
/// another `AUTH_RESPONSE`. The body is a nullable token whose meaning
/// belongs to the authenticator, not the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthChallenge {
	/// The challenge token.
	pub token: Option<Vec<u8>>,
}

impl AuthChallenge {
	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		Ok(bytes_size(self.token.as_deref()))
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		write_bytes(self.token.as_deref(), buf)
	}

	pub(crate) fn decode(buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		Ok(Self {
			token: read_bytes(buf)?,
		})
	}
}

body_codec! {
	/// Codec for [`AuthChallenge`].
	AuthChallengeCodec, AuthChallenge, AuthChallenge
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V4;

	#[test]
	fn test_null_token_round_trips() {
		for challenge in [
			AuthChallenge { token: None },
			AuthChallenge {
				token: Some(vec![0x0A, 0x0B]),
			},
		] {
			let mut buf = Vec::new();
			challenge.encode(&mut buf, V4).unwrap();

			assert_eq!(buf.len(), challenge.encoded_size(V4).unwrap());
			assert_eq!(AuthChallenge::decode(&mut &buf[..], V4).unwrap(), challenge);
		}
	}
}
