// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `AUTH_RESPONSE` request.

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{bytes_size, read_bytes, write_bytes};

/// The client's answer to an `AUTHENTICATE` or `AUTH_CHALLENGE`. The body
/// is a nullable token whose meaning belongs to the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthResponse {
	/// The response token.
	pub token: Option<Vec<u8>>,
}

impl AuthResponse {
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
	/// Codec for [`AuthResponse`].
	AuthResponseCodec, AuthResponse, AuthResponse
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V3;

	#[test]
	fn test_empty_and_null_tokens_differ_on_the_wire() {
		let mut null = Vec::new();
		AuthResponse { token: None }.encode(&mut null, V3).unwrap();

		let mut empty = Vec::new();
		AuthResponse {
			token: Some(Vec::new()),
		}
		.encode(&mut empty, V3)
		.unwrap();

		assert_ne!(null, empty);
	}
}
