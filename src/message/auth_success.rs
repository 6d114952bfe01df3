// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `AUTH_SUCCESS` response.

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;
use crate::primitive::{bytes_size, read_bytes, write_bytes};

/// Authentication succeeded. The body is a nullable token with any final
/// information the authenticator wants to hand the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSuccess {
	/// The final token.
	pub token: Option<Vec<u8>>,
}

impl AuthSuccess {
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
	/// Codec for [`AuthSuccess`].
	AuthSuccessCodec, AuthSuccess, AuthSuccess
}
