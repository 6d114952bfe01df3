// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `READY` response.

use bytes::{Buf, BufMut};
use cqlkit::{ProtocolVersion, Result};

use super::body_codec;

/// The server is ready for queries. Answers a `STARTUP` that needs no
/// authentication, and an `AUTH_RESPONSE` that completed it. The body is
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ready;

impl Ready {
	pub(crate) fn encoded_size(self, _version: ProtocolVersion) -> Result<usize> {
		Ok(0)
	}

	pub(crate) fn encode(self, _buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		Ok(())
	}

	pub(crate) fn decode(_buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		Ok(Self)
	}
}

body_codec! {
	/// Codec for [`Ready`].
	ReadyCodec, Ready, Ready
}
