// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The one-byte tag that distinguishes the actual message.

use std::fmt;

use cqlkit::{Error, ErrorKind, Result};

/// An integer byte that distinguishes the actual message:
/// - `0x00`: ERROR
/// - `0x01`: STARTUP
/// - `0x02`: READY
/// - `0x03`: AUTHENTICATE
/// - `0x05`: OPTIONS
/// - `0x06`: SUPPORTED
/// - `0x07`: QUERY
/// - `0x08`: RESULT
/// - `0x09`: PREPARE
/// - `0x0A`: EXECUTE
/// - `0x0B`: REGISTER
/// - `0x0C`: EVENT
/// - `0x0D`: BATCH
/// - `0x0E`: AUTH_CHALLENGE
/// - `0x0F`: AUTH_RESPONSE
/// - `0x10`: AUTH_SUCCESS
///
/// `0x04` was CREDENTIALS in protocol versions before 3 and is no longer a
/// valid tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
	Error = 0x00,
	Startup = 0x01,
	Ready = 0x02,
	Authenticate = 0x03,
	Options = 0x05,
	Supported = 0x06,
	Query = 0x07,
	Result = 0x08,
	Prepare = 0x09,
	Execute = 0x0A,
	Register = 0x0B,
	Event = 0x0C,
	Batch = 0x0D,
	AuthChallenge = 0x0E,
	AuthResponse = 0x0F,
	AuthSuccess = 0x10,
}

impl Opcode {
	/// The protocol's name for this opcode.
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Error => "ERROR",
			Self::Startup => "STARTUP",
			Self::Ready => "READY",
			Self::Authenticate => "AUTHENTICATE",
			Self::Options => "OPTIONS",
			Self::Supported => "SUPPORTED",
			Self::Query => "QUERY",
			Self::Result => "RESULT",
			Self::Prepare => "PREPARE",
			Self::Execute => "EXECUTE",
			Self::Register => "REGISTER",
			Self::Event => "EVENT",
			Self::Batch => "BATCH",
			Self::AuthChallenge => "AUTH_CHALLENGE",
			Self::AuthResponse => "AUTH_RESPONSE",
			Self::AuthSuccess => "AUTH_SUCCESS",
		}
	}
}

impl TryFrom<u8> for Opcode {
	type Error = Error;

	fn try_from(byte: u8) -> Result<Self> {
		Ok(match byte {
			0x00 => Self::Error,
			0x01 => Self::Startup,
			0x02 => Self::Ready,
			0x03 => Self::Authenticate,
			0x05 => Self::Options,
			0x06 => Self::Supported,
			0x07 => Self::Query,
			0x08 => Self::Result,
			0x09 => Self::Prepare,
			0x0A => Self::Execute,
			0x0B => Self::Register,
			0x0C => Self::Event,
			0x0D => Self::Batch,
			0x0E => Self::AuthChallenge,
			0x0F => Self::AuthResponse,
			0x10 => Self::AuthSuccess,
			other => {
				return Err(cqlkit::Error::new(ErrorKind::UnknownTag {
					kind: "opcode",
					tag: format!("{other:#04X}"),
				}))
			},
		})
	}
}

impl fmt::Display for Opcode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_tags_round_trip() {
		for byte in 0x00..=0x10_u8 {
			if byte == 0x04 {
				continue;
			}

			let opcode = Opcode::try_from(byte).unwrap();
			assert_eq!(opcode as u8, byte);
		}
	}

	#[test]
	fn test_credentials_tag_is_gone() {
		let error = Opcode::try_from(0x04).unwrap_err();

		assert!(matches!(
			error.kind(),
			ErrorKind::UnknownTag { kind: "opcode", .. }
		));
	}
}
