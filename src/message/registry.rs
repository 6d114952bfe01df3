// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The codec registry: `(version, opcode, direction)` to body codec.
//!
//! A registry is built once for a role and never mutated afterwards, so
//! lookups are side-effect-free and the same registry can serve any
//! number of connections concurrently. The client role registers request
//! encoders and response decoders; the server role registers the
//! inverse.

use std::collections::HashMap;
use std::fmt;

use cqlkit::{Error, ErrorKind, ProtocolVersion, Result};

use super::{
	auth_challenge::AuthChallengeCodec,
	auth_response::AuthResponseCodec,
	auth_success::AuthSuccessCodec,
	authenticate::AuthenticateCodec,
	batch::BatchCodec,
	error::ErrorCodec,
	event::EventCodec,
	execute::ExecuteCodec,
	options::OptionsCodec,
	prepare::PrepareCodec,
	query::QueryCodec,
	ready::ReadyCodec,
	register::RegisterCodec,
	result::ResultCodec,
	startup::StartupCodec,
	supported::SupportedCodec,
	BodyCodec,
};
use crate::frame::Direction;
use crate::opcode::Opcode;

static REQUEST_CODECS: &[&dyn BodyCodec] = &[
	&StartupCodec,
	&OptionsCodec,
	&QueryCodec,
	&PrepareCodec,
	&ExecuteCodec,
	&RegisterCodec,
	&BatchCodec,
	&AuthResponseCodec,
];

static RESPONSE_CODECS: &[&dyn BodyCodec] = &[
	&ErrorCodec,
	&ReadyCodec,
	&AuthenticateCodec,
	&SupportedCodec,
	&ResultCodec,
	&EventCodec,
	&AuthChallengeCodec,
	&AuthSuccessCodec,
];

type CodecTable = HashMap<(ProtocolVersion, Opcode), &'static dyn BodyCodec>;

/// The two-level codec lookup for one side of a connection.
pub struct CodecRegistry {
	encoders: CodecTable,
	decoders: CodecTable,
	encode_direction: Direction,
	decode_direction: Direction,
}

impl CodecRegistry {
	/// The client registry: request encoders, response decoders, for
	/// every supported version.
	#[must_use]
	pub fn client() -> Self {
		Self::build(Direction::Request)
	}

	/// The server registry: response encoders, request decoders, for
	/// every supported version.
	#[must_use]
	pub fn server() -> Self {
		Self::build(Direction::Response)
	}

	fn build(encode_direction: Direction) -> Self {
		let (encoded, decoded) = match encode_direction {
			Direction::Request => (REQUEST_CODECS, RESPONSE_CODECS),
			Direction::Response => (RESPONSE_CODECS, REQUEST_CODECS),
		};
		let decode_direction = match encode_direction {
			Direction::Request => Direction::Response,
			Direction::Response => Direction::Request,
		};

		let mut registry = Self {
			encoders: HashMap::new(),
			decoders: HashMap::new(),
			encode_direction,
			decode_direction,
		};

		for version in ProtocolVersion::ALL {
			registry.register(version, encoded, decoded);
		}

		registry
	}

	fn register(
		&mut self,
		version: ProtocolVersion,
		encoded: &[&'static dyn BodyCodec],
		decoded: &[&'static dyn BodyCodec],
	) {
		for codec in encoded {
			self.encoders.insert((version, codec.opcode()), *codec);
		}
		for codec in decoded {
			self.decoders.insert((version, codec.opcode()), *codec);
		}
	}

	/// Looks up the encoder for a message.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::CodecNotFound`] when this registry does
	/// not encode `direction` frames or has no entry for the opcode.
	pub fn encoder(
		&self,
		version: ProtocolVersion,
		opcode: Opcode,
		direction: Direction,
	) -> Result<&'static dyn BodyCodec> {
		if direction != self.encode_direction {
			return Err(not_found(version, opcode, direction));
		}

		self.encoders
			.get(&(version, opcode))
			.copied()
			.ok_or_else(|| not_found(version, opcode, direction))
	}

	/// Looks up the decoder for a frame body.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::CodecNotFound`] when this registry does
	/// not decode `direction` frames or has no entry for the opcode.
	pub fn decoder(
		&self,
		version: ProtocolVersion,
		opcode: Opcode,
		direction: Direction,
	) -> Result<&'static dyn BodyCodec> {
		if direction != self.decode_direction {
			return Err(not_found(version, opcode, direction));
		}

		self.decoders
			.get(&(version, opcode))
			.copied()
			.ok_or_else(|| not_found(version, opcode, direction))
	}
}

fn not_found(version: ProtocolVersion, opcode: Opcode, direction: Direction) -> Error {
	Error::new(ErrorKind::CodecNotFound {
		version,
		what: format!("{direction} opcode {opcode}"),
	})
}

impl fmt::Debug for CodecRegistry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("CodecRegistry")
			.field("encoders", &self.encoders.len())
			.field("decoders", &self.decoders.len())
			.field("encode_direction", &self.encode_direction)
			.field("decode_direction", &self.decode_direction)
			.finish()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_client_and_server_mirror_each_other() {
		let client = CodecRegistry::client();
		let server = CodecRegistry::server();

		for version in ProtocolVersion::ALL {
			assert!(client
				.encoder(version, Opcode::Query, Direction::Request)
				.is_ok());
			assert!(server
				.decoder(version, Opcode::Query, Direction::Request)
				.is_ok());
			assert!(server
				.encoder(version, Opcode::Result, Direction::Response)
				.is_ok());
			assert!(client
				.decoder(version, Opcode::Result, Direction::Response)
				.is_ok());
		}
	}

	#[test]
	fn test_wrong_direction_finds_no_codec() {
		let client = CodecRegistry::client();

		let error = client
			.encoder(ProtocolVersion::V4, Opcode::Ready, Direction::Response)
			.unwrap_err();

		assert!(matches!(error.kind(), ErrorKind::CodecNotFound { .. }));
		assert_eq!(
			error.to_string(),
			"no codec for response opcode READY in protocol version 4"
		);
	}

	#[test]
	fn test_every_opcode_is_covered_once() {
		let client = CodecRegistry::client();

		for codec in REQUEST_CODECS {
			assert!(client
				.encoder(ProtocolVersion::V5, codec.opcode(), Direction::Request)
				.is_ok());
		}
		for codec in RESPONSE_CODECS {
			assert!(client
				.decoder(ProtocolVersion::V5, codec.opcode(), Direction::Response)
				.is_ok());
		}
	}
}
