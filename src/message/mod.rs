// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One body type per opcode, and the machinery to dispatch on them.
//!
//! Every body implements the same three inherent operations against a
//! protocol version - `encoded_size`, `encode`, `decode` - with the
//! contract that `encode` emits exactly `encoded_size` bytes for every
//! valid value; the frame codec pre-allocates on that promise. The
//! [`BodyCodec`] objects bridge those inherent operations into the
//! [`Message`] sum so the [`CodecRegistry`] can dispatch by opcode at
//! runtime.

mod auth_challenge;
mod auth_response;
mod auth_success;
mod authenticate;
mod batch;
mod error;
mod event;
mod execute;
mod options;
mod prepare;
mod query;
mod ready;
mod register;
mod registry;
mod result;
mod startup;
mod supported;

pub use auth_challenge::AuthChallenge;
pub use auth_response::AuthResponse;
pub use auth_success::AuthSuccess;
pub use authenticate::Authenticate;
pub use batch::{Batch, BatchQuery, BatchStatement, BatchType};
pub use error::{CqlError, ErrorDetails, FailureReasons, WriteType};
pub use event::{
	Event,
	EventType,
	SchemaChangeEvent,
	SchemaChangeTarget,
	SchemaChangeType,
	StatusChangeEvent,
	StatusChangeType,
	TopologyChangeEvent,
	TopologyChangeType,
};
pub use execute::Execute;
pub use options::Options;
pub use prepare::Prepare;
pub use query::{Query, QueryOptions, QueryValues};
pub use ready::Ready;
pub use register::Register;
pub use registry::CodecRegistry;
pub use result::{ColumnSpec, CqlResult, Prepared, PreparedMetadata, Rows, RowsMetadata, TableSpec};
pub use startup::Startup;
pub use supported::Supported;

use cqlkit::{Error, ErrorKind, ProtocolVersion, Result};
use derive_more::From;

use crate::frame::Direction;
use crate::opcode::Opcode;

/// Any message the protocol exchanges, request or response.
#[derive(Debug, Clone, PartialEq, From)]
#[allow(missing_docs)]
pub enum Message {
	// Requests.
	Startup(Startup),
	Options(Options),
	Query(Query),
	Prepare(Prepare),
	Execute(Execute),
	Register(Register),
	Batch(Batch),
	AuthResponse(AuthResponse),

	// Responses.
	Error(CqlError),
	Ready(Ready),
	Authenticate(Authenticate),
	Supported(Supported),
	Result(CqlResult),
	Event(Event),
	AuthChallenge(AuthChallenge),
	AuthSuccess(AuthSuccess),
}

impl Message {
	/// The opcode this message travels under.
	#[must_use]
	pub const fn opcode(&self) -> Opcode {
		match self {
			Self::Startup(_) => Opcode::Startup,
			Self::Options(_) => Opcode::Options,
			Self::Query(_) => Opcode::Query,
			Self::Prepare(_) => Opcode::Prepare,
			Self::Execute(_) => Opcode::Execute,
			Self::Register(_) => Opcode::Register,
			Self::Batch(_) => Opcode::Batch,
			Self::AuthResponse(_) => Opcode::AuthResponse,
			Self::Error(_) => Opcode::Error,
			Self::Ready(_) => Opcode::Ready,
			Self::Authenticate(_) => Opcode::Authenticate,
			Self::Supported(_) => Opcode::Supported,
			Self::Result(_) => Opcode::Result,
			Self::Event(_) => Opcode::Event,
			Self::AuthChallenge(_) => Opcode::AuthChallenge,
			Self::AuthSuccess(_) => Opcode::AuthSuccess,
		}
	}

	/// Whether this message is a request or a response.
	#[must_use]
	pub const fn direction(&self) -> Direction {
		match self {
			Self::Startup(_)
			| Self::Options(_)
			| Self::Query(_)
			| Self::Prepare(_)
			| Self::Execute(_)
			| Self::Register(_)
			| Self::Batch(_)
			| Self::AuthResponse(_) => Direction::Request,
			_ => Direction::Response,
		}
	}
}

/// A message-body codec, dispatchable by opcode.
///
/// Implementations are stateless unit structs; the registry hands out
/// `&'static` references to them.
pub trait BodyCodec: Send + Sync + std::fmt::Debug {
	/// The opcode this codec serves.
	fn opcode(&self) -> Opcode;

	/// The exact number of body bytes [`encode`](Self::encode) will emit
	/// for `message`.
	///
	/// # Errors
	///
	/// Fails when the message cannot be encoded under `version` at all.
	fn encoded_size(&self, message: &Message, version: ProtocolVersion) -> Result<usize>;

	/// Encodes the body of `message` into `buf`.
	///
	/// # Errors
	///
	/// Fails when the message is invalid under `version`, and with
	/// [`ErrorKind::IntegrityViolation`] when handed a message of a
	/// different opcode.
	fn encode(&self, message: &Message, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<()>;

	/// Decodes a body into its message.
	///
	/// # Errors
	///
	/// Fails when the body bytes are invalid under `version`.
	fn decode(&self, buf: &mut &[u8], version: ProtocolVersion) -> Result<Message>;
}

fn codec_mismatch(expected: Opcode, got: &Message) -> Error {
	Error::new(ErrorKind::IntegrityViolation {
		detail: format!("{expected} codec invoked for a {} message", got.opcode()),
	})
}

/// Bridges a body type's inherent `encoded_size`/`encode`/`decode` into a
/// [`BodyCodec`] unit struct.
macro_rules! body_codec {
	($(#[$meta:meta])* $codec:ident, $opcode:ident, $body:ty) => {
		$(#[$meta])*
		#[derive(Debug)]
		pub(crate) struct $codec;

		impl crate::message::BodyCodec for $codec {
			fn opcode(&self) -> crate::opcode::Opcode {
				crate::opcode::Opcode::$opcode
			}

			fn encoded_size(
				&self,
				message: &crate::message::Message,
				version: cqlkit::ProtocolVersion,
			) -> cqlkit::Result<usize> {
				match message {
					crate::message::Message::$opcode(body) => body.encoded_size(version),
					other => Err(crate::message::codec_mismatch(
						crate::opcode::Opcode::$opcode,
						other,
					)),
				}
			}

			fn encode(
				&self,
				message: &crate::message::Message,
				buf: &mut Vec<u8>,
				version: cqlkit::ProtocolVersion,
			) -> cqlkit::Result<()> {
				match message {
					crate::message::Message::$opcode(body) => body.encode(buf, version),
					other => Err(crate::message::codec_mismatch(
						crate::opcode::Opcode::$opcode,
						other,
					)),
				}
			}

			fn decode(
				&self,
				buf: &mut &[u8],
				version: cqlkit::ProtocolVersion,
			) -> cqlkit::Result<crate::message::Message> {
				Ok(crate::message::Message::$opcode(<$body>::decode(
					buf, version,
				)?))
			}
		}
	};
}

use body_codec;

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_every_message_reports_its_opcode() {
		let cases: [(Message, Opcode, Direction); 4] = [
			(Startup::default().into(), Opcode::Startup, Direction::Request),
			(Ready.into(), Opcode::Ready, Direction::Response),
			(Options.into(), Opcode::Options, Direction::Request),
			(Supported::default().into(), Opcode::Supported, Direction::Response),
		];

		for (message, opcode, direction) in cases {
			assert_eq!(message.opcode(), opcode);
			assert_eq!(message.direction(), direction);
		}
	}

	#[test]
	fn test_codec_mismatch_is_an_integrity_violation() {
		let codec = startup::StartupCodec;
		let error = codec
			.encoded_size(&Ready.into(), ProtocolVersion::V4)
			.unwrap_err();

		assert!(matches!(
			error.kind(),
			ErrorKind::IntegrityViolation { .. }
		));
	}
}
