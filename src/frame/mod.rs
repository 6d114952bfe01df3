// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The outer envelope: header, sidecars, optional compression, body.
//!
//! A frame is the unit of exchange on the wire: the 9-byte [`Header`],
//! then - in this order and no other - the tracing id, the custom
//! payload, the warnings (each present iff its header flag is set), and
//! finally the message body. When the `COMPRESSED` flag is set,
//! everything after the header is compressed as one block, sidecars
//! included.
//!
//! [`FrameCodec`] owns the two transforms. Encoding computes the exact
//! body size first and allocates once; the byte count written must agree
//! with the computed size, and a disagreement is a codec bug surfaced as
//! [`ErrorKind::IntegrityViolation`]. Decoding refuses any frame whose
//! declared body length differs from the bytes present, and never reads
//! past it.

mod compression;
mod header;

pub use compression::Compressor;
pub use header::{Direction, Header, HeaderFlags};

use std::collections::HashMap;

use cqlkit::{
	Buf,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	Readable,
	Result,
	ResultExt,
	Writable,
};
use derivative::Derivative;
use tracing::trace;
use uuid::Uuid;

use crate::message::{BodyCodec, CodecRegistry, Message};
use crate::opcode::Opcode;
use crate::primitive::{
	bytes_map_size,
	read_bytes_map,
	read_string_list,
	read_uuid,
	string_list_size,
	write_bytes_map,
	write_string_list,
	write_uuid,
	UUID_SIZE,
};

/// One frame: a message plus its envelope.
///
/// Invariants are enforced at construction: custom payloads and warnings
/// need protocol version 4, the beta marker needs version 5, warnings and
/// tracing ids only attach to responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
	version: ProtocolVersion,
	beta: bool,
	stream: i16,
	tracing: bool,
	tracing_id: Option<Uuid>,
	custom_payload: HashMap<String, Option<Vec<u8>>>,
	warnings: Vec<String>,
	message: Message,
}

impl Frame {
	/// A frame with no sidecars.
	#[must_use]
	pub fn new(version: ProtocolVersion, stream: i16, message: impl Into<Message>) -> Self {
		Self {
			version,
			beta: false,
			stream,
			tracing: false,
			tracing_id: None,
			custom_payload: HashMap::new(),
			warnings: Vec::new(),
			message: message.into(),
		}
	}

	/// Opts the frame into the version 5 beta variant.
	///
	/// # Errors
	///
	/// Fails unless the frame's version is 5.
	pub fn with_beta(mut self) -> Result<Self> {
		if self.version != ProtocolVersion::V5 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: self.version,
				feature: "the beta protocol variant",
			}));
		}

		self.beta = true;
		Ok(self)
	}

	/// Asks the server to trace this request.
	///
	/// Meaningful on requests only; when the frame carries a response the
	/// flag on the wire is driven by [`with_tracing_id`](Self::with_tracing_id)
	/// instead.
	#[must_use]
	#[allow(clippy::missing_const_for_fn)]
	pub fn with_tracing(mut self) -> Self {
		self.tracing = true;
		self
	}

	/// Attaches the tracing id of a traced response.
	///
	/// # Errors
	///
	/// Fails when the message is a request; requests never carry one.
	pub fn with_tracing_id(mut self, tracing_id: Uuid) -> Result<Self> {
		if self.message.direction() == Direction::Request {
			return Err(Error::new(ErrorKind::IntegrityViolation {
				detail: "a tracing id attached to a request frame".to_owned(),
			}));
		}

		self.tracing_id = Some(tracing_id);
		Ok(self)
	}

	/// Attaches a custom payload.
	///
	/// # Errors
	///
	/// Fails before protocol version 4.
	pub fn with_custom_payload(
		mut self,
		custom_payload: HashMap<String, Option<Vec<u8>>>,
	) -> Result<Self> {
		if self.version < ProtocolVersion::V4 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: self.version,
				feature: "custom payloads",
			}));
		}

		self.custom_payload = custom_payload;
		Ok(self)
	}

	/// Attaches server warnings.
	///
	/// # Errors
	///
	/// Fails before protocol version 4, and on request frames; warnings
	/// only travel with responses.
	pub fn with_warnings(mut self, warnings: Vec<String>) -> Result<Self> {
		if self.version < ProtocolVersion::V4 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: self.version,
				feature: "warnings",
			}));
		}

		if self.message.direction() == Direction::Request {
			return Err(Error::new(ErrorKind::IntegrityViolation {
				detail: "warnings attached to a request frame".to_owned(),
			}));
		}

		self.warnings = warnings;
		Ok(self)
	}

	/// The protocol version the frame speaks.
	#[must_use]
	pub const fn version(&self) -> ProtocolVersion {
		self.version
	}

	/// Whether the frame opted into the version 5 beta variant.
	#[must_use]
	pub const fn beta(&self) -> bool {
		self.beta
	}

	/// The stream id.
	#[must_use]
	pub const fn stream(&self) -> i16 {
		self.stream
	}

	/// Whether tracing was requested (requests only).
	#[must_use]
	pub const fn tracing(&self) -> bool {
		self.tracing
	}

	/// The tracing id of a traced response.
	#[must_use]
	pub const fn tracing_id(&self) -> Option<Uuid> {
		self.tracing_id
	}

	/// The custom payload; empty when absent.
	#[must_use]
	pub const fn custom_payload(&self) -> &HashMap<String, Option<Vec<u8>>> {
		&self.custom_payload
	}

	/// The server warnings; empty when absent.
	#[must_use]
	pub fn warnings(&self) -> &[String] {
		&self.warnings
	}

	/// The message the frame carries.
	#[must_use]
	pub const fn message(&self) -> &Message {
		&self.message
	}

	/// Consumes the frame, returning its message.
	#[must_use]
	#[allow(clippy::missing_const_for_fn)]
	pub fn into_message(self) -> Message {
		self.message
	}
}

/// Encodes and decodes [`Frame`]s for one side of a connection.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FrameCodec {
	registry: CodecRegistry,
	#[derivative(Debug = "ignore")]
	compressor: Option<Box<dyn Compressor>>,
}

impl FrameCodec {
	/// A codec for the client side: encodes requests, decodes responses.
	#[must_use]
	pub fn client() -> Self {
		Self::new(CodecRegistry::client(), None)
	}

	/// A codec for the server side: decodes requests, encodes responses.
	#[must_use]
	pub fn server() -> Self {
		Self::new(CodecRegistry::server(), None)
	}

	/// A codec over an explicit registry and optional compressor.
	#[must_use]
	pub fn new(registry: CodecRegistry, compressor: Option<Box<dyn Compressor>>) -> Self {
		Self {
			registry,
			compressor,
		}
	}

	/// Replaces the compressor, e.g. once `STARTUP` negotiation settles
	/// on an algorithm.
	#[must_use]
	pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
		self.compressor = Some(compressor);
		self
	}

	/// Encodes `frame` into a freshly allocated buffer.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::CodecNotFound`] when no encoder is
	/// registered for the message, with the message codec's error when
	/// the body fails, and with [`ErrorKind::IntegrityViolation`] if the
	/// bytes written disagree with the computed size.
	pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
		let message = frame.message();
		let opcode = message.opcode();
		let direction = message.direction();
		let version = frame.version();

		let codec = self.registry.encoder(version, opcode, direction)?;

		let tracing_id = match direction {
			Direction::Request => None,
			Direction::Response => frame.tracing_id(),
		};

		let mut flags = HeaderFlags::empty();
		if frame.beta() {
			flags |= HeaderFlags::USE_BETA;
		}
		let tracing_flag = match direction {
			Direction::Request => frame.tracing(),
			Direction::Response => tracing_id.is_some(),
		};
		if tracing_flag {
			flags |= HeaderFlags::TRACING;
		}
		if !frame.custom_payload().is_empty() {
			flags |= HeaderFlags::CUSTOM_PAYLOAD;
		}
		if !frame.warnings().is_empty() {
			flags |= HeaderFlags::WARNING;
		}

		let body_size = tracing_id.map_or(0, |_| UUID_SIZE)
			+ if frame.custom_payload().is_empty() {
				0
			} else {
				bytes_map_size(frame.custom_payload())
			} + if frame.warnings().is_empty() {
				0
			} else {
				string_list_size(frame.warnings())
			} + codec
			.encoded_size(message, version)
			.with_context(|| format!("cannot size {opcode} body"))?;

		// STARTUP and OPTIONS negotiate compression; they are never
		// themselves compressed.
		let compressor = match opcode {
			Opcode::Startup | Opcode::Options => None,
			_ => self.compressor.as_deref(),
		};

		trace!(%opcode, %version, body_size, "encoding frame");

		let mut header = Header {
			direction,
			version,
			flags,
			stream: frame.stream(),
			opcode,
			body_length: body_length(body_size)?,
		};

		if let Some(compressor) = compressor {
			let mut scratch = Vec::with_capacity(body_size);
			Self::encode_body(frame, codec, tracing_id, &mut scratch)?;
			check_size(opcode, scratch.len(), body_size)?;

			let compressed = compressor
				.compress(&scratch)
				.context("cannot compress frame body")?;

			header.flags |= HeaderFlags::COMPRESSED;
			header.body_length = body_length(compressed.len())?;

			let mut output = Vec::with_capacity(Header::WIRE_SIZE + compressed.len());
			header.write_to(&mut output)?;
			output.extend_from_slice(&compressed);

			Ok(output)
		} else {
			let mut output = Vec::with_capacity(Header::WIRE_SIZE + body_size);
			header.write_to(&mut output)?;
			Self::encode_body(frame, codec, tracing_id, &mut output)?;
			check_size(opcode, output.len() - Header::WIRE_SIZE, body_size)?;

			Ok(output)
		}
	}

	fn encode_body(
		frame: &Frame,
		codec: &dyn BodyCodec,
		tracing_id: Option<Uuid>,
		output: &mut Vec<u8>,
	) -> Result<()> {
		if let Some(tracing_id) = tracing_id {
			write_uuid(tracing_id, output)?;
		}
		if !frame.custom_payload().is_empty() {
			write_bytes_map(frame.custom_payload(), output)
				.context("cannot write custom payload")?;
		}
		if !frame.warnings().is_empty() {
			write_string_list(frame.warnings(), output).context("cannot write warnings")?;
		}

		codec
			.encode(frame.message(), output, frame.version())
			.with_context(|| format!("cannot encode {} body", frame.message().opcode()))
	}

	/// Decodes one full frame from `input`.
	///
	/// The declared body length must equal the bytes present after the
	/// header, and the message body must consume them exactly; a frame is
	/// never partially surfaced.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::FrameLengthMismatch`] on a length
	/// disagreement, with [`ErrorKind::CodecNotFound`] when no decoder is
	/// registered for `(version, opcode, direction)` or a compressed
	/// frame arrives without a compressor, and with whatever the sidecar
	/// and body codecs fail with.
	pub fn decode(&self, input: &[u8]) -> Result<Frame> {
		let mut buf = input;
		let header = Header::read_from(&mut buf).context("cannot decode frame header")?;

		#[allow(clippy::cast_sign_loss)]
		let declared = header.body_length as usize;
		if declared != buf.remaining() {
			return Err(Error::new(ErrorKind::FrameLengthMismatch {
				declared: header.body_length,
				actual: buf.remaining(),
			}));
		}

		let beta = header.flags.contains(HeaderFlags::USE_BETA);
		if beta && header.version != ProtocolVersion::V5 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version: header.version,
				feature: "the beta protocol variant",
			}));
		}

		trace!(opcode = %header.opcode, version = %header.version, declared, "decoding frame");

		let decompressed;
		let mut body: &[u8] = if header.flags.contains(HeaderFlags::COMPRESSED) {
			let compressor = self.compressor.as_deref().ok_or_else(|| {
				Error::new(ErrorKind::CodecNotFound {
					version: header.version,
					what: "a compressor for the compressed frame".to_owned(),
				})
			})?;

			decompressed = compressor
				.decompress(buf)
				.context("cannot decompress frame body")?;
			&decompressed
		} else {
			buf
		};

		let mut tracing = false;
		let mut tracing_id = None;
		if header.flags.contains(HeaderFlags::TRACING) {
			match header.direction {
				Direction::Request => tracing = true,
				Direction::Response => {
					tracing_id = Some(read_uuid(&mut body).context("cannot read tracing id")?);
				},
			}
		}

		let custom_payload = if header.flags.contains(HeaderFlags::CUSTOM_PAYLOAD) {
			if header.version < ProtocolVersion::V4 {
				return Err(Error::new(ErrorKind::UnsupportedInVersion {
					version: header.version,
					feature: "custom payloads",
				}));
			}

			read_bytes_map(&mut body).context("cannot read custom payload")?
		} else {
			HashMap::new()
		};

		let warnings = if header.flags.contains(HeaderFlags::WARNING) {
			if header.version < ProtocolVersion::V4 {
				return Err(Error::new(ErrorKind::UnsupportedInVersion {
					version: header.version,
					feature: "warnings",
				}));
			}

			match header.direction {
				Direction::Request => Vec::new(),
				Direction::Response => {
					read_string_list(&mut body).context("cannot read warnings")?
				},
			}
		} else {
			Vec::new()
		};

		let codec = self
			.registry
			.decoder(header.version, header.opcode, header.direction)?;
		let message = codec
			.decode(&mut body, header.version)
			.with_context(|| format!("cannot decode {} body", header.opcode))?;

		if body.remaining() != 0 {
			return Err(Error::new(ErrorKind::InvalidLength {
				length: body.remaining() as i64,
				expected: "no bytes after the message body",
			}));
		}

		Ok(Frame {
			version: header.version,
			beta,
			stream: header.stream,
			tracing,
			tracing_id,
			custom_payload,
			warnings,
			message,
		})
	}
}

fn body_length(size: usize) -> Result<i32> {
	i32::try_from(size).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: size as i64,
			expected: "a body no longer than 2147483647 bytes",
		})
	})
}

fn check_size(opcode: Opcode, written: usize, computed: usize) -> Result<()> {
	if written != computed {
		return Err(Error::new(ErrorKind::IntegrityViolation {
			detail: format!("{opcode} body wrote {written} bytes, but its size came to {computed}"),
		}));
	}

	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::message::{Options, Query, Ready, Startup, Supported};
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	struct FlipCompressor;

	impl Compressor for FlipCompressor {
		fn algorithm(&self) -> &str {
			"flip"
		}

		fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
			Ok(input.iter().map(|byte| byte ^ 0x5A).collect())
		}

		fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
			Ok(input.iter().map(|byte| byte ^ 0x5A).collect())
		}
	}

	fn startup_frame(version: ProtocolVersion) -> Frame {
		Frame::new(version, 1, Startup::default())
	}

	#[test]
	fn test_startup_frame_bytes() {
		let encoded = FrameCodec::client().encode(&startup_frame(V4)).unwrap();

		let expected = hex::decode(concat!(
			"040000010100000016",
			"0001000b43514c5f56455253494f4e0005332e302e30",
		))
		.unwrap();
		assert_eq!(encoded, expected);
	}

	#[test]
	fn test_ready_frame_bytes() {
		let encoded = FrameCodec::server()
			.encode(&Frame::new(V4, 1, Ready))
			.unwrap();

		assert_eq!(encoded, hex::decode("840000010200000000").unwrap());
	}

	#[test]
	fn test_tracing_id_sits_first_in_the_body() {
		let tracing_id = Uuid::parse_str("C0D1D21E-BB01-4196-86DB-BC317BC1796A").unwrap();
		let frame = Frame::new(V4, 1, Ready).with_tracing_id(tracing_id).unwrap();

		let encoded = FrameCodec::server().encode(&frame).unwrap();

		assert_eq!(encoded[1], 0x02);
		assert_eq!(&encoded[9..25], tracing_id.as_bytes());

		let decoded = FrameCodec::client().decode(&encoded).unwrap();
		assert_eq!(decoded.tracing_id(), Some(tracing_id));
		assert_eq!(decoded, frame);
	}

	#[test]
	fn test_round_trip_with_payload_and_warnings() {
		let frame = Frame::new(V4, 7, Supported::default())
			.with_custom_payload([("k".to_owned(), Some(vec![1, 2]))].into())
			.unwrap()
			.with_warnings(vec!["a warning".to_owned()])
			.unwrap();

		let encoded = FrameCodec::server().encode(&frame).unwrap();
		let decoded = FrameCodec::client().decode(&encoded).unwrap();

		assert_eq!(decoded, frame);
	}

	#[test]
	fn test_sidecars_need_version_four() {
		assert!(matches!(
			Frame::new(V3, 0, Ready)
				.with_custom_payload([("k".to_owned(), None)].into())
				.unwrap_err()
				.kind(),
			ErrorKind::UnsupportedInVersion {
				feature: "custom payloads",
				..
			}
		));

		// A v3 frame with the custom-payload flag set on the wire is just
		// as invalid as one we refuse to build.
		let bytes = hex::decode("8304000002000000020000").unwrap();
		let error = FrameCodec::client().decode(&bytes).unwrap_err();
		assert!(matches!(
			error.kind(),
			ErrorKind::UnsupportedInVersion {
				feature: "custom payloads",
				..
			}
		));
	}

	#[test]
	fn test_beta_marker_round_trips_on_v5_only() {
		let frame = Frame::new(V5, 0, Options).with_beta().unwrap();
		let encoded = FrameCodec::client().encode(&frame).unwrap();

		assert_eq!(encoded[1], 0x10);
		assert_eq!(FrameCodec::server().decode(&encoded).unwrap(), frame);

		assert!(Frame::new(V4, 0, Options).with_beta().is_err());
	}

	#[test]
	fn test_declared_length_must_match() {
		let mut encoded = FrameCodec::server()
			.encode(&Frame::new(V4, 1, Ready))
			.unwrap();
		encoded[8] = 4;

		assert!(matches!(
			FrameCodec::client().decode(&encoded).unwrap_err().kind(),
			ErrorKind::FrameLengthMismatch {
				declared: 4,
				actual: 0
			}
		));
	}

	#[test]
	fn test_trailing_garbage_is_rejected() {
		let mut encoded = FrameCodec::server()
			.encode(&Frame::new(V4, 1, Ready))
			.unwrap();
		encoded.extend([0xDE, 0xAD]);
		encoded[8] = 2;

		assert!(matches!(
			FrameCodec::client().decode(&encoded).unwrap_err().kind(),
			ErrorKind::InvalidLength { length: 2, .. }
		));
	}

	#[test]
	fn test_query_body_is_compressed() {
		let codec =
			FrameCodec::new(CodecRegistry::client(), Some(Box::new(FlipCompressor)));
		let frame = Frame::new(
			V4,
			3,
			Query::new("SELECT cql_version FROM system.local"),
		);

		let encoded = codec.encode(&frame).unwrap();
		assert_eq!(encoded[1], 0x01);

		// A codec without the compressor cannot decode it...
		assert!(matches!(
			FrameCodec::server().decode(&encoded).unwrap_err().kind(),
			ErrorKind::CodecNotFound { .. }
		));

		// ...one with it gets the frame back.
		let decoder =
			FrameCodec::new(CodecRegistry::server(), Some(Box::new(FlipCompressor)));
		assert_eq!(decoder.decode(&encoded).unwrap(), frame);
	}

	#[test]
	fn test_startup_and_options_bypass_compression() {
		let codec =
			FrameCodec::new(CodecRegistry::client(), Some(Box::new(FlipCompressor)));

		for frame in [startup_frame(V4), Frame::new(V4, 0, Options)] {
			let encoded = codec.encode(&frame).unwrap();

			assert_eq!(encoded[1], 0x00);
			assert_eq!(FrameCodec::server().decode(&encoded).unwrap(), frame);
		}
	}

	#[test]
	fn test_truncation_never_panics() {
		let tracing_id = Uuid::parse_str("C0D1D21E-BB01-4196-86DB-BC317BC1796A").unwrap();
		let frame = Frame::new(V4, 9, Supported::default())
			.with_tracing_id(tracing_id)
			.unwrap()
			.with_warnings(vec!["w".to_owned()])
			.unwrap();
		let mut encoded = FrameCodec::server().encode(&frame).unwrap();

		for cut in 0..encoded.len() {
			assert!(FrameCodec::client().decode(&encoded[..cut]).is_err());
		}

		// Shrinking the input without fixing the declared length is a
		// mismatch, not a short read past the frame.
		encoded.truncate(encoded.len() - 1);
		assert!(matches!(
			FrameCodec::client().decode(&encoded).unwrap_err().kind(),
			ErrorKind::FrameLengthMismatch { .. }
		));
	}
}
