// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fixed 9-byte header every frame starts with.
//!
//! The first byte packs the direction into its high bit and the protocol
//! version into the low seven. Then one flags byte, a signed 16-bit stream
//! id, the opcode, and the signed 32-bit length of everything after the
//! header.

use bitflags::bitflags;
use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	Readable,
	Result,
	ResultExt,
	Writable,
	WireSize,
};

use crate::opcode::Opcode;

const DIRECTION_BIT: u8 = 0x80;

/// Whether a frame travels towards the server or away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
	/// Client to server.
	Request,
	/// Server to client.
	Response,
}

impl std::fmt::Display for Direction {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(match self {
			Self::Request => "request",
			Self::Response => "response",
		})
	}
}

bitflags! {
	/// Flags applying to a frame.
	///
	/// - `COMPRESSED`: the body is compressed with the connection's
	///   negotiated algorithm. Never set on `STARTUP` or `OPTIONS`, which
	///   are exchanged before compression is negotiated.
	/// - `TRACING`: on a request, asks the server to trace it; on a
	///   response, the body starts with a 16-byte tracing id.
	/// - `CUSTOM_PAYLOAD`: the body carries a `[bytes map]` after the
	///   tracing id, if any. Protocol version 4 onwards.
	/// - `WARNING`: a response body carries a `[string list]` of warnings
	///   after the earlier sidecars. Protocol version 4 onwards.
	/// - `USE_BETA`: the frame opts into the version 5 "beta" variant.
	///   Layout-neutral, but round-trips.
	///
	/// The remaining bits are unused and ignored.
	pub struct HeaderFlags: u8 {
		/// The frame body is compressed.
		const COMPRESSED = 0x01;
		/// Tracing requested (request) or tracing id present (response).
		const TRACING = 0x02;
		/// A custom payload is present.
		const CUSTOM_PAYLOAD = 0x04;
		/// Warnings are present.
		const WARNING = 0x08;
		/// The version 5 beta variant is in use.
		const USE_BETA = 0x10;
	}
}

/// The full header of a frame: direction, protocol version, flags, stream
/// id, opcode, and body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	/// Request or response, from the high bit of the first byte.
	pub direction: Direction,
	/// The protocol version, from the low seven bits of the first byte.
	pub version: ProtocolVersion,
	/// The frame flags.
	pub flags: HeaderFlags,
	/// The stream id. Responses carry the id of the request they answer;
	/// server-initiated frames (events) carry `-1`.
	pub stream: i16,
	/// The opcode of the message in the body.
	pub opcode: Opcode,
	/// The number of body bytes following the header.
	pub body_length: i32,
}

impl ConstantWireSize for Header {
	const WIRE_SIZE: usize = 9;
}

impl WireSize for Header {
	fn wire_size(&self) -> usize {
		Self::WIRE_SIZE
	}
}

impl Readable for Header {
	fn read_from(reader: &mut impl bytes::Buf) -> Result<Self> {
		let version_byte = reader
			.try_get_u8()
			.context("cannot read frame version byte")?;
		let direction = if version_byte & DIRECTION_BIT == 0 {
			Direction::Request
		} else {
			Direction::Response
		};
		let version = ProtocolVersion::try_from(version_byte & !DIRECTION_BIT)
			.context("cannot read frame version")?;

		let flags = HeaderFlags::from_bits_truncate(
			reader.try_get_u8().context("cannot read frame flags")?,
		);
		let stream = reader
			.try_get_i16()
			.context("cannot read frame stream id")?;
		let opcode = Opcode::try_from(reader.try_get_u8().context("cannot read frame opcode")?)
			.context("cannot read frame opcode")?;
		let body_length = reader
			.try_get_i32()
			.context("cannot read frame body length")?;

		if body_length < 0 {
			return Err(Error::new(ErrorKind::InvalidLength {
				length: i64::from(body_length),
				expected: "a non-negative body length",
			}));
		}

		Ok(Self {
			direction,
			version,
			flags,
			stream,
			opcode,
			body_length,
		})
	}
}

impl Writable for Header {
	fn write_to(&self, writer: &mut impl bytes::BufMut) -> Result<()> {
		let direction_bit = match self.direction {
			Direction::Request => 0,
			Direction::Response => DIRECTION_BIT,
		};

		writer.try_put_u8(direction_bit | self.version.number())?;
		writer.try_put_u8(self.flags.bits())?;
		writer.try_put_i16(self.stream)?;
		writer.try_put_u8(self.opcode as u8)?;
		writer.try_put_i32(self.body_length)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V4, V5};

	#[test]
	fn test_ready_response_header() {
		let header = Header {
			direction: Direction::Response,
			version: V4,
			flags: HeaderFlags::empty(),
			stream: 1,
			opcode: Opcode::Ready,
			body_length: 0,
		};
		let mut buf = Vec::new();
		header.write_to(&mut buf).unwrap();

		assert_eq!(buf, [0x84, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00]);
		assert_eq!(Header::read_from(&mut &buf[..]).unwrap(), header);
	}

	#[test]
	fn test_negative_stream_id_round_trips() {
		let header = Header {
			direction: Direction::Response,
			version: V4,
			flags: HeaderFlags::empty(),
			stream: -1,
			opcode: Opcode::Event,
			body_length: 0,
		};
		let mut buf = Vec::new();
		header.write_to(&mut buf).unwrap();

		assert_eq!(Header::read_from(&mut &buf[..]).unwrap().stream, -1);
	}

	#[test]
	fn test_unused_flag_bits_are_ignored() {
		let buf = [0x85, 0xE0, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];

		let header = Header::read_from(&mut &buf[..]).unwrap();

		assert_eq!(header.version, V5);
		assert_eq!(header.flags, HeaderFlags::empty());
	}

	#[test]
	fn test_unknown_version_is_rejected() {
		let buf = [0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];

		assert!(matches!(
			Header::read_from(&mut &buf[..]).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "protocol version",
				..
			}
		));
	}

	#[test]
	fn test_negative_body_length_is_rejected() {
		let buf = [0x04, 0x00, 0x00, 0x00, 0x05, 0xFF, 0xFF, 0xFF, 0xFF];

		assert!(matches!(
			Header::read_from(&mut &buf[..]).unwrap_err().kind(),
			ErrorKind::InvalidLength { .. }
		));
	}
}
