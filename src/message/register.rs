// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `REGISTER` request.

use bytes::{Buf, BufMut};
use cqlkit::{ConstantWireSize, ProtocolVersion, Result, ResultExt};

use super::body_codec;
use super::event::EventType;
use crate::primitive::{read_string_list, string_size, write_string};
use cqlkit::BufMutExt;

/// Subscribes the connection to server events. Answered by `READY`;
/// matching events then arrive as `EVENT` frames on stream `-1`. The body
/// is a `[string list]` of event type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
	/// The event classes to subscribe to.
	pub event_types: Vec<EventType>,
}

impl Register {
	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		Ok(u16::WIRE_SIZE
			+ self
				.event_types
				.iter()
				.map(|event_type| string_size(event_type.as_str()))
				.sum::<usize>())
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, _version: ProtocolVersion) -> Result<()> {
		#[allow(clippy::cast_possible_truncation)]
		buf.try_put_u16(self.event_types.len() as u16)?;

		for event_type in &self.event_types {
			write_string(event_type.as_str(), buf)?;
		}

		Ok(())
	}

	pub(crate) fn decode(buf: &mut impl Buf, _version: ProtocolVersion) -> Result<Self> {
		let names = read_string_list(buf).context("cannot read event types")?;
		let event_types = names
			.iter()
			.map(|name| EventType::from_wire(name))
			.collect::<Result<_>>()?;

		Ok(Self { event_types })
	}
}

body_codec! {
	/// Codec for [`Register`].
	RegisterCodec, Register, Register
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::V3;

	#[test]
	fn test_round_trip() {
		let register = Register {
			event_types: vec![EventType::TopologyChange, EventType::SchemaChange],
		};
		let mut buf = Vec::new();
		register.encode(&mut buf, V3).unwrap();

		assert_eq!(buf.len(), register.encoded_size(V3).unwrap());
		assert_eq!(Register::decode(&mut &buf[..], V3).unwrap(), register);
	}

	#[test]
	fn test_unknown_event_type_is_rejected() {
		let buf = [0x00, 0x01, 0x00, 0x03, b'F', b'O', b'O'];

		assert!(Register::decode(&mut &buf[..], V3).is_err());
	}
}
