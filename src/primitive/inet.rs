// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Address notations: `[inetaddr]`, `[inet]`, and the reason map.
//!
//! `[inetaddr]` is an address alone - a 1-byte length of 4 or 16 followed
//! by the raw address bytes. `[inet]` appends a 32-bit port. The reason
//! map, used by failure error bodies from protocol version 5 onwards, is
//! an `[int]` count of `([inetaddr], [short])` entries - note the wider
//! count prefix and the port-less keys.

use std::fmt;
use std::net::IpAddr;

use bytes::{Buf, BufMut};
use cqlkit::{BufExt, BufMutExt, ConstantWireSize, Error, ErrorKind, Result, ResultExt, WireSize};

const V4_LENGTH: u8 = 4;
const V6_LENGTH: u8 = 16;

/// An address and port as carried by `STATUS_CHANGE` and `TOPOLOGY_CHANGE`
/// events.
///
/// The port is signed 32-bit because that is what the wire carries, even
/// though real ports fit 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inet {
	/// The IP address, v4 or v6.
	pub addr: IpAddr,
	/// The port.
	pub port: i32,
}

impl fmt::Display for Inet {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.addr {
			IpAddr::V4(addr) => write!(f, "{addr}:{}", self.port),
			IpAddr::V6(addr) => write!(f, "[{addr}]:{}", self.port),
		}
	}
}

impl WireSize for Inet {
	fn wire_size(&self) -> usize {
		inetaddr_size(&self.addr) + i32::WIRE_SIZE
	}
}

/// Reads an `[inetaddr]`.
///
/// # Errors
///
/// Fails when the length byte is neither 4 nor 16, or on a short buffer.
pub fn read_inetaddr(buf: &mut impl Buf) -> Result<IpAddr> {
	let length = buf
		.try_get_u8()
		.context("cannot read inet address length")?;

	match length {
		V4_LENGTH => {
			let mut raw = [0; 4];
			buf.try_copy_to_slice(&mut raw)
				.context("cannot read inet address")?;

			Ok(IpAddr::from(raw))
		},
		V6_LENGTH => {
			let mut raw = [0; 16];
			buf.try_copy_to_slice(&mut raw)
				.context("cannot read inet address")?;

			Ok(IpAddr::from(raw))
		},
		other => Err(Error::new(ErrorKind::InvalidLength {
			length: i64::from(other),
			expected: "an inet address length of 4 or 16",
		})),
	}
}

/// Writes an `[inetaddr]`.
///
/// # Errors
///
/// Fails on a writer out of capacity.
pub fn write_inetaddr(addr: &IpAddr, buf: &mut impl BufMut) -> Result<()> {
	match addr {
		IpAddr::V4(addr) => {
			buf.try_put_u8(V4_LENGTH)?;
			buf.try_put_slice(&addr.octets())
		},
		IpAddr::V6(addr) => {
			buf.try_put_u8(V6_LENGTH)?;
			buf.try_put_slice(&addr.octets())
		},
	}
}

/// The encoded size of an `[inetaddr]`.
#[must_use]
pub fn inetaddr_size(addr: &IpAddr) -> usize {
	u8::WIRE_SIZE
		+ match addr {
			IpAddr::V4(_) => 4,
			IpAddr::V6(_) => 16,
		}
}

/// Reads an `[inet]`: address then 32-bit port.
///
/// # Errors
///
/// Fails when the address fails or on a short buffer.
pub fn read_inet(buf: &mut impl Buf) -> Result<Inet> {
	let addr = read_inetaddr(buf)?;
	let port = buf.try_get_i32().context("cannot read inet port")?;

	Ok(Inet { addr, port })
}

/// Writes an `[inet]`.
///
/// # Errors
///
/// Fails on a writer out of capacity.
pub fn write_inet(inet: &Inet, buf: &mut impl BufMut) -> Result<()> {
	write_inetaddr(&inet.addr, buf)?;
	buf.try_put_i32(inet.port)
}

/// Reads a reason map, preserving entry order.
///
/// # Errors
///
/// Fails on a negative count or when any entry fails.
pub fn read_reason_map(buf: &mut impl Buf) -> Result<Vec<(IpAddr, u16)>> {
	let count = buf.try_get_i32().context("cannot read reason map count")?;
	let count = usize::try_from(count).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: i64::from(count),
			expected: "a non-negative reason map count",
		})
	})?;

	let mut reasons = Vec::with_capacity(count.min(1024));

	for index in 0..count {
		let addr = read_inetaddr(buf)
			.with_context(|| format!("cannot read reason map endpoint {index}"))?;
		let code = buf
			.try_get_u16()
			.with_context(|| format!("cannot read reason map code {index}"))?;

		reasons.push((addr, code));
	}

	Ok(reasons)
}

/// Writes a reason map in the order given.
///
/// # Errors
///
/// Fails when the map does not fit a signed 32-bit count, or on a writer
/// out of capacity.
pub fn write_reason_map(reasons: &[(IpAddr, u16)], buf: &mut impl BufMut) -> Result<()> {
	let count = i32::try_from(reasons.len()).map_err(|_| {
		Error::new(ErrorKind::InvalidLength {
			length: reasons.len() as i64,
			expected: "a reason map of no more than 2147483647 entries",
		})
	})?;

	buf.try_put_i32(count)?;

	for (addr, code) in reasons {
		write_inetaddr(addr, buf)?;
		buf.try_put_u16(*code)?;
	}

	Ok(())
}

/// The encoded size of a reason map.
#[must_use]
pub fn reason_map_size(reasons: &[(IpAddr, u16)]) -> usize {
	i32::WIRE_SIZE
		+ reasons
			.iter()
			.map(|(addr, _)| inetaddr_size(addr) + u16::WIRE_SIZE)
			.sum::<usize>()
}

#[cfg(test)]
mod test {
	use super::*;
	use std::net::{Ipv4Addr, Ipv6Addr};

	#[test]
	fn test_inet_endpoint_wire_shape() {
		let inet = Inet {
			addr: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
			port: 9042,
		};
		let mut buf = Vec::new();
		write_inet(&inet, &mut buf).unwrap();

		assert_eq!(buf, [0x04, 0xC0, 0xA8, 0x01, 0x01, 0x00, 0x00, 0x23, 0x52]);
		assert_eq!(buf.len(), inet.wire_size());
		assert_eq!(read_inet(&mut &buf[..]).unwrap(), inet);
	}

	#[test]
	fn test_v6_address_round_trip() {
		let addr = IpAddr::V6(Ipv6Addr::LOCALHOST);
		let mut buf = Vec::new();
		write_inetaddr(&addr, &mut buf).unwrap();

		assert_eq!(buf.len(), inetaddr_size(&addr));
		assert_eq!(buf[0], 16);
		assert_eq!(read_inetaddr(&mut &buf[..]).unwrap(), addr);
	}

	#[test]
	fn test_bad_address_length_is_rejected() {
		let bytes = [0x05, 1, 2, 3, 4, 5];

		assert!(matches!(
			read_inetaddr(&mut &bytes[..]).unwrap_err().kind(),
			ErrorKind::InvalidLength { length: 5, .. }
		));
	}

	#[test]
	fn test_reason_map_round_trip_preserves_order() {
		let reasons = vec![
			(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 0x0001_u16),
			(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 0x0002),
		];
		let mut buf = Vec::new();
		write_reason_map(&reasons, &mut buf).unwrap();

		assert_eq!(buf.len(), reason_map_size(&reasons));
		assert_eq!(&buf[..4], [0x00, 0x00, 0x00, 0x02]);
		assert_eq!(read_reason_map(&mut &buf[..]).unwrap(), reasons);
	}

	#[test]
	fn test_reason_map_rejects_negative_count() {
		let bytes = [0xFF, 0xFF, 0xFF, 0xFF];

		assert!(matches!(
			read_reason_map(&mut &bytes[..]).unwrap_err().kind(),
			ErrorKind::InvalidLength { length: -1, .. }
		));
	}
}
