// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The protocol version every codec operation is parameterized by.
//!
//! The version is always an explicit argument, never module state: one
//! process may speak different versions on different connections, and the
//! codec has to be safe to share between them.

use std::fmt;

use crate::error::{Error, ErrorKind, Result};

/// A revision of the native protocol.
///
/// The "beta" marker that version 5 can carry is not part of this type: it
/// is layout-neutral, lives in a header flag, and is tracked by the frame
/// that sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
	/// Protocol version 3.
	V3,
	/// Protocol version 4.
	V4,
	/// Protocol version 5.
	V5,
}

impl ProtocolVersion {
	/// Every supported version, oldest first.
	pub const ALL: [Self; 3] = [Self::V3, Self::V4, Self::V5];

	/// The numeric value carried in the low seven bits of the first header
	/// byte.
	#[must_use]
	pub const fn number(self) -> u8 {
		match self {
			Self::V3 => 3,
			Self::V4 => 4,
			Self::V5 => 5,
		}
	}
}

impl TryFrom<u8> for ProtocolVersion {
	type Error = Error;

	fn try_from(number: u8) -> Result<Self> {
		match number {
			3 => Ok(Self::V3),
			4 => Ok(Self::V4),
			5 => Ok(Self::V5),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "protocol version",
				tag: other.to_string(),
			})),
		}
	}
}

impl fmt::Display for ProtocolVersion {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.number())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_numbers_round_trip() {
		for version in ProtocolVersion::ALL {
			assert_eq!(ProtocolVersion::try_from(version.number()), Ok(version));
		}
	}

	#[test]
	fn test_unknown_number_is_rejected() {
		let error = ProtocolVersion::try_from(2).unwrap_err();

		assert!(matches!(error.kind(), ErrorKind::UnknownTag { kind, .. } if *kind == "protocol version"));
	}

	#[test]
	fn test_versions_are_ordered() {
		assert!(ProtocolVersion::V3 < ProtocolVersion::V4);
		assert!(ProtocolVersion::V4 < ProtocolVersion::V5);
	}
}
