// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Readable`] implementations for primitive types

use crate::buf::BufExt;

macro_rules! implement {
	($($reader:ident, $ty:ty => $expr:expr),*$(,)?) => {
		$(
			impl $crate::Readable for $ty {
				fn read_from($reader: &mut impl bytes::Buf) -> $crate::Result<Self> {
					Ok($expr)
				}
			}
		)*
	};
}

implement! {
	reader, i8 => reader.try_get_i8()?,
	reader, i16 => reader.try_get_i16()?,
	reader, i32 => reader.try_get_i32()?,
	reader, i64 => reader.try_get_i64()?,

	reader, u8 => reader.try_get_u8()?,
	reader, u16 => reader.try_get_u16()?,
	reader, u32 => reader.try_get_u32()?,
}

#[cfg(test)]
mod test {
	use crate::Readable;

	#[test]
	fn test_integers_read_big_endian() {
		let mut buf = &[0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFE][..];

		assert_eq!(u16::read_from(&mut buf).unwrap(), 1);
		assert_eq!(i32::read_from(&mut buf).unwrap(), -2);
	}

	#[test]
	fn test_truncated_integer_is_an_error() {
		let mut buf = &[0x00][..];

		assert!(i64::read_from(&mut buf).is_err());
	}
}
