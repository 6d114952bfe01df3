// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Writable`] implementations for primitive types

use crate::buf::BufMutExt;
use crate::{Result, Writable};

use bytes::BufMut;

macro_rules! implement {
	($($ident:ident: &$ty:ty => $put:ident),*$(,)?) => {
		$(
			impl $crate::Writable for $ty {
				fn write_to(&self, writer: &mut impl bytes::BufMut) -> $crate::Result<()> {
					let $ident = self;
					writer.$put(*$ident)?;

					Ok(())
				}
			}
		)*
	};
}

implement! {
	n: &i8 => try_put_i8,
	n: &i16 => try_put_i16,
	n: &i32 => try_put_i32,
	n: &i64 => try_put_i64,

	n: &u8 => try_put_u8,
	n: &u16 => try_put_u16,
	n: &u32 => try_put_u32,
}

impl<T: Writable> Writable for Vec<T> {
	fn write_to(&self, writer: &mut impl BufMut) -> Result<()> {
		for x in self {
			x.write_to(writer)?;
		}

		Ok(())
	}
}

impl<T: Writable> Writable for &T {
	fn write_to(&self, writer: &mut impl BufMut) -> Result<()> {
		T::write_to(self, writer)?;

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use crate::Writable;

	#[test]
	fn test_integers_write_big_endian() {
		let mut buf = Vec::new();

		258_u16.write_to(&mut buf).unwrap();
		(-2_i32).write_to(&mut buf).unwrap();

		assert_eq!(buf, [0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFE]);
	}

	#[test]
	fn test_write_past_capacity_is_an_error() {
		let mut storage = [0_u8; 3];
		let mut buf = &mut storage[..];

		assert!(7_i64.write_to(&mut buf).is_err());
	}
}
