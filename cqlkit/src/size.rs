// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`WireSize`] and [`ConstantWireSize`] implementations for primitive types

use crate::{ConstantWireSize, WireSize};

/// Simple macro for easily defining size for primitive types
macro_rules! constant_wire_size {
	($($type:ty),+$(,)?) => {
		$(
			impl ConstantWireSize for $type {
				const WIRE_SIZE: usize = std::mem::size_of::<Self>();
			}

			impl WireSize for $type {
				fn wire_size(&self) -> usize {
					Self::WIRE_SIZE
				}
			}
		)+
	};
}

constant_wire_size! {
	i8,
	i16,
	i32,
	i64,

	u8,
	u16,
	u32,
}

impl<T: WireSize> WireSize for Vec<T> {
	fn wire_size(&self) -> usize {
		self.iter().map(WireSize::wire_size).sum()
	}
}

impl<T: WireSize> WireSize for [T] {
	fn wire_size(&self) -> usize {
		self.iter().map(WireSize::wire_size).sum()
	}
}

impl<T: WireSize> WireSize for &T {
	fn wire_size(&self) -> usize {
		T::wire_size(self)
	}
}

impl<T: WireSize> WireSize for Box<T> {
	fn wire_size(&self) -> usize {
		T::wire_size(self)
	}
}

#[cfg(test)]
mod test {
	use super::WireSize;

	#[test]
	fn test_wire_size_vec() {
		let data = vec![i16::default(); 100];
		assert_eq!(data.wire_size(), 200);
	}

	#[test]
	fn test_wire_size_boxed() {
		let data = Box::new(7_u32);
		assert_eq!(data.wire_size(), 4);
	}
}
