// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checked reads and writes over [`Buf`] and [`BufMut`].
//!
//! The raw `bytes` accessors panic when the buffer runs out. The `try_`
//! variants here check `remaining`/`remaining_mut` first and fail with
//! [`ErrorKind::ShortBuffer`], which is what every higher codec layer
//! builds its bounded-read guarantee on.

use bytes::{Buf, BufMut};

use crate::error::{Error, ErrorKind, Result};

fn ensure(needed: usize, remaining: usize) -> Result<()> {
	if remaining < needed {
		return Err(Error::new(ErrorKind::ShortBuffer { needed, remaining }));
	}

	Ok(())
}

macro_rules! checked_get {
	($($(#[$meta:meta])* $name:ident, $get:ident -> $ty:ty),*$(,)?) => {
		$(
			$(#[$meta])*
			///
			/// # Errors
			///
			/// Fails with [`ErrorKind::ShortBuffer`] when the buffer is
			/// exhausted.
			fn $name(&mut self) -> Result<$ty> {
				ensure(std::mem::size_of::<$ty>(), self.remaining())?;

				Ok(self.$get())
			}
		)*
	};
}

macro_rules! checked_put {
	($($(#[$meta:meta])* $name:ident, $put:ident($ty:ty)),*$(,)?) => {
		$(
			$(#[$meta])*
			///
			/// # Errors
			///
			/// Fails with [`ErrorKind::ShortBuffer`] when the writer is out
			/// of capacity.
			fn $name(&mut self, value: $ty) -> Result<()> {
				ensure(std::mem::size_of::<$ty>(), self.remaining_mut())?;
				self.$put(value);

				Ok(())
			}
		)*
	};
}

/// Non-panicking, big-endian reads over any [`Buf`].
pub trait BufExt: Buf {
	checked_get! {
		/// Reads one unsigned byte.
		try_get_u8, get_u8 -> u8,
		/// Reads one signed byte.
		try_get_i8, get_i8 -> i8,
		/// Reads an unsigned 16-bit integer.
		try_get_u16, get_u16 -> u16,
		/// Reads a signed 16-bit integer.
		try_get_i16, get_i16 -> i16,
		/// Reads an unsigned 32-bit integer.
		try_get_u32, get_u32 -> u32,
		/// Reads a signed 32-bit integer.
		try_get_i32, get_i32 -> i32,
		/// Reads a signed 64-bit integer.
		try_get_i64, get_i64 -> i64,
	}

	/// Fills `destination` from the buffer.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] when fewer than
	/// `destination.len()` bytes remain; the buffer is left untouched.
	fn try_copy_to_slice(&mut self, destination: &mut [u8]) -> Result<()> {
		ensure(destination.len(), self.remaining())?;
		self.copy_to_slice(destination);

		Ok(())
	}

	/// Reads `length` bytes into a freshly allocated `Vec`.
	///
	/// The length is validated against the buffer before anything is
	/// allocated, so a hostile length prefix cannot drive an allocation
	/// past the input.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] when fewer than `length` bytes
	/// remain.
	fn try_copy_to_vec(&mut self, length: usize) -> Result<Vec<u8>> {
		ensure(length, self.remaining())?;

		let mut content = vec![0; length];
		self.copy_to_slice(&mut content);

		Ok(content)
	}
}

impl<B: Buf + ?Sized> BufExt for B {}

/// Non-panicking, big-endian writes over any [`BufMut`].
///
/// Growable writers such as `Vec<u8>` report effectively unbounded
/// capacity, so the checks only bite on fixed-size writers.
pub trait BufMutExt: BufMut {
	checked_put! {
		/// Writes one unsigned byte.
		try_put_u8, put_u8(u8),
		/// Writes one signed byte.
		try_put_i8, put_i8(i8),
		/// Writes an unsigned 16-bit integer.
		try_put_u16, put_u16(u16),
		/// Writes a signed 16-bit integer.
		try_put_i16, put_i16(i16),
		/// Writes an unsigned 32-bit integer.
		try_put_u32, put_u32(u32),
		/// Writes a signed 32-bit integer.
		try_put_i32, put_i32(i32),
		/// Writes a signed 64-bit integer.
		try_put_i64, put_i64(i64),
	}

	/// Writes all of `source`.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] when the writer cannot take
	/// `source.len()` more bytes; nothing is written.
	fn try_put_slice(&mut self, source: &[u8]) -> Result<()> {
		ensure(source.len(), self.remaining_mut())?;
		self.put_slice(source);

		Ok(())
	}
}

impl<B: BufMut + ?Sized> BufMutExt for B {}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_short_read_reports_both_sizes() {
		let mut buf = &[0_u8; 3][..];

		let error = buf.try_get_u32().unwrap_err();

		assert!(matches!(
			error.kind(),
			ErrorKind::ShortBuffer {
				needed: 4,
				remaining: 3
			}
		));
	}

	#[test]
	fn test_short_read_leaves_buffer_untouched() {
		let mut buf = &[1_u8, 2][..];

		assert!(buf.try_get_i32().is_err());
		assert_eq!(buf.remaining(), 2);
		assert_eq!(buf.try_get_u16().unwrap(), 0x0102);
	}

	#[test]
	fn test_short_write_fails_on_fixed_buffer() {
		let mut storage = [0_u8; 2];
		let mut buf = &mut storage[..];

		let error = buf.try_put_u32(7).unwrap_err();

		assert!(matches!(
			error.kind(),
			ErrorKind::ShortBuffer {
				needed: 4,
				remaining: 2
			}
		));
	}

	#[test]
	fn test_vec_writer_grows() {
		let mut buf = Vec::new();

		buf.try_put_u16(0xCA_FE).unwrap();
		buf.try_put_slice(&[1, 2, 3]).unwrap();

		assert_eq!(buf, [0xCA, 0xFE, 1, 2, 3]);
	}

	#[test]
	fn test_copy_to_vec_checks_before_allocating() {
		let mut buf = &[0_u8; 4][..];

		// A hostile length prefix far past the input must not allocate.
		assert!(buf.try_copy_to_vec(usize::MAX).is_err());
		assert_eq!(buf.try_copy_to_vec(4).unwrap(), vec![0; 4]);
	}
}
