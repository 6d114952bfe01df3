// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The compression capability injected into the frame codec.
//!
//! No algorithm is baked in: whoever owns the connection negotiates one
//! through `STARTUP`/`SUPPORTED` and hands the codec an implementation of
//! this trait. The codec applies it to everything after the header -
//! sidecars included - except on `STARTUP` and `OPTIONS`, which are
//! exchanged before negotiation completes.

use cqlkit::Result;

/// A negotiated compression algorithm.
pub trait Compressor: Send + Sync {
	/// The algorithm name as it appears in `STARTUP` options and
	/// `SUPPORTED` responses, e.g. `lz4` or `snappy`.
	fn algorithm(&self) -> &str;

	/// Compresses `input` in full.
	///
	/// # Errors
	///
	/// Whatever the algorithm considers a failure; the codec forwards it.
	fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

	/// Decompresses `input` in full.
	///
	/// # Errors
	///
	/// Whatever the algorithm considers a failure; the codec forwards it.
	fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}
