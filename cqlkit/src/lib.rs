// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Deny the following clippy lints to enforce them:
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
// Warn for these lints, rather than denying them.
#![warn(clippy::use_self)]
// Warn for pedantic & cargo lints. They are allowed completely by default.
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
// Continue to allow these though.
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]

//! # CQLKit
//!
//! The kit underneath [`cqlwire`]: a collection of traits and types to help
//! with (de)serialization of the Cassandra native protocol.
//!
//! Everything on the wire is big-endian, so the reading and writing helpers
//! here commit to the big-endian accessors of [`Buf`] and [`BufMut`]. Unlike
//! the raw accessors, the `try_` variants in [`BufExt`] and [`BufMutExt`]
//! never panic on exhausted buffers; they fail with a structured [`Error`]
//! instead.
//!
//! [`cqlwire`]: https://github.com/cqlrs/cqlwire

pub use bytes::{Buf, BufMut};

mod buf;
mod error;
mod readable;
mod size;
mod version;
mod writable;

pub use buf::{BufExt, BufMutExt};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use version::ProtocolVersion;

/// Gives the type size in bytes.
///
/// The size can vary depending on the quantity of data the value contains.
pub trait WireSize {
	/// Returns the size of `self` when serialized for the wire, measured in
	/// bytes.
	fn wire_size(&self) -> usize;
}

/// Defines the constant size in bytes of a type when serialized for the wire.
///
/// [`WireSize`] must be implemented to return the same `WIRE_SIZE`.
pub trait ConstantWireSize: WireSize {
	/// The size of this type when serialized for the wire, measured in bytes.
	const WIRE_SIZE: usize;
}

/// Reads a type from bytes.
pub trait Readable: WireSize {
	/// Reads [`Self`] from a [`Buf`] of bytes.
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] if the buffer holds fewer bytes
	/// than the value requires.
	fn read_from(reader: &mut impl Buf) -> Result<Self>
	where
		Self: Sized;
}

/// Allows the reading of a type from bytes given some additional
/// [`Context`](Self::Context).
///
/// The protocol version is the most common context: a number of wire shapes
/// are gated on, or widened by, the version negotiated for the connection.
pub trait ReadableWithContext: WireSize {
	/// The type of context with which this type can be read from bytes.
	type Context;

	/// Reads [`Self`] from a [`Buf`] of bytes, given some additional
	/// [`Context`](Self::Context).
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] if the buffer holds fewer bytes
	/// than the value requires, or with whatever the context rules out (for
	/// example [`ErrorKind::UnsupportedInVersion`]).
	fn read_with(reader: &mut impl Buf, context: &Self::Context) -> Result<Self>
	where
		Self: Sized;
}

/// Allows a type to be written as bytes.
pub trait Writable: WireSize {
	/// Writes [`self`](Self) as bytes to a [`BufMut`].
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] if the writer does not have
	/// capacity for [`wire_size`](WireSize::wire_size) more bytes.
	fn write_to(&self, writer: &mut impl BufMut) -> Result<()>;
}

/// Allows a type to be written as bytes given some additional
/// [`Context`](Self::Context).
pub trait WritableWithContext: WireSize {
	/// The type of context with which this type can be written as bytes.
	type Context;

	/// Writes [`self`](Self) as bytes to a [`BufMut`], given some additional
	/// [`Context`](Self::Context).
	///
	/// # Errors
	///
	/// Fails with [`ErrorKind::ShortBuffer`] if the writer does not have
	/// capacity for [`wire_size`](WireSize::wire_size) more bytes, or with
	/// whatever the context rules out.
	fn write_with(&self, writer: &mut impl BufMut, context: &Self::Context) -> Result<()>;
}
