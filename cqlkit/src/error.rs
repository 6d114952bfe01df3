// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The structured error surface shared by every codec layer.
//!
//! Failures carry a closed [`ErrorKind`] plus a chain of context messages.
//! Each layer wraps the lower-level cause with its own description, so the
//! rendered error reads outside-in down to the primitive that failed, e.g.
//! `cannot read UDT field 2 type: cannot read data type code: short buffer:
//! needed 2 bytes, 1 remaining`.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error as ThisError;

use crate::version::ProtocolVersion;

/// The closed set of failure kinds a codec operation can produce.
#[non_exhaustive]
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
	/// Insufficient bytes to satisfy a fixed-width read, or insufficient
	/// capacity for a fixed-width write.
	#[error("short buffer: needed {needed} bytes, {remaining} remaining")]
	ShortBuffer {
		/// How many bytes the read or write required.
		needed: usize,
		/// How many bytes were actually available.
		remaining: usize,
	},

	/// A length prefix is negative where only non-negative lengths are
	/// valid, inconsistent with the buffer contents, or otherwise outside
	/// its allowed shape.
	#[error("invalid length {length}: expected {expected}")]
	InvalidLength {
		/// The offending length.
		length: i64,
		/// What would have been acceptable.
		expected: &'static str,
	},

	/// A wire shape that only exists from a later protocol version onwards
	/// was encountered under an earlier one.
	#[error("{feature} is not supported in protocol version {version}")]
	UnsupportedInVersion {
		/// The version in force for the operation.
		version: ProtocolVersion,
		/// The version-gated feature that was used.
		feature: &'static str,
	},

	/// A tag is not in its closed set: an opcode, an event type, a
	/// schema-change target, a value-cell tag, and so on.
	#[error("unknown {kind}: {tag}")]
	UnknownTag {
		/// Which enumeration the tag belongs to.
		kind: &'static str,
		/// The offending tag, rendered for display.
		tag: String,
	},

	/// The body length declared in a frame header does not equal the bytes
	/// actually present after the header.
	#[error("frame body length mismatch: declared {declared} bytes, {actual} present")]
	FrameLengthMismatch {
		/// The length the header declared.
		declared: i32,
		/// The bytes that were actually present.
		actual: usize,
	},

	/// No encoder or decoder is registered for the requested combination,
	/// or a data-type code has no codec.
	#[error("no codec for {what} in protocol version {version}")]
	CodecNotFound {
		/// The version the lookup ran under.
		version: ProtocolVersion,
		/// What the lookup was for, e.g. `opcode QUERY`.
		what: String,
	},

	/// An internal assertion failed. This is a bug in the codec, never an
	/// input problem, and is never recovered from.
	#[error("integrity violation: {detail}")]
	IntegrityViolation {
		/// What the assertion was.
		detail: String,
	},
}

/// An error produced by a codec operation: an [`ErrorKind`] plus the chain
/// of contexts added on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
	kind: ErrorKind,
	// Innermost context first; `Display` renders in reverse.
	chain: Vec<Cow<'static, str>>,
}

impl Error {
	/// Creates an error from its kind, with no context attached yet.
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self {
			kind,
			chain: Vec::new(),
		}
	}

	/// The kind of failure, independent of where it surfaced.
	#[must_use]
	pub const fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Wraps this error with one more layer of context.
	#[must_use]
	pub fn context(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.chain.push(message.into());
		self
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for context in self.chain.iter().rev() {
			write!(f, "{context}: ")?;
		}

		write!(f, "{}", self.kind)
	}
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Self {
		Self::new(kind)
	}
}

/// Shorthand for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Adds context to the error of a fallible codec operation.
pub trait ResultExt<T> {
	/// Wraps the error, if any, with one more layer of context.
	///
	/// # Errors
	///
	/// Forwards the underlying error with `message` prepended to its chain.
	fn context(self, message: impl Into<Cow<'static, str>>) -> Result<T>;

	/// Like [`context`](Self::context), but the message is only built on
	/// the error path.
	///
	/// # Errors
	///
	/// Forwards the underlying error with the built message prepended to
	/// its chain.
	fn with_context<C, F>(self, message: F) -> Result<T>
	where
		C: Into<Cow<'static, str>>,
		F: FnOnce() -> C;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
	fn context(self, message: impl Into<Cow<'static, str>>) -> Result<T> {
		self.map_err(|error| error.into().context(message))
	}

	fn with_context<C, F>(self, message: F) -> Result<T>
	where
		C: Into<Cow<'static, str>>,
		F: FnOnce() -> C,
	{
		self.map_err(|error| error.into().context(message()))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_display_renders_chain_outside_in() {
		let error = Error::new(ErrorKind::ShortBuffer {
			needed: 2,
			remaining: 1,
		})
		.context("cannot read data type code")
		.context("cannot read UDT field 2 type");

		assert_eq!(
			error.to_string(),
			"cannot read UDT field 2 type: cannot read data type code: \
			 short buffer: needed 2 bytes, 1 remaining"
		);
	}

	#[test]
	fn test_kind_survives_context() {
		let result: Result<()> = Err(Error::new(ErrorKind::FrameLengthMismatch {
			declared: 10,
			actual: 4,
		}));
		let error = result.context("cannot decode frame").unwrap_err();

		assert!(matches!(
			error.kind(),
			ErrorKind::FrameLengthMismatch {
				declared: 10,
				actual: 4
			}
		));
	}
}
