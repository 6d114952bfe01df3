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
#![warn(missing_docs)]

//! # cqlwire
//! cqlwire is a Rust library directly implementing the framing, data types,
//! and protocol messages of the Cassandra native protocol, versions 3, 4,
//! and 5 (including the version 5 "beta" marker). cqlwire is _not_ a driver:
//! it does not open connections, schedule I/O, multiplex streams, or retry
//! anything. It is a pure transform between typed messages and the byte
//! sequences exchanged on the wire, usable from either side - the same
//! codec encodes requests and decodes responses on a client, and the
//! inverse on a server.
//!
//! The building blocks, from the bottom up:
//!
//! - [`primitive`] - the notation alphabet the whole format is written in:
//!   length-prefixed strings and blobs, collections, addresses, uuids, and
//!   the three-state value cells.
//! - [`datatype`] - the recursive codec for CQL schema type descriptors.
//! - [`message`] - one body type per opcode, plus the registry that maps
//!   `(version, opcode, direction)` to a codec.
//! - [`frame`] - the outer envelope: the 9-byte header, flags, optional
//!   compression, tracing ids, custom payloads, and warnings.
//!
//! Every operation takes the [`ProtocolVersion`] as an argument; nothing in
//! the crate holds version state, so one process can speak different
//! versions on different connections through the same types.

mod consistency;
mod opcode;
mod value;

pub mod datatype;
pub mod frame;
pub mod message;
pub mod primitive;

pub use consistency::Consistency;
pub use cqlkit::{Buf, BufMut, Error, ErrorKind, ProtocolVersion, Result, ResultExt};
pub use opcode::Opcode;
pub use value::Value;
