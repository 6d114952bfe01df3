// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `EVENT` response: server-initiated pushes for registered clients.
//!
//! Events arrive on stream `-1`, outside any request/response pair. The
//! body starts with a `[string]` event type, then a type-specific shape.
//! Schema-change events are shared with the `RESULT` body of schema
//! altering queries, so their codec lives here but is crate-visible.

use std::fmt;

use bytes::{Buf, BufMut};
use cqlkit::{Error, ErrorKind, ProtocolVersion, Result, ResultExt, WireSize};

use super::body_codec;
use crate::primitive::{
	read_inet,
	read_string,
	read_string_list,
	string_list_size,
	string_size,
	write_inet,
	write_string,
	write_string_list,
	Inet,
};

/// The registrable event classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
	/// Nodes joining, leaving, or moving.
	TopologyChange,
	/// Nodes going up or down.
	StatusChange,
	/// Schema objects created, updated, or dropped.
	SchemaChange,
}

impl EventType {
	/// The protocol's name for this event class.
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::TopologyChange => "TOPOLOGY_CHANGE",
			Self::StatusChange => "STATUS_CHANGE",
			Self::SchemaChange => "SCHEMA_CHANGE",
		}
	}

	pub(crate) fn from_wire(name: &str) -> Result<Self> {
		match name {
			"TOPOLOGY_CHANGE" => Ok(Self::TopologyChange),
			"STATUS_CHANGE" => Ok(Self::StatusChange),
			"SCHEMA_CHANGE" => Ok(Self::SchemaChange),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "event type",
				tag: other.to_owned(),
			})),
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What happened to the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChangeType {
	/// A node joined the cluster.
	NewNode,
	/// A node left the cluster.
	RemovedNode,
	/// A node moved to new tokens.
	MovedNode,
}

impl TopologyChangeType {
	const fn as_str(self) -> &'static str {
		match self {
			Self::NewNode => "NEW_NODE",
			Self::RemovedNode => "REMOVED_NODE",
			Self::MovedNode => "MOVED_NODE",
		}
	}

	fn from_wire(name: &str) -> Result<Self> {
		match name {
			"NEW_NODE" => Ok(Self::NewNode),
			"REMOVED_NODE" => Ok(Self::RemovedNode),
			"MOVED_NODE" => Ok(Self::MovedNode),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "topology change type",
				tag: other.to_owned(),
			})),
		}
	}
}

/// A node joined, left, or moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyChangeEvent {
	/// What happened.
	pub change: TopologyChangeType,
	/// The node it happened to.
	pub address: Inet,
}

/// Whether a node came up or went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeType {
	/// The node is up.
	Up,
	/// The node is down.
	Down,
}

impl StatusChangeType {
	const fn as_str(self) -> &'static str {
		match self {
			Self::Up => "UP",
			Self::Down => "DOWN",
		}
	}

	fn from_wire(name: &str) -> Result<Self> {
		match name {
			"UP" => Ok(Self::Up),
			"DOWN" => Ok(Self::Down),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "status change type",
				tag: other.to_owned(),
			})),
		}
	}
}

/// A node came up or went down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeEvent {
	/// What happened.
	pub change: StatusChangeType,
	/// The node it happened to.
	pub address: Inet,
}

/// What happened to a schema object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeType {
	/// The object was created.
	Created,
	/// The object was updated.
	Updated,
	/// The object was dropped.
	Dropped,
}

impl SchemaChangeType {
	const fn as_str(self) -> &'static str {
		match self {
			Self::Created => "CREATED",
			Self::Updated => "UPDATED",
			Self::Dropped => "DROPPED",
		}
	}

	fn from_wire(name: &str) -> Result<Self> {
		match name {
			"CREATED" => Ok(Self::Created),
			"UPDATED" => Ok(Self::Updated),
			"DROPPED" => Ok(Self::Dropped),
			other => Err(Error::new(ErrorKind::UnknownTag {
				kind: "schema change type",
				tag: other.to_owned(),
			})),
		}
	}
}

/// The schema object a change applies to, with its identifying data.
///
/// Function and aggregate targets only exist from protocol version 4
/// onwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChangeTarget {
	/// The keyspace itself; identified by the event's keyspace alone.
	Keyspace,
	/// A table in the keyspace.
	Table {
		/// The table name.
		name: String,
	},
	/// A user-defined type in the keyspace.
	Type {
		/// The type name.
		name: String,
	},
	/// A function in the keyspace.
	Function {
		/// The function name.
		name: String,
		/// The CQL names of the argument types.
		arg_types: Vec<String>,
	},
	/// An aggregate in the keyspace.
	Aggregate {
		/// The aggregate name.
		name: String,
		/// The CQL names of the argument types.
		arg_types: Vec<String>,
	},
}

impl SchemaChangeTarget {
	const fn as_str(&self) -> &'static str {
		match self {
			Self::Keyspace => "KEYSPACE",
			Self::Table { .. } => "TABLE",
			Self::Type { .. } => "TYPE",
			Self::Function { .. } => "FUNCTION",
			Self::Aggregate { .. } => "AGGREGATE",
		}
	}
}

/// A schema object was created, updated, or dropped.
///
/// The same shape doubles as the body of a `RESULT` answering a schema
/// altering query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChangeEvent {
	/// What happened.
	pub change: SchemaChangeType,
	/// The keyspace the object lives in (or is).
	pub keyspace: String,
	/// The object itself.
	pub target: SchemaChangeTarget,
}

impl SchemaChangeEvent {
	pub(crate) fn encoded_size(&self, _version: ProtocolVersion) -> Result<usize> {
		let target_size = match &self.target {
			SchemaChangeTarget::Keyspace => 0,
			SchemaChangeTarget::Table { name } | SchemaChangeTarget::Type { name } => {
				string_size(name)
			},
			SchemaChangeTarget::Function { name, arg_types }
			| SchemaChangeTarget::Aggregate { name, arg_types } => {
				string_size(name) + string_list_size(arg_types)
			},
		};

		Ok(string_size(self.change.as_str())
			+ string_size(self.target.as_str())
			+ string_size(&self.keyspace)
			+ target_size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check_version(version)?;

		write_string(self.change.as_str(), buf)?;
		write_string(self.target.as_str(), buf)?;
		write_string(&self.keyspace, buf)?;

		match &self.target {
			SchemaChangeTarget::Keyspace => Ok(()),
			SchemaChangeTarget::Table { name } | SchemaChangeTarget::Type { name } => {
				write_string(name, buf)
			},
			SchemaChangeTarget::Function { name, arg_types }
			| SchemaChangeTarget::Aggregate { name, arg_types } => {
				write_string(name, buf)?;
				write_string_list(arg_types, buf)
			},
		}
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let change = SchemaChangeType::from_wire(
			&read_string(buf).context("cannot read schema change type")?,
		)?;
		let target_name = read_string(buf).context("cannot read schema change target")?;
		let keyspace = read_string(buf).context("cannot read schema change keyspace")?;

		let target = match target_name.as_str() {
			"KEYSPACE" => SchemaChangeTarget::Keyspace,
			"TABLE" => SchemaChangeTarget::Table {
				name: read_string(buf).context("cannot read schema change object name")?,
			},
			"TYPE" => SchemaChangeTarget::Type {
				name: read_string(buf).context("cannot read schema change object name")?,
			},
			"FUNCTION" | "AGGREGATE" => {
				let name =
					read_string(buf).context("cannot read schema change object name")?;
				let arg_types = read_string_list(buf)
					.context("cannot read schema change argument types")?;

				if target_name == "FUNCTION" {
					SchemaChangeTarget::Function { name, arg_types }
				} else {
					SchemaChangeTarget::Aggregate { name, arg_types }
				}
			},
			other => {
				return Err(Error::new(ErrorKind::UnknownTag {
					kind: "schema change target",
					tag: other.to_owned(),
				}))
			},
		};

		let event = Self {
			change,
			keyspace,
			target,
		};
		event.check_version(version)?;

		Ok(event)
	}

	fn check_version(&self, version: ProtocolVersion) -> Result<()> {
		let gated = matches!(
			self.target,
			SchemaChangeTarget::Function { .. } | SchemaChangeTarget::Aggregate { .. }
		);

		if gated && version < ProtocolVersion::V4 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "function and aggregate schema change targets",
			}));
		}

		Ok(())
	}
}

/// A server push. The body is the event type name followed by the
/// type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum Event {
	/// A topology change.
	TopologyChange(TopologyChangeEvent),
	/// A status change.
	StatusChange(StatusChangeEvent),
	/// A schema change.
	SchemaChange(SchemaChangeEvent),
}

impl Event {
	/// The class of this event.
	#[must_use]
	pub const fn event_type(&self) -> EventType {
		match self {
			Self::TopologyChange(_) => EventType::TopologyChange,
			Self::StatusChange(_) => EventType::StatusChange,
			Self::SchemaChange(_) => EventType::SchemaChange,
		}
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		let body_size = match self {
			Self::TopologyChange(event) => {
				string_size(event.change.as_str()) + event.address.wire_size()
			},
			Self::StatusChange(event) => {
				string_size(event.change.as_str()) + event.address.wire_size()
			},
			Self::SchemaChange(event) => event.encoded_size(version)?,
		};

		Ok(string_size(self.event_type().as_str()) + body_size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		write_string(self.event_type().as_str(), buf)?;

		match self {
			Self::TopologyChange(event) => {
				write_string(event.change.as_str(), buf)?;
				write_inet(&event.address, buf)
			},
			Self::StatusChange(event) => {
				write_string(event.change.as_str(), buf)?;
				write_inet(&event.address, buf)
			},
			Self::SchemaChange(event) => event.encode(buf, version),
		}
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let event_type =
			EventType::from_wire(&read_string(buf).context("cannot read event type")?)?;

		Ok(match event_type {
			EventType::TopologyChange => {
				let change = TopologyChangeType::from_wire(
					&read_string(buf).context("cannot read topology change type")?,
				)?;
				let address = read_inet(buf).context("cannot read topology change node")?;

				Self::TopologyChange(TopologyChangeEvent { change, address })
			},
			EventType::StatusChange => {
				let change = StatusChangeType::from_wire(
					&read_string(buf).context("cannot read status change type")?,
				)?;
				let address = read_inet(buf).context("cannot read status change node")?;

				Self::StatusChange(StatusChangeEvent { change, address })
			},
			EventType::SchemaChange => Self::SchemaChange(SchemaChangeEvent::decode(buf, version)?),
		})
	}
}

body_codec! {
	/// Codec for [`Event`].
	EventCodec, Event, Event
}

#[cfg(test)]
mod test {
	use super::*;
	use cqlkit::ProtocolVersion::{V3, V4};
	use std::net::{IpAddr, Ipv4Addr};

	fn node() -> Inet {
		Inet {
			addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
			port: 9042,
		}
	}

	#[test]
	fn test_status_change_round_trip() {
		let event = Event::from(StatusChangeEvent {
			change: StatusChangeType::Down,
			address: node(),
		});
		let mut buf = Vec::new();
		event.encode(&mut buf, V3).unwrap();

		assert_eq!(buf.len(), event.encoded_size(V3).unwrap());
		assert_eq!(Event::decode(&mut &buf[..], V3).unwrap(), event);
	}

	#[test]
	fn test_topology_change_round_trip() {
		let event = Event::from(TopologyChangeEvent {
			change: TopologyChangeType::MovedNode,
			address: node(),
		});
		let mut buf = Vec::new();
		event.encode(&mut buf, V4).unwrap();

		assert_eq!(Event::decode(&mut &buf[..], V4).unwrap(), event);
	}

	#[test]
	fn test_schema_change_round_trip() {
		let event = Event::from(SchemaChangeEvent {
			change: SchemaChangeType::Created,
			keyspace: "ks".to_owned(),
			target: SchemaChangeTarget::Table {
				name: "users".to_owned(),
			},
		});
		let mut buf = Vec::new();
		event.encode(&mut buf, V3).unwrap();

		assert_eq!(buf.len(), event.encoded_size(V3).unwrap());
		assert_eq!(Event::decode(&mut &buf[..], V3).unwrap(), event);
	}

	#[test]
	fn test_function_target_needs_version_four() {
		let event = SchemaChangeEvent {
			change: SchemaChangeType::Dropped,
			keyspace: "ks".to_owned(),
			target: SchemaChangeTarget::Function {
				name: "my_fn".to_owned(),
				arg_types: vec!["int".to_owned()],
			},
		};

		let mut buf = Vec::new();
		assert!(matches!(
			event.encode(&mut buf, V3).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));

		let mut encoded = Vec::new();
		event.encode(&mut encoded, V4).unwrap();
		assert!(matches!(
			SchemaChangeEvent::decode(&mut &encoded[..], V3)
				.unwrap_err()
				.kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
		assert_eq!(
			SchemaChangeEvent::decode(&mut &encoded[..], V4).unwrap(),
			event
		);
	}

	#[test]
	fn test_unknown_event_type_is_rejected() {
		let mut buf = Vec::new();
		write_string("KEYSPACE_CHANGE", &mut buf).unwrap();

		assert!(matches!(
			Event::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "event type",
				..
			}
		));
	}
}
