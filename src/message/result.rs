// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `RESULT` response.
//!
//! One body, five kinds: `Void`, `Rows`, `SetKeyspace`, `Prepared`, and
//! `SchemaChange`. The rows and prepared kinds carry column metadata -
//! the one place schema type descriptors actually appear on the wire -
//! with a flag word deciding which parts are spelled out and which are
//! elided.

use bitflags::bitflags;
use bytes::{Buf, BufMut};
use cqlkit::{
	BufExt,
	BufMutExt,
	ConstantWireSize,
	Error,
	ErrorKind,
	ProtocolVersion,
	Result,
	ResultExt,
	WireSize,
};

use super::body_codec;
use super::event::SchemaChangeEvent;
use crate::datatype::DataType;
use crate::primitive::{
	bytes_size,
	read_bytes,
	read_short_bytes,
	read_string,
	short_bytes_size,
	string_size,
	write_bytes,
	write_short_bytes,
	write_string,
};

/// Result kinds as they appear on the wire.
mod kind {
	pub const VOID: i32 = 0x0001;
	pub const ROWS: i32 = 0x0002;
	pub const SET_KEYSPACE: i32 = 0x0003;
	pub const PREPARED: i32 = 0x0004;
	pub const SCHEMA_CHANGE: i32 = 0x0005;
}

bitflags! {
	struct RowsFlags: u32 {
		const GLOBAL_TABLES_SPEC = 0x0001;
		const HAS_MORE_PAGES = 0x0002;
		const NO_METADATA = 0x0004;
		const METADATA_CHANGED = 0x0008;
	}
}

/// The keyspace and table a column belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
	/// The keyspace.
	pub keyspace: String,
	/// The table.
	pub table: String,
}

impl TableSpec {
	fn size(&self) -> usize {
		string_size(&self.keyspace) + string_size(&self.table)
	}

	fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
		write_string(&self.keyspace, buf)?;
		write_string(&self.table, buf)
	}

	fn decode(buf: &mut impl Buf) -> Result<Self> {
		Ok(Self {
			keyspace: read_string(buf).context("cannot read spec keyspace")?,
			table: read_string(buf).context("cannot read spec table")?,
		})
	}
}

/// One column of a result or of a prepared statement's variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
	/// The column's table, or `None` when the metadata carries a global
	/// table spec instead.
	pub table: Option<TableSpec>,
	/// The column name.
	pub name: String,
	/// The column's schema type.
	pub data_type: DataType,
}

impl ColumnSpec {
	fn size(&self) -> usize {
		self.table.as_ref().map_or(0, TableSpec::size)
			+ string_size(&self.name)
			+ self.data_type.wire_size()
	}
}

fn encode_specs(
	global_spec: Option<&TableSpec>,
	columns: &[ColumnSpec],
	buf: &mut impl BufMut,
	version: ProtocolVersion,
) -> Result<()> {
	if let Some(spec) = global_spec {
		spec.encode(buf).context("cannot write global table spec")?;
	}

	for (index, column) in columns.iter().enumerate() {
		match (&column.table, global_spec) {
			(Some(table), None) => {
				table
					.encode(buf)
					.with_context(|| format!("cannot write column {index} table spec"))?;
			},
			(None, Some(_)) => {},
			_ => {
				return Err(Error::new(ErrorKind::IntegrityViolation {
					detail: format!(
						"column {index} spec disagrees with the global table spec"
					),
				}))
			},
		}

		write_string(&column.name, buf)
			.with_context(|| format!("cannot write column {index} name"))?;
		column
			.data_type
			.encode(buf, version)
			.with_context(|| format!("cannot write column {index} type"))?;
	}

	Ok(())
}

fn decode_specs(
	count: usize,
	global: bool,
	buf: &mut impl Buf,
	version: ProtocolVersion,
) -> Result<(Option<TableSpec>, Vec<ColumnSpec>)> {
	let global_spec = global
		.then(|| TableSpec::decode(buf).context("cannot read global table spec"))
		.transpose()?;

	let mut columns = Vec::with_capacity(count.min(1024));
	for index in 0..count {
		let table = if global {
			None
		} else {
			Some(
				TableSpec::decode(buf)
					.with_context(|| format!("cannot read column {index} table spec"))?,
			)
		};
		let name =
			read_string(buf).with_context(|| format!("cannot read column {index} name"))?;
		let data_type = DataType::decode(buf, version)
			.with_context(|| format!("cannot read column {index} type"))?;

		columns.push(ColumnSpec {
			table,
			name,
			data_type,
		});
	}

	Ok((global_spec, columns))
}

/// The metadata ahead of row content, also reused as the result metadata
/// of a prepared statement.
///
/// `columns` may be empty while `column_count` is not: that is the
/// `NO_METADATA` shape, where the client told the server it already
/// holds the specs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowsMetadata {
	/// How many columns each row holds.
	pub column_count: i32,
	/// The paging state to continue the query with, if more pages exist.
	pub paging_state: Option<Vec<u8>>,
	/// The new result-metadata id after a schema change. Version 5
	/// onwards.
	pub new_metadata_id: Option<Vec<u8>>,
	/// The table spec shared by all columns, when they share one.
	pub global_spec: Option<TableSpec>,
	/// The column specs; empty in the `NO_METADATA` shape.
	pub columns: Vec<ColumnSpec>,
}

impl RowsMetadata {
	fn flags(&self) -> RowsFlags {
		let mut flags = RowsFlags::empty();

		if self.global_spec.is_some() {
			flags |= RowsFlags::GLOBAL_TABLES_SPEC;
		}
		if self.paging_state.is_some() {
			flags |= RowsFlags::HAS_MORE_PAGES;
		}
		if self.columns.is_empty() && self.column_count != 0 {
			flags |= RowsFlags::NO_METADATA;
		}
		if self.new_metadata_id.is_some() {
			flags |= RowsFlags::METADATA_CHANGED;
		}

		flags
	}

	fn check(&self, version: ProtocolVersion) -> Result<()> {
		if self.new_metadata_id.is_some() && version < ProtocolVersion::V5 {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "result metadata ids",
			}));
		}

		#[allow(clippy::cast_possible_wrap)]
		if !self.columns.is_empty() && self.columns.len() as i64 != i64::from(self.column_count) {
			return Err(Error::new(ErrorKind::IntegrityViolation {
				detail: format!(
					"{} column specs for a column count of {}",
					self.columns.len(),
					self.column_count
				),
			}));
		}

		// The elided-metadata shape has nowhere to spell a global spec.
		if self.columns.is_empty() && self.column_count != 0 && self.global_spec.is_some() {
			return Err(Error::new(ErrorKind::IntegrityViolation {
				detail: "a global table spec on metadata that elides its columns".to_owned(),
			}));
		}

		Ok(())
	}

	fn size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check(version)?;

		let mut size = 2 * i32::WIRE_SIZE;

		if let Some(state) = &self.paging_state {
			size += bytes_size(Some(state));
		}
		if let Some(id) = &self.new_metadata_id {
			size += short_bytes_size(id);
		}
		if let Some(spec) = &self.global_spec {
			size += spec.size();
		}
		size += self.columns.iter().map(ColumnSpec::size).sum::<usize>();

		Ok(size)
	}

	fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check(version)?;

		buf.try_put_u32(self.flags().bits())?;
		buf.try_put_i32(self.column_count)?;

		if let Some(state) = &self.paging_state {
			write_bytes(Some(state), buf).context("cannot write paging state")?;
		}
		if let Some(id) = &self.new_metadata_id {
			write_short_bytes(id, buf).context("cannot write result metadata id")?;
		}

		if self.columns.is_empty() && self.column_count != 0 {
			Ok(())
		} else {
			encode_specs(self.global_spec.as_ref(), &self.columns, buf, version)
		}
	}

	fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let flags = RowsFlags::from_bits_truncate(
			buf.try_get_u32().context("cannot read metadata flags")?,
		);
		let column_count = buf.try_get_i32().context("cannot read column count")?;
		let count = usize::try_from(column_count).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: i64::from(column_count),
				expected: "a non-negative column count",
			})
		})?;

		let paging_state = if flags.contains(RowsFlags::HAS_MORE_PAGES) {
			read_bytes(buf).context("cannot read paging state")?
		} else {
			None
		};

		let new_metadata_id = if flags.contains(RowsFlags::METADATA_CHANGED) {
			if version < ProtocolVersion::V5 {
				return Err(Error::new(ErrorKind::UnsupportedInVersion {
					version,
					feature: "result metadata ids",
				}));
			}

			Some(read_short_bytes(buf).context("cannot read result metadata id")?)
		} else {
			None
		};

		let (global_spec, columns) = if flags.contains(RowsFlags::NO_METADATA) {
			(None, Vec::new())
		} else {
			decode_specs(
				count,
				flags.contains(RowsFlags::GLOBAL_TABLES_SPEC),
				buf,
				version,
			)?
		};

		Ok(Self {
			column_count,
			paging_state,
			new_metadata_id,
			global_spec,
			columns,
		})
	}
}

/// The metadata of a prepared statement's bind variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreparedMetadata {
	/// Which variables form the partition key, as indices into
	/// `columns`. Protocol version 4 onwards.
	pub pk_indices: Vec<u16>,
	/// The table spec shared by all variables, when they share one.
	pub global_spec: Option<TableSpec>,
	/// The variable specs.
	pub columns: Vec<ColumnSpec>,
}

impl PreparedMetadata {
	fn check(&self, version: ProtocolVersion) -> Result<()> {
		if version < ProtocolVersion::V4 && !self.pk_indices.is_empty() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "partition key indices",
			}));
		}

		Ok(())
	}

	fn size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check(version)?;

		let mut size = 2 * i32::WIRE_SIZE;

		if version >= ProtocolVersion::V4 {
			size += i32::WIRE_SIZE + self.pk_indices.wire_size();
		}
		if let Some(spec) = &self.global_spec {
			size += spec.size();
		}
		size += self.columns.iter().map(ColumnSpec::size).sum::<usize>();

		Ok(size)
	}

	fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check(version)?;

		let flags = if self.global_spec.is_some() {
			RowsFlags::GLOBAL_TABLES_SPEC
		} else {
			RowsFlags::empty()
		};
		buf.try_put_u32(flags.bits())?;

		let count = i32::try_from(self.columns.len()).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: self.columns.len() as i64,
				expected: "a variable count that fits 32 bits",
			})
		})?;
		buf.try_put_i32(count)?;

		if version >= ProtocolVersion::V4 {
			let pk_count = i32::try_from(self.pk_indices.len()).map_err(|_| {
				Error::new(ErrorKind::InvalidLength {
					length: self.pk_indices.len() as i64,
					expected: "a partition key count that fits 32 bits",
				})
			})?;
			buf.try_put_i32(pk_count)?;

			for pk_index in &self.pk_indices {
				buf.try_put_u16(*pk_index)?;
			}
		}

		encode_specs(self.global_spec.as_ref(), &self.columns, buf, version)
	}

	fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let flags = RowsFlags::from_bits_truncate(
			buf.try_get_u32().context("cannot read metadata flags")?,
		);
		let column_count = buf.try_get_i32().context("cannot read variable count")?;
		let count = usize::try_from(column_count).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: i64::from(column_count),
				expected: "a non-negative variable count",
			})
		})?;

		let pk_indices = if version >= ProtocolVersion::V4 {
			let pk_count = buf.try_get_i32().context("cannot read partition key count")?;
			let pk_count = usize::try_from(pk_count).map_err(|_| {
				Error::new(ErrorKind::InvalidLength {
					length: i64::from(pk_count),
					expected: "a non-negative partition key count",
				})
			})?;

			let mut indices = Vec::with_capacity(pk_count.min(1024));
			for index in 0..pk_count {
				indices.push(
					buf.try_get_u16()
						.with_context(|| format!("cannot read partition key index {index}"))?,
				);
			}

			indices
		} else {
			Vec::new()
		};

		let (global_spec, columns) = decode_specs(
			count,
			flags.contains(RowsFlags::GLOBAL_TABLES_SPEC),
			buf,
			version,
		)?;

		Ok(Self {
			pk_indices,
			global_spec,
			columns,
		})
	}
}

/// A page of rows: metadata, then the cells row-major as nullable
/// `[bytes]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rows {
	/// The column metadata.
	pub metadata: RowsMetadata,
	/// The cell content, one `Vec` per row, one nullable blob per
	/// column.
	pub rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl Rows {
	fn size(&self, version: ProtocolVersion) -> Result<usize> {
		let cells = self
			.rows
			.iter()
			.flatten()
			.map(|cell| bytes_size(cell.as_deref()))
			.sum::<usize>();

		Ok(self.metadata.size(version)? + i32::WIRE_SIZE + cells)
	}

	fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.metadata.encode(buf, version)?;

		let row_count = i32::try_from(self.rows.len()).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: self.rows.len() as i64,
				expected: "a row count that fits 32 bits",
			})
		})?;
		buf.try_put_i32(row_count)?;

		for (index, row) in self.rows.iter().enumerate() {
			#[allow(clippy::cast_possible_wrap)]
			if row.len() as i64 != i64::from(self.metadata.column_count) {
				return Err(Error::new(ErrorKind::IntegrityViolation {
					detail: format!(
						"row {index} holds {} cells for a column count of {}",
						row.len(),
						self.metadata.column_count
					),
				}));
			}

			for cell in row {
				write_bytes(cell.as_deref(), buf)
					.with_context(|| format!("cannot write row {index}"))?;
			}
		}

		Ok(())
	}

	fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let metadata = RowsMetadata::decode(buf, version)?;

		let row_count = buf.try_get_i32().context("cannot read row count")?;
		let row_count = usize::try_from(row_count).map_err(|_| {
			Error::new(ErrorKind::InvalidLength {
				length: i64::from(row_count),
				expected: "a non-negative row count",
			})
		})?;
		#[allow(clippy::cast_sign_loss)]
		let column_count = metadata.column_count as usize;

		let mut rows = Vec::with_capacity(row_count.min(1024));
		for index in 0..row_count {
			let mut row = Vec::with_capacity(column_count.min(1024));
			for _ in 0..column_count {
				row.push(
					read_bytes(buf).with_context(|| format!("cannot read row {index}"))?,
				);
			}

			rows.push(row);
		}

		Ok(Self { metadata, rows })
	}
}

/// A prepared statement: its id, its variables, and the metadata of the
/// rows it will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
	/// The statement id to pass to `EXECUTE`.
	pub id: Vec<u8>,
	/// The result-metadata id to pass to `EXECUTE`. Mandatory on version
	/// 5, absent before it.
	pub result_metadata_id: Option<Vec<u8>>,
	/// The bind variables.
	pub metadata: PreparedMetadata,
	/// The shape of the rows an `EXECUTE` will return.
	pub result_metadata: RowsMetadata,
}

impl Prepared {
	fn check(&self, version: ProtocolVersion) -> Result<()> {
		if version >= ProtocolVersion::V5 && self.result_metadata_id.is_none() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "PREPARED without a result metadata id",
			}));
		}
		if version < ProtocolVersion::V5 && self.result_metadata_id.is_some() {
			return Err(Error::new(ErrorKind::UnsupportedInVersion {
				version,
				feature: "result metadata ids",
			}));
		}

		Ok(())
	}

	fn size(&self, version: ProtocolVersion) -> Result<usize> {
		self.check(version)?;

		Ok(short_bytes_size(&self.id)
			+ self
				.result_metadata_id
				.as_deref()
				.map_or(0, short_bytes_size)
			+ self.metadata.size(version)?
			+ self.result_metadata.size(version)?)
	}

	fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		self.check(version)?;

		write_short_bytes(&self.id, buf).context("cannot write statement id")?;
		if let Some(id) = &self.result_metadata_id {
			write_short_bytes(id, buf).context("cannot write result metadata id")?;
		}

		self.metadata.encode(buf, version)?;
		self.result_metadata.encode(buf, version)
	}

	fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let id = read_short_bytes(buf).context("cannot read statement id")?;
		let result_metadata_id = if version >= ProtocolVersion::V5 {
			Some(read_short_bytes(buf).context("cannot read result metadata id")?)
		} else {
			None
		};

		Ok(Self {
			id,
			result_metadata_id,
			metadata: PreparedMetadata::decode(buf, version)?,
			result_metadata: RowsMetadata::decode(buf, version)?,
		})
	}
}

/// The result of a query, in one of its five kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlResult {
	/// The query produced nothing.
	Void,
	/// A page of rows.
	Rows(Rows),
	/// A `USE` query switched the keyspace.
	SetKeyspace(String),
	/// A `PREPARE` produced a statement.
	Prepared(Prepared),
	/// A schema altering query went through.
	SchemaChange(SchemaChangeEvent),
}

impl CqlResult {
	const fn kind(&self) -> i32 {
		match self {
			Self::Void => kind::VOID,
			Self::Rows(_) => kind::ROWS,
			Self::SetKeyspace(_) => kind::SET_KEYSPACE,
			Self::Prepared(_) => kind::PREPARED,
			Self::SchemaChange(_) => kind::SCHEMA_CHANGE,
		}
	}

	pub(crate) fn encoded_size(&self, version: ProtocolVersion) -> Result<usize> {
		let body_size = match self {
			Self::Void => 0,
			Self::Rows(rows) => rows.size(version)?,
			Self::SetKeyspace(keyspace) => string_size(keyspace),
			Self::Prepared(prepared) => prepared.size(version)?,
			Self::SchemaChange(change) => change.encoded_size(version)?,
		};

		Ok(i32::WIRE_SIZE + body_size)
	}

	pub(crate) fn encode(&self, buf: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
		buf.try_put_i32(self.kind())?;

		match self {
			Self::Void => Ok(()),
			Self::Rows(rows) => rows.encode(buf, version),
			Self::SetKeyspace(keyspace) => write_string(keyspace, buf),
			Self::Prepared(prepared) => prepared.encode(buf, version),
			Self::SchemaChange(change) => change.encode(buf, version),
		}
	}

	pub(crate) fn decode(buf: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
		let result_kind = buf.try_get_i32().context("cannot read result kind")?;

		Ok(match result_kind {
			kind::VOID => Self::Void,
			kind::ROWS => Self::Rows(Rows::decode(buf, version)?),
			kind::SET_KEYSPACE => {
				Self::SetKeyspace(read_string(buf).context("cannot read keyspace")?)
			},
			kind::PREPARED => Self::Prepared(Prepared::decode(buf, version)?),
			kind::SCHEMA_CHANGE => Self::SchemaChange(SchemaChangeEvent::decode(buf, version)?),
			other => {
				return Err(Error::new(ErrorKind::UnknownTag {
					kind: "result kind",
					tag: format!("{other:#06X}"),
				}))
			},
		})
	}
}

body_codec! {
	/// Codec for [`CqlResult`].
	ResultCodec, Result, CqlResult
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::message::event::{SchemaChangeTarget, SchemaChangeType};
	use cqlkit::ProtocolVersion::{V3, V4, V5};

	fn round_trip(result: &CqlResult, version: ProtocolVersion) {
		let mut buf = Vec::new();
		result.encode(&mut buf, version).unwrap();

		assert_eq!(buf.len(), result.encoded_size(version).unwrap());
		assert_eq!(&CqlResult::decode(&mut &buf[..], version).unwrap(), result);
	}

	fn users_metadata() -> RowsMetadata {
		RowsMetadata {
			column_count: 2,
			paging_state: None,
			new_metadata_id: None,
			global_spec: Some(TableSpec {
				keyspace: "ks".to_owned(),
				table: "users".to_owned(),
			}),
			columns: vec![
				ColumnSpec {
					table: None,
					name: "id".to_owned(),
					data_type: DataType::Uuid,
				},
				ColumnSpec {
					table: None,
					name: "emails".to_owned(),
					data_type: DataType::List(Box::new(DataType::Varchar)),
				},
			],
		}
	}

	#[test]
	fn test_void_round_trip() {
		round_trip(&CqlResult::Void, V3);
	}

	#[test]
	fn test_set_keyspace_round_trip() {
		round_trip(&CqlResult::SetKeyspace("ks".to_owned()), V4);
	}

	#[test]
	fn test_rows_round_trip() {
		let rows = Rows {
			metadata: users_metadata(),
			rows: vec![
				vec![Some(vec![0xAB; 16]), Some(vec![1, 2, 3])],
				vec![Some(vec![0xCD; 16]), None],
			],
		};

		round_trip(&CqlResult::Rows(rows), V4);
	}

	#[test]
	fn test_rows_without_global_spec_round_trip() {
		let spec = TableSpec {
			keyspace: "ks".to_owned(),
			table: "t".to_owned(),
		};
		let rows = Rows {
			metadata: RowsMetadata {
				column_count: 1,
				global_spec: None,
				columns: vec![ColumnSpec {
					table: Some(spec),
					name: "v".to_owned(),
					data_type: DataType::Int,
				}],
				..RowsMetadata::default()
			},
			rows: vec![vec![Some(vec![0, 0, 0, 7])]],
		};

		round_trip(&CqlResult::Rows(rows), V3);
	}

	#[test]
	fn test_no_metadata_rows_round_trip() {
		let rows = Rows {
			metadata: RowsMetadata {
				column_count: 2,
				..RowsMetadata::default()
			},
			rows: vec![vec![Some(vec![1]), Some(vec![2])]],
		};

		round_trip(&CqlResult::Rows(rows), V4);
	}

	#[test]
	fn test_paging_state_round_trips() {
		let rows = Rows {
			metadata: RowsMetadata {
				paging_state: Some(vec![0xFE, 0xED]),
				..users_metadata()
			},
			rows: Vec::new(),
		};

		round_trip(&CqlResult::Rows(rows), V4);
	}

	#[test]
	fn test_prepared_round_trip_v4_and_v5() {
		let metadata = PreparedMetadata {
			pk_indices: vec![0],
			global_spec: Some(TableSpec {
				keyspace: "ks".to_owned(),
				table: "users".to_owned(),
			}),
			columns: vec![ColumnSpec {
				table: None,
				name: "id".to_owned(),
				data_type: DataType::Uuid,
			}],
		};

		round_trip(
			&CqlResult::Prepared(Prepared {
				id: vec![0xAB; 16],
				result_metadata_id: None,
				metadata: metadata.clone(),
				result_metadata: users_metadata(),
			}),
			V4,
		);
		round_trip(
			&CqlResult::Prepared(Prepared {
				id: vec![0xAB; 16],
				result_metadata_id: Some(vec![0xCD; 16]),
				metadata,
				result_metadata: users_metadata(),
			}),
			V5,
		);
	}

	#[test]
	fn test_pk_indices_are_gated_before_v4() {
		let prepared = Prepared {
			id: vec![1],
			result_metadata_id: None,
			metadata: PreparedMetadata {
				pk_indices: vec![0],
				..PreparedMetadata::default()
			},
			result_metadata: RowsMetadata::default(),
		};
		let mut buf = Vec::new();

		assert!(matches!(
			CqlResult::Prepared(prepared)
				.encode(&mut buf, V3)
				.unwrap_err()
				.kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
	}

	#[test]
	fn test_metadata_changed_needs_v5() {
		let metadata = RowsMetadata {
			new_metadata_id: Some(vec![1, 2]),
			..users_metadata()
		};
		let mut buf = Vec::new();

		assert!(matches!(
			metadata.encode(&mut buf, V4).unwrap_err().kind(),
			ErrorKind::UnsupportedInVersion { .. }
		));
	}

	#[test]
	fn test_schema_change_result_round_trip() {
		round_trip(
			&CqlResult::SchemaChange(SchemaChangeEvent {
				change: SchemaChangeType::Updated,
				keyspace: "ks".to_owned(),
				target: SchemaChangeTarget::Keyspace,
			}),
			V3,
		);
	}

	#[test]
	fn test_unknown_kind_is_rejected() {
		let buf = 0x0009_i32.to_be_bytes();

		assert!(matches!(
			CqlResult::decode(&mut &buf[..], V4).unwrap_err().kind(),
			ErrorKind::UnknownTag {
				kind: "result kind",
				..
			}
		));
	}

	#[test]
	fn test_ragged_row_is_an_integrity_violation() {
		let rows = Rows {
			metadata: users_metadata(),
			rows: vec![vec![Some(vec![1])]],
		};
		let mut buf = Vec::new();

		assert!(matches!(
			rows.encode(&mut buf, V4).unwrap_err().kind(),
			ErrorKind::IntegrityViolation { .. }
		));
	}
}
