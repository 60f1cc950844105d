//! The DAT decoder: walks fixed-width rows under a table schema and reads
//! strings and arrays out of the shared dynamic heap.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bon::Builder;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    error::{Error, Result},
    schema::{TableColumn, TableSchema},
    types::{FieldType, ParseMetadata, ParsedRow, ParsedTable, ParserWidth, Value},
};

/// Sentinel for a null 32-bit row reference, string offset, or array header.
pub const NULL_ROW_SENTINEL: u32 = 0xfefe_fefe;

/// Sentinel for a null 64-bit long reference.
pub const NULL_LONG_ID_SENTINEL: u64 = 0xfefe_fefe_fefe_fefe;

/// Largest row index a foreign key may plausibly hold.
pub const MAX_FOREIGN_KEY_INDEX: u32 = 100_000_000;

/// Largest row count a DAT file may declare.
pub const MAX_ROW_COUNT: i32 = 10_000_000;

/// Smallest valid DAT file: a row count plus the boundary marker.
pub const MIN_DAT_FILE_SIZE: usize = 12;

/// Heap offsets below this land inside the boundary marker.
pub const MIN_DYNAMIC_OFFSET: u64 = 8;

/// The 8-byte run separating fixed rows from the dynamic heap.
pub const BOUNDARY_MARKER: [u8; 8] = [0xbb; 8];

/// Uninitialized-memory fill patterns that occur inside row-reference arrays.
const DEBUG_FILL_PATTERNS: [u32; 5] = [
    0xffff_ffff,
    0xcdcd_cdcd,
    0xcccc_cccc,
    0xdddd_dddd,
    0xfeee_feee,
];

/// Cooperative cancellation handle for long-running decodes.
///
/// Clones share one flag; the decoder checks it once per row and returns
/// [`Error::Cancelled`] when it is raised, discarding partial state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every decode holding a clone of this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits applied while decoding untrusted DAT data.
#[derive(Debug, Clone, Copy, Builder)]
pub struct ParserOptions {
    /// Longest string in UTF-16 code units before the decode fails
    #[builder(default = 65536)]
    pub max_string_length: usize,

    /// Largest accepted array element count
    #[builder(default = 65536)]
    pub max_array_count: usize,

    /// Array sizes above this are logged
    #[builder(default = 1000)]
    pub array_size_warning_threshold: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Decoder for DAT files. Holds only configuration, so one parser may be
/// used from any number of threads at once.
#[derive(Debug, Default)]
pub struct DatParser {
    options: ParserOptions,
}

impl DatParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Decode a complete DAT file under `schema`. The filename selects the
    /// parser width via its extension.
    pub fn parse(&self, data: &[u8], filename: &str, schema: &TableSchema) -> Result<ParsedTable> {
        self.parse_with_cancel(data, filename, schema, &CancelFlag::new())
    }

    /// Decode a complete DAT file, checking `cancel` once per row.
    pub fn parse_with_cancel(
        &self,
        data: &[u8],
        filename: &str,
        schema: &TableSchema,
        cancel: &CancelFlag,
    ) -> Result<ParsedTable> {
        if data.len() < MIN_DAT_FILE_SIZE {
            return Err(Error::FileTooSmall(data.len()));
        }

        let raw_count = u32::from_le_bytes(data[0..4].try_into().unwrap());
        let signed_count = raw_count as i32;
        if !(0..=MAX_ROW_COUNT).contains(&signed_count) {
            return Err(Error::RowCountExceedsLimit(signed_count));
        }
        let row_count = raw_count;

        let width = ParserWidth::for_filename(filename);
        let schema_row_size = Self::row_size(schema, width);

        let boundary =
            find_aligned_boundary(&data[4..], row_count).ok_or(Error::BoundaryNotFound {
                file_size: data.len(),
                row_count,
            })?;
        let fixed = &data[4..4 + boundary];
        let dynamic = &data[4 + boundary..];

        let row_size = if row_count > 0 {
            // the aligned boundary is authoritative; the schema-derived size
            // only serves as a cross-check
            let derived = fixed.len() / row_count as usize;
            if derived != schema_row_size {
                debug!(
                    table = %schema.name,
                    schema_row_size,
                    derived,
                    "row size adjusted to file layout"
                );
            }
            derived
        } else {
            if !fixed.is_empty() {
                return Err(Error::RowSizeMismatch {
                    fixed_len: fixed.len(),
                    row_count: 0,
                });
            }
            schema_row_size
        };

        let mut rows = Vec::with_capacity(row_count as usize);
        let mut max_fields_parsed = 0;
        for index in 0..row_count {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let start = index as usize * row_size;
            let row = self.parse_row(index, &fixed[start..start + row_size], dynamic, schema, width)?;
            max_fields_parsed = max_fields_parsed.max(row.fields_parsed);
            rows.push(row);
        }

        Ok(ParsedTable {
            name: schema.name.clone(),
            row_count,
            rows,
            metadata: ParseMetadata {
                fixed_len: fixed.len(),
                dynamic_len: dynamic.len(),
                total_len: data.len(),
                max_fields_parsed,
            },
        })
    }

    /// Row size in bytes for `schema` under the given parser width.
    pub fn row_size(schema: &TableSchema, width: ParserWidth) -> usize {
        schema
            .columns
            .iter()
            .map(|column| column_slot_size(column, width))
            .sum()
    }

    fn parse_row(
        &self,
        index: u32,
        row: &[u8],
        dynamic: &[u8],
        schema: &TableSchema,
        width: ParserWidth,
    ) -> Result<ParsedRow> {
        let mut fields = IndexMap::with_capacity(schema.columns.len());
        let mut fields_parsed = 0u32;
        let mut offset = 0usize;

        for (i, column) in schema.columns.iter().enumerate() {
            let name = column
                .name
                .clone()
                .unwrap_or_else(|| format!("Unknown{i}"));
            let slot = column_slot_size(column, width);

            if offset + slot > row.len() {
                // the schema describes more than this file carries; keep what
                // has decoded so far and stop walking the row
                debug!(field = %name, offset, slot, row_len = row.len(), "column slot exceeds row data");
                break;
            }
            let slot_data = &row[offset..offset + slot];
            offset += slot;

            let value = if column.array {
                self.read_array_field(slot_data, column, dynamic, width)?
            } else if column.interval {
                self.read_interval_field(slot_data, column.field_type, dynamic, width)?
            } else {
                self.read_scalar_field(slot_data, column.field_type, dynamic, width)?
            };

            fields.insert(name, value);
            fields_parsed += 1;
        }

        Ok(ParsedRow {
            index,
            fields,
            fields_parsed,
        })
    }

    fn read_scalar_field(
        &self,
        data: &[u8],
        field_type: FieldType,
        dynamic: &[u8],
        width: ParserWidth,
    ) -> Result<Value> {
        Ok(match field_type {
            FieldType::Bool => Value::Bool(data[0] != 0),
            FieldType::I16 => Value::I16(i16::from_le_bytes(data[0..2].try_into().unwrap())),
            FieldType::U16 => Value::U16(u16::from_le_bytes(data[0..2].try_into().unwrap())),
            FieldType::I32 => Value::I32(i32::from_le_bytes(data[0..4].try_into().unwrap())),
            FieldType::U32 => Value::U32(u32::from_le_bytes(data[0..4].try_into().unwrap())),
            FieldType::I64 => Value::I64(i64::from_le_bytes(data[0..8].try_into().unwrap())),
            FieldType::U64 => Value::U64(u64::from_le_bytes(data[0..8].try_into().unwrap())),
            FieldType::F32 => Value::F32(f32::from_le_bytes(data[0..4].try_into().unwrap())),
            FieldType::F64 => Value::F64(f64::from_le_bytes(data[0..8].try_into().unwrap())),

            FieldType::String => {
                let offset = u32::from_le_bytes(data[0..4].try_into().unwrap());
                Value::String(self.read_string(dynamic, u64::from(offset), width)?)
            }

            FieldType::Row | FieldType::ForeignRow | FieldType::EnumRow => {
                let value = u32::from_le_bytes(data[0..4].try_into().unwrap());
                Value::Row((value != NULL_ROW_SENTINEL).then_some(value))
            }

            FieldType::LongId => {
                let low = u64::from_le_bytes(data[0..8].try_into().unwrap());
                match width {
                    ParserWidth::Width32 => {
                        Value::LongId((low != NULL_LONG_ID_SENTINEL).then_some(low))
                    }
                    ParserWidth::Width64 => {
                        let high = u64::from_le_bytes(data[8..16].try_into().unwrap());
                        if low == NULL_LONG_ID_SENTINEL && high == NULL_LONG_ID_SENTINEL {
                            Value::LongId(None)
                        } else if high != 0 && high != NULL_LONG_ID_SENTINEL {
                            return Err(Error::LongIdCorrupt { low, high });
                        } else {
                            Value::LongId(Some(low))
                        }
                    }
                }
            }

            FieldType::Array => return Err(Error::UnsupportedFieldType(FieldType::Array)),
        })
    }

    fn read_interval_field(
        &self,
        data: &[u8],
        field_type: FieldType,
        dynamic: &[u8],
        width: ParserWidth,
    ) -> Result<Value> {
        let half = field_type.size(width);
        let start = self.read_scalar_field(&data[..half], field_type, dynamic, width)?;
        let end = self.read_scalar_field(&data[half..], field_type, dynamic, width)?;
        Ok(Value::Array {
            element: field_type,
            values: vec![start, end],
        })
    }

    fn read_array_field(
        &self,
        data: &[u8],
        column: &TableColumn,
        dynamic: &[u8],
        width: ParserWidth,
    ) -> Result<Value> {
        let count = u64::from(u32::from_le_bytes(data[0..4].try_into().unwrap()));
        let offset_pos = match width {
            ParserWidth::Width32 => 4,
            ParserWidth::Width64 => 8,
        };
        let offset = u64::from(u32::from_le_bytes(
            data[offset_pos..offset_pos + 4].try_into().unwrap(),
        ));

        let element = column.field_type;
        if count == u64::from(NULL_ROW_SENTINEL) || offset == u64::from(NULL_ROW_SENTINEL) {
            return Ok(Value::empty_array(element));
        }
        if count == 0 || offset == 0 {
            return Ok(Value::empty_array(element));
        }

        if count > self.options.max_array_count as u64 {
            return Err(Error::ArrayCountExceedsLimit {
                count,
                max: self.options.max_array_count,
            });
        }
        if count > self.options.array_size_warning_threshold as u64 {
            debug!(field = ?column.name, count, "large array");
        }

        if offset < MIN_DYNAMIC_OFFSET || offset >= dynamic.len() as u64 {
            return Err(Error::OffsetOutOfRange {
                kind: "array",
                offset,
                len: dynamic.len(),
            });
        }
        let heap = &dynamic[offset as usize..];
        let count = count as usize;

        if element == FieldType::String {
            // string arrays hold 4-byte offsets, each resolved recursively
            if count * 4 > heap.len() {
                return Err(Error::OffsetOutOfRange {
                    kind: "string array",
                    offset,
                    len: dynamic.len(),
                });
            }
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let element_offset =
                    u32::from_le_bytes(heap[i * 4..i * 4 + 4].try_into().unwrap());
                values.push(Value::String(self.read_string(
                    dynamic,
                    u64::from(element_offset),
                    width,
                )?));
            }
            return Ok(Value::Array {
                element,
                values,
            });
        }

        let stride = match element {
            // reference elements pack down to their u32 payload, except that
            // 64-bit files pad foreign and enum rows to 16 bytes
            FieldType::ForeignRow | FieldType::EnumRow if width == ParserWidth::Width64 => 16,
            FieldType::ForeignRow => 8,
            FieldType::Row | FieldType::EnumRow => 4,
            other => other.size(width),
        };
        if count * stride > heap.len() {
            return Err(Error::OffsetOutOfRange {
                kind: "array",
                offset,
                len: dynamic.len(),
            });
        }

        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            let at = i * stride;
            let value = match element {
                FieldType::Bool => Value::Bool(heap[at] != 0),
                FieldType::I16 => {
                    Value::I16(i16::from_le_bytes(heap[at..at + 2].try_into().unwrap()))
                }
                FieldType::U16 => {
                    Value::U16(u16::from_le_bytes(heap[at..at + 2].try_into().unwrap()))
                }
                FieldType::I32 => {
                    Value::I32(i32::from_le_bytes(heap[at..at + 4].try_into().unwrap()))
                }
                FieldType::U32 => {
                    Value::U32(u32::from_le_bytes(heap[at..at + 4].try_into().unwrap()))
                }
                FieldType::I64 => {
                    Value::I64(i64::from_le_bytes(heap[at..at + 8].try_into().unwrap()))
                }
                FieldType::U64 => {
                    Value::U64(u64::from_le_bytes(heap[at..at + 8].try_into().unwrap()))
                }
                FieldType::F32 => {
                    Value::F32(f32::from_le_bytes(heap[at..at + 4].try_into().unwrap()))
                }
                FieldType::F64 => {
                    Value::F64(f64::from_le_bytes(heap[at..at + 8].try_into().unwrap()))
                }
                FieldType::Row | FieldType::ForeignRow | FieldType::EnumRow => {
                    let raw = u32::from_le_bytes(heap[at..at + 4].try_into().unwrap());
                    Value::Row(is_valid_row_ref(raw).then_some(raw))
                }
                FieldType::String | FieldType::LongId | FieldType::Array => {
                    return Err(Error::UnsupportedFieldType(element))
                }
            };
            values.push(value);
        }

        Ok(Value::Array { element, values })
    }

    /// Read a NUL-terminated UTF-16LE string out of the dynamic heap.
    fn read_string(&self, dynamic: &[u8], offset: u64, width: ParserWidth) -> Result<String> {
        if offset == 0 || offset == u64::from(NULL_ROW_SENTINEL) {
            return Ok(String::new());
        }
        if width == ParserWidth::Width64 && offset == NULL_LONG_ID_SENTINEL {
            return Ok(String::new());
        }
        if offset < MIN_DYNAMIC_OFFSET {
            return Ok(String::new());
        }
        if offset >= dynamic.len() as u64 {
            return Err(Error::OffsetOutOfRange {
                kind: "string",
                offset,
                len: dynamic.len(),
            });
        }

        let mut units = Vec::new();
        for pair in dynamic[offset as usize..].chunks_exact(2) {
            let unit = u16::from_le_bytes(pair.try_into().unwrap());
            if unit == 0 {
                break;
            }
            units.push(unit);
            if units.len() > self.options.max_string_length {
                return Err(Error::StringTooLong {
                    offset,
                    max: self.options.max_string_length,
                });
            }
        }

        Ok(decode_utf16_units(&units))
    }
}

/// Combine UTF-16 code units into a string, recombining surrogate pairs
/// explicitly and replacing unpaired surrogates.
fn decode_utf16_units(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if (0xd800..=0xdbff).contains(&unit)
            && i + 1 < units.len()
            && (0xdc00..=0xdfff).contains(&units[i + 1])
        {
            let high = u32::from(unit - 0xd800);
            let low = u32::from(units[i + 1] - 0xdc00);
            let codepoint = 0x10000 + (high << 10) + low;
            out.push(char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER));
            i += 2;
        } else {
            out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
            i += 1;
        }
    }
    out
}

/// Slot size of one column in row data.
fn column_slot_size(column: &TableColumn, width: ParserWidth) -> usize {
    if column.array {
        FieldType::Array.size(width)
    } else {
        let size = column.field_type.size(width);
        if column.interval {
            size * 2
        } else {
            size
        }
    }
}

fn is_valid_row_ref(value: u32) -> bool {
    value != 0
        && value != NULL_ROW_SENTINEL
        && value <= MAX_FOREIGN_KEY_INDEX
        && !DEBUG_FILL_PATTERNS.contains(&value)
}

/// Find the dynamic-section boundary: the first 0xBB run whose position is an
/// integer multiple of the row count. `data` starts after the row-count
/// header. With zero rows any run is accepted.
fn find_aligned_boundary(data: &[u8], row_count: u32) -> Option<usize> {
    let mut from = 0usize;
    while from + BOUNDARY_MARKER.len() <= data.len() {
        let index = data[from..]
            .windows(BOUNDARY_MARKER.len())
            .position(|window| window == BOUNDARY_MARKER)?
            + from;
        if row_count == 0 || index % row_count as usize == 0 {
            return Some(index);
        }
        from = index + 1;
    }
    None
}
