//! Base types for DAT tables: field types, parser width, and decoded values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bit width of the DAT parser, selected by the file extension. The width
/// governs reference and array-slot sizes; heap offsets stay 32-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserWidth {
    /// 32-bit DAT files (`.dat`, `.datl`)
    Width32,
    /// 64-bit DAT files (`.dat64`, `.datl64`, `.datc`, `.datc64`)
    Width64,
}

impl ParserWidth {
    /// Determine the parser width from a DAT file name.
    pub fn for_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        let ext = lower.rsplit('.').next().unwrap_or("");
        match ext {
            "dat64" | "datl64" | "datc" | "datc64" => ParserWidth::Width64,
            // .dat and .datl, and anything unknown, read as the original
            // 32-bit format
            _ => ParserWidth::Width32,
        }
    }
}

/// A column type from the community schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    String,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Row index referencing the same table
    Row,
    /// Row index referencing a foreign table
    ForeignRow,
    /// Row index referencing a foreign table with no columns
    EnumRow,
    /// 64-bit row reference into a foreign table
    LongId,
    /// Column of unknown element type, always an array
    Array,
}

impl FieldType {
    /// Fixed slot size of this type in row data, in bytes.
    pub fn size(self, width: ParserWidth) -> usize {
        use FieldType::*;
        match self {
            Bool => 1,
            I16 | U16 => 2,
            I32 | U32 | F32 => 4,
            I64 | U64 | F64 => 8,
            // an offset in the low 4 bytes, the rest padding
            String => 8,
            Row => 8,
            EnumRow => 4,
            ForeignRow | LongId | Array => match width {
                ParserWidth::Width32 => 8,
                ParserWidth::Width64 => 16,
            },
        }
    }

    /// Whether this type represents a row reference.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            FieldType::Row | FieldType::ForeignRow | FieldType::EnumRow | FieldType::LongId
        )
    }
}

/// One decoded field value.
///
/// Arrays reuse the same variants for their elements and remember their
/// schema element type so empty arrays stay typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// Nullable row reference (`row`, `foreignrow`, `enumrow`)
    Row(Option<u32>),
    /// Nullable 64-bit long reference
    LongId(Option<u64>),
    Array {
        element: FieldType,
        values: Vec<Value>,
    },
}

impl Value {
    /// An empty array of the given element type.
    pub fn empty_array(element: FieldType) -> Self {
        Value::Array {
            element,
            values: Vec::new(),
        }
    }
}

/// A single decoded row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// Zero-based row index
    pub index: u32,

    /// Field values keyed by column name, in schema order
    pub fields: IndexMap<String, Value>,

    /// How many fields decoded before the row's slice ran out; equal to the
    /// column count when the schema and file agree
    pub fields_parsed: u32,
}

/// Sizes observed while decoding a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseMetadata {
    /// Length of the fixed row section in bytes
    pub fixed_len: usize,

    /// Length of the dynamic heap in bytes, including the boundary marker
    pub dynamic_len: usize,

    /// Total file length in bytes
    pub total_len: usize,

    /// The largest `fields_parsed` over all rows
    pub max_fields_parsed: u32,
}

/// A completely decoded DAT table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    /// Schema name of the table
    pub name: String,

    /// Number of rows the file declared
    pub row_count: u32,

    /// All decoded rows, in file order
    pub rows: Vec<ParsedRow>,

    /// Decode statistics
    pub metadata: ParseMetadata,
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{FieldType, ParserWidth};

    #[test]
    fn width_from_filename() {
        assert_eq!(
            ParserWidth::for_filename("data/baseitemtypes.datc64"),
            ParserWidth::Width64
        );
        assert_eq!(ParserWidth::for_filename("mods.DAT64"), ParserWidth::Width64);
        assert_eq!(ParserWidth::for_filename("mods.dat"), ParserWidth::Width32);
        assert_eq!(ParserWidth::for_filename("mods.datl"), ParserWidth::Width32);
        assert_eq!(ParserWidth::for_filename("unknown.bin"), ParserWidth::Width32);
    }

    #[test]
    fn slot_sizes_by_width() {
        use FieldType::*;
        for (ty, w32, w64) in [
            (Bool, 1, 1),
            (I16, 2, 2),
            (U32, 4, 4),
            (F64, 8, 8),
            (String, 8, 8),
            (Row, 8, 8),
            (EnumRow, 4, 4),
            (ForeignRow, 8, 16),
            (LongId, 8, 16),
            (Array, 8, 16),
        ] {
            assert_eq!(ty.size(ParserWidth::Width32), w32, "{ty:?}");
            assert_eq!(ty.size(ParserWidth::Width64), w64, "{ty:?}");
        }
    }

    #[test]
    fn field_type_from_schema_json() {
        let ty: FieldType = serde_json::from_str("\"foreignrow\"").unwrap();
        assert_eq!(ty, FieldType::ForeignRow);
        let ty: FieldType = serde_json::from_str("\"longid\"").unwrap();
        assert_eq!(ty, FieldType::LongId);
        let ty: FieldType = serde_json::from_str("\"enumrow\"").unwrap();
        assert_eq!(ty, FieldType::EnumRow);
        assert!(serde_json::from_str::<FieldType>("\"quaternion\"").is_err());
    }
}
