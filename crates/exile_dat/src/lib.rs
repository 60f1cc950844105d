//! This library decodes the **DAT** table files of *Path of Exile* under the
//! community-maintained schema, producing typed rows.
//!
//! # DAT File Format Documentation
//!
//! A DAT file is a two-section binary table: fixed-width rows followed by a
//! shared variable-length heap. Files are typically identified with the
//! `.datc64` extension; the extension selects the parser width (see below).
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field          | Description                                       |
//! |----------------|----------------|---------------------------------------------------|
//! | 0x0000         | Row Count      | 4 bytes: Number of fixed-width rows               |
//! | 0x0004         | Fixed Data     | `row_count * row_size` bytes of row data          |
//! | ...            | Boundary       | 8 bytes: 0xBB marker separating the two sections  |
//! | ...            | Dynamic Data   | Variable-length heap (strings, arrays)            |
//!
//! The boundary marker doubles as the first 8 bytes of the dynamic section,
//! so no valid heap offset is ever below 8. Because an 8-byte 0xBB run can
//! also occur inside row data, the real boundary is the first run whose
//! position relative to the end of the row-count header is an integer
//! multiple of the row count; dividing by the row count then yields the
//! actual row size, which takes precedence over the schema-derived one.
//!
//! ## Parser Width
//!
//! `.dat` and `.datl` files are 32-bit; `.dat64`, `.datl64`, `.datc`, and
//! `.datc64` are 64-bit. The width governs reference and array-slot sizes
//! only: string and array heap offsets stay 32-bit little-endian either way.
//!
//! ## Field Encoding
//!
//! Scalars are little-endian at their natural sizes. Strings store a heap
//! offset in the low half of an 8-byte slot; the heap bytes are
//! NUL-terminated UTF-16LE. Row references store a row index in the low 4
//! bytes of their slot with `0xFEFEFEFE` as the null sentinel; 64-bit long
//! references use `0xFEFEFEFE_FEFEFEFE`. Arrays store `{u32 count, u32 heap
//! offset}` and their elements sit contiguously in the heap.
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.dat`, `.datl`, `.dat64`, `.datl64`, `.datc`, `.datc64`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod error;
pub mod filter;
pub mod parser;
pub mod read;
pub mod schema;
pub mod types;

pub use parser::{CancelFlag, DatParser, ParserOptions};
pub use read::TableReader;
pub use schema::CommunitySchema;
pub use types::{ParsedRow, ParsedTable, Value};
