//! This library handles reading the **bundle** archives published for *Path of Exile*
//! over its patch CDN, and the master index that maps logical file paths into them.
//!
//! # Bundle Archive Format Documentation
//!
//! A bundle is a block-compressed container carrying a single logical byte stream.
//! One or more game files live inside that stream at offsets recorded by the master
//! index (`_.index.bin`), which is itself a bundle. Bundle files are typically
//! identified with the `.bundle.bin` extension.
//!
//! ## File Structure
//!
//! A bundle consists of a fixed 60-byte header, a block-size table, and the
//! compressed block payloads concatenated back to back.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Uncompressed Size      | 4 bytes: Truncated size of the uncompressed stream         |
//! | 0x0004         | Total Payload Size     | 4 bytes: Truncated size of the compressed payload          |
//! | 0x0008         | Head Payload Size      | 4 bytes: Size of the header payload section                |
//! | 0x000C         | First File Encode      | 4 bytes: Codec selector for the first block                |
//! | 0x0010         | Unused                 | 4 bytes                                                    |
//! | 0x0014         | Uncompressed Size 64   | 8 bytes: Full size of the uncompressed stream              |
//! | 0x001C         | Total Payload Size 64  | 8 bytes: Full size of the compressed payload               |
//! | 0x0024         | Block Count            | 4 bytes: Number of compressed blocks                       |
//! | 0x0028         | Block Granularity      | 4 bytes: Uncompressed size of every block but the last     |
//! | 0x002C         | Unused                 | 16 bytes                                                   |
//!
//! ### Block Size Table
//!
//! Immediately after the header come `Block Count` little-endian `u32` values, each
//! the compressed length of one block. The compressed payload of block *i* starts at
//! `0x3C + 4 * block_count + sum(sizes[..i])`.
//!
//! ### Blocks
//!
//! Every block decompresses to exactly `Block Granularity` bytes, except the last,
//! which holds the remainder of the stream. Blocks are compressed with an Oodle
//! family codec (Kraken, Mermaid, Leviathan); decompression is performed through
//! the [`compression::Codec`] trait so that the codec stays replaceable.
//!
//! ## Master Index
//!
//! The decompressed index payload holds four sections:
//!
//! 1. A bundle list: `u32 count`, then `{u32 name_len, name, u32 uncompressed_size}`
//!    records. Names carry no `.bundle.bin` suffix.
//! 2. A file table: `u32 count`, then `{u64 path_hash, u32 bundle_id, u32 offset,
//!    u32 length}` records. Hashes must be unique.
//! 3. A path-rep table: `u32 count`, then `{u64 path_hash, u32 offset, u32 size,
//!    u32 recursive_size}` records addressing into the path-rep data.
//! 4. An embedded bundle holding the path-rep data: a compact prefix encoding that
//!    expands into the full set of logical file paths.
//!
//! File paths are matched back to file-table entries through two generations of
//! path hash (see [`hash`]): MurmurHash64A for modern patches, FNV-1a with a `"++"`
//! suffix for legacy ones.
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.bundle.bin`, `_.index.bin` for the index
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod cache;
pub mod cdn;
pub mod compression;
pub mod discovery;
pub mod error;
pub mod hash;
pub mod index;
pub mod manager;
pub mod read;
pub mod resolve;
pub mod sprite;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use compression::{Codec, OodleCodec, StoredCodec};
pub use index::BundleIndex;
pub use manager::BundleManager;
pub use read::BundleReader;
