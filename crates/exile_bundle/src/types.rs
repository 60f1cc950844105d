//! Base types for the structure of bundle files.

use binrw::BinRead;

/// Size of the fixed bundle header in bytes.
pub const BUNDLE_HEAD_LEN: usize = 60;

/// Bundle file header
///
/// All data is stored in little endian format. The header is always 60 bytes;
/// the fields not listed here are padding the format leaves unused.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(little)]
pub struct BundleHead {
    /// Size of the uncompressed stream, truncated to 32 bits
    pub uncompressed_size: u32,

    /// Size of the compressed payload, truncated to 32 bits
    pub total_payload_size: u32,

    /// Size of the header payload section
    pub head_payload_size: u32,

    /// Codec selector recorded for the first block
    pub first_file_encode: u32,

    /// Full size of the uncompressed stream
    #[br(pad_before = 4)]
    pub uncompressed_size_64: i64,

    /// Full size of the compressed payload
    pub total_payload_size_64: i64,

    /// Number of compressed blocks
    pub block_count: u32,

    /// Uncompressed size of every block except the last
    #[br(pad_after = 16)]
    pub block_granularity: u32,
}

/// Location of one compressed block inside the bundle file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BundleBlock {
    /// Offset of the compressed payload from the start of the file
    pub offset: u64,

    /// Compressed length in bytes
    pub length: u64,
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use pretty_assertions::assert_eq;

    use crate::types::{BundleHead, BUNDLE_HEAD_LEN};

    #[test]
    fn read_head() {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x03, 0x00, 0x00, 0x00, // uncompressed_size
            0x07, 0x00, 0x00, 0x00, // total_payload_size
            0x00, 0x00, 0x00, 0x00, // head_payload_size
            0x08, 0x00, 0x00, 0x00, // first_file_encode
            0x00, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // uncompressed_size_64
            0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // total_payload_size_64
            0x01, 0x00, 0x00, 0x00, // block_count
            0x40, 0x00, 0x00, 0x00, // block_granularity
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);

        let head = BundleHead::read(&mut input).unwrap();
        assert_eq!(head.uncompressed_size, 3);
        assert_eq!(head.uncompressed_size_64, 3);
        assert_eq!(head.total_payload_size_64, 7);
        assert_eq!(head.block_count, 1);
        assert_eq!(head.block_granularity, 64);
        assert_eq!(input.position() as usize, BUNDLE_HEAD_LEN);
    }
}
