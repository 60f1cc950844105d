//! Types for reading bundle archives
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use std::{
    io::{Cursor, Read, Seek, SeekFrom},
    sync::{Arc, Mutex},
};

use crate::{
    compression::{Codec, OodleCodec},
    error::{Error, Result},
    types::{BundleBlock, BundleHead, BUNDLE_HEAD_LEN},
};

/// Bundle archive reader
///
/// Exposes random access over the logical uncompressed stream of a bundle.
/// Only the blocks touched by a request are decompressed, and the most
/// recently decompressed block is kept so sequential reads do not pay for
/// the same block twice.
///
/// The reader serializes access internally, so a single instance may be
/// shared between threads.
///
/// ```no_run
/// use std::fs::File;
///
/// fn read_whole_bundle(f: File) -> exile_bundle::error::Result<Vec<u8>> {
///     let bundle = exile_bundle::BundleReader::new(f)?;
///     bundle.read_all()
/// }
/// ```
pub struct BundleReader<R> {
    inner: Mutex<Inner<R>>,
    head: BundleHead,
    blocks: Vec<BundleBlock>,
    codec: Arc<dyn Codec>,
}

struct Inner<R> {
    reader: R,
    cached: Option<CachedBlock>,
}

struct CachedBlock {
    index: usize,
    data: Vec<u8>,
}

impl<R: Read + Seek> BundleReader<R> {
    /// Read a bundle's header and block table, using the production Oodle codec
    /// for block decompression.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_codec(reader, Arc::new(OodleCodec))
    }

    /// Read a bundle's header and block table with an explicit block codec.
    pub fn with_codec(mut reader: R, codec: Arc<dyn Codec>) -> Result<Self> {
        let mut head_bytes = [0u8; BUNDLE_HEAD_LEN];
        reader
            .read_exact(&mut head_bytes)
            .map_err(|_| Error::HeaderTooShort)?;
        let head = BundleHead::read(&mut Cursor::new(&head_bytes))?;

        if head.block_granularity == 0 {
            return Err(Error::InvalidGranularity);
        }

        let mut blocks = Vec::with_capacity(head.block_count as usize);
        let mut offset = (BUNDLE_HEAD_LEN + 4 * head.block_count as usize) as u64;
        for _ in 0..head.block_count {
            let length = reader
                .read_u32::<LittleEndian>()
                .map_err(|_| Error::BlockTableTooShort {
                    expected: head.block_count,
                })? as u64;
            blocks.push(BundleBlock { offset, length });
            offset += length;
        }

        let size = head.uncompressed_size_64;
        let granularity = i64::from(head.block_granularity);
        let computed = (size / granularity + i64::from(size % granularity > 0)) as u32;
        if computed != head.block_count {
            return Err(Error::BlockCountMismatch {
                declared: head.block_count,
                computed,
                size,
                granularity,
            });
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                reader,
                cached: None,
            }),
            head,
            blocks,
            codec,
        })
    }

    /// Size of the uncompressed logical stream in bytes.
    pub fn size(&self) -> i64 {
        self.head.uncompressed_size_64
    }

    /// Fill `dst` with logical bytes starting at `offset`.
    ///
    /// Fails with [`Error::OutOfBounds`] when any part of the request falls
    /// past the end of the stream. The same request always yields the same
    /// bytes.
    pub fn read_at(&self, dst: &mut [u8], offset: i64) -> Result<()> {
        let size = self.size();
        if offset < 0 || offset + dst.len() as i64 > size {
            return Err(Error::OutOfBounds {
                offset,
                len: dst.len(),
                size,
            });
        }

        let granularity = i64::from(self.head.block_granularity);
        let mut inner = self.inner.lock().expect("bundle reader lock poisoned");

        let mut copied = 0usize;
        let mut offset = offset;
        while copied < dst.len() {
            let block_index = (offset / granularity) as usize;
            let block_offset = (offset % granularity) as usize;

            let block = self.decompress_block(&mut inner, block_index)?;
            let chunk = &block[block_offset..];
            let n = chunk.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            copied += n;
            offset += n as i64;
        }

        Ok(())
    }

    /// Return the entire uncompressed contents of the bundle.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.size() as usize];
        self.read_at(&mut data, 0)?;
        Ok(data)
    }

    fn decompress_block<'a>(
        &self,
        inner: &'a mut Inner<R>,
        index: usize,
    ) -> Result<&'a [u8]> {
        let hit = matches!(&inner.cached, Some(c) if c.index == index);
        if !hit {
            let block = self.blocks[index];
            let granularity = i64::from(self.head.block_granularity);

            let raw_size = if index == self.blocks.len() - 1 {
                (self.size() - index as i64 * granularity) as usize
            } else {
                granularity as usize
            };

            let mut compressed = vec![0u8; block.length as usize];
            inner.reader.seek(SeekFrom::Start(block.offset))?;
            inner.reader.read_exact(&mut compressed)?;

            let mut data = vec![0u8; raw_size];
            self.codec.decompress(&compressed, &mut data)?;
            inner.cached = Some(CachedBlock { index, data });
        }

        Ok(&inner.cached.as_ref().unwrap().data)
    }
}
