//! Types for decoding the master bundle index
//!

use std::io::Cursor;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::debug;

use crate::{
    compression::Codec,
    error::{Error, Result},
    hash::{fnv_hash_path, murmur_hash_path},
    read::BundleReader,
};

/// One file entry of the index, addressing a byte range inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Logical path of the file, lowercased as the game stores it
    pub path: String,

    /// Position into the index's bundle name list
    pub bundle_id: u32,

    /// Offset of the file inside the bundle's uncompressed stream
    pub offset: u32,

    /// Length of the file in bytes
    pub size: u32,
}

/// A resolved file location, pairing a [`FileRecord`] with its bundle name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLocation<'a> {
    /// Bundle name without the `.bundle.bin` suffix
    pub bundle: &'a str,

    /// Offset of the file inside the bundle's uncompressed stream
    pub offset: u32,

    /// Length of the file in bytes
    pub size: u32,
}

struct PathRep {
    offset: u32,
    size: u32,
}

/// The decoded master index: the ordered bundle name list plus every file
/// whose path hash could be resolved back to a path, sorted by path.
///
/// The index is immutable once built and may be shared freely across threads.
pub struct BundleIndex {
    bundles: Vec<String>,
    files: Vec<FileRecord>,
}

impl BundleIndex {
    /// Decode the raw contents of `_.index.bin`, which is itself a bundle.
    pub fn decode(data: &[u8], codec: Arc<dyn Codec>) -> Result<Self> {
        let outer = BundleReader::with_codec(Cursor::new(data), codec.clone())?;
        let payload = outer.read_all()?;
        Self::from_payload(&payload, codec)
    }

    /// Decode an already-decompressed index payload. The canonical on-disk
    /// layout is a bundle; this entry point exists for raw payloads produced
    /// in tests.
    pub fn from_payload(payload: &[u8], codec: Arc<dyn Codec>) -> Result<Self> {
        let mut r = SectionReader::new(payload);

        let bundle_count = r.u32()?;
        let mut bundles = Vec::with_capacity(bundle_count as usize);
        for _ in 0..bundle_count {
            let name_len = r.u32()? as usize;
            let name = String::from_utf8_lossy(r.bytes(name_len)?).into_owned();
            r.u32()?; // uncompressed size, available elsewhere
            bundles.push(name);
        }

        let file_count = r.u32()?;
        let mut files = Vec::with_capacity(file_count as usize);
        let mut filemap = HashMap::with_capacity(file_count as usize);
        for i in 0..file_count {
            let hash = r.u64()?;
            files.push(FileRecord {
                path: String::new(),
                bundle_id: r.u32()?,
                offset: r.u32()?,
                size: r.u32()?,
            });
            if filemap.insert(hash, i as usize).is_some() {
                return Err(Error::DuplicateHash { hash });
            }
        }

        let pathrep_count = r.u32()?;
        let mut pathreps = Vec::with_capacity(pathrep_count as usize);
        let mut seen = HashSet::with_capacity(pathrep_count as usize);
        for _ in 0..pathrep_count {
            let hash = r.u64()?;
            let rep = PathRep {
                offset: r.u32()?,
                size: r.u32()?,
            };
            r.u32()?; // recursive size, unused
            if !seen.insert(hash) {
                return Err(Error::DuplicateHash { hash });
            }
            pathreps.push(rep);
        }

        // the remainder of the payload is another bundle holding the path data
        let inner = BundleReader::with_codec(Cursor::new(r.remainder()), codec)
            .map_err(|e| Error::EmbeddedBundleError(Box::new(e)))?;
        let path_data = inner
            .read_all()
            .map_err(|e| Error::EmbeddedBundleError(Box::new(e)))?;

        for rep in &pathreps {
            let start = rep.offset as usize;
            let end = start + rep.size as usize;
            let section = path_data.get(start..end).ok_or(Error::IndexTruncated {
                offset: path_data.len(),
            })?;

            for path in read_pathspec(section) {
                // modern hash first, then the legacy generation; paths that
                // match no file are not an error
                let entry = filemap
                    .get(&murmur_hash_path(&path))
                    .or_else(|| filemap.get(&fnv_hash_path(&path)));
                if let Some(&idx) = entry {
                    files[idx].path = path;
                }
            }
        }

        let total = files.len();
        files.retain(|f| !f.path.is_empty());
        if files.len() < total {
            debug!(
                unresolved = total - files.len(),
                "index entries without a resolved path"
            );
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Self { bundles, files })
    }

    /// All bundle names, in index order.
    pub fn bundles(&self) -> &[String] {
        &self.bundles
    }

    /// Look up a bundle name by its id in the file table.
    pub fn bundle_name(&self, bundle_id: u32) -> Option<&str> {
        self.bundles.get(bundle_id as usize).map(String::as_str)
    }

    /// Every file with a resolved path, sorted by path ascending.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Find a file by its exact logical path.
    pub fn lookup(&self, path: &str) -> Option<&FileRecord> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.files[i])
    }

    /// Find a file and pair it with the name of the bundle holding it.
    pub fn location(&self, path: &str) -> Option<FileLocation<'_>> {
        let file = self.lookup(path)?;
        Some(FileLocation {
            bundle: self.bundle_name(file.bundle_id)?,
            offset: file.offset,
            size: file.size,
        })
    }
}

/// Expand one path-rep section into full paths.
///
/// The encoding is a two-phase state machine that starts in the output phase.
/// A zero marker toggles the phase; any other marker `n` reads a
/// NUL-terminated string, prefixing it with the `n-1`th previously emitted
/// name when one exists. Phase 0 grows the name list, phase 1 emits paths.
fn read_pathspec(data: &[u8]) -> Vec<String> {
    let mut p = 0usize;
    let mut phase = 1u8;
    let mut names: Vec<String> = Vec::new();
    let mut output = Vec::new();

    while p + 4 <= data.len() {
        let n = u32::from_le_bytes(data[p..p + 4].try_into().unwrap()) as usize;
        p += 4;
        if n == 0 {
            phase = 1 - phase;
            continue;
        }

        let mut s = read_pathspec_string(data, &mut p);
        if let Some(prefix) = names.get(n - 1) {
            s = format!("{prefix}{s}");
        }
        if phase == 0 {
            names.push(s);
        } else {
            output.push(s);
        }
    }

    output
}

fn read_pathspec_string(data: &[u8], offset: &mut usize) -> String {
    let start = *offset;
    let mut p = start;
    while p < data.len() && data[p] != 0 {
        p += 1;
    }
    let s = String::from_utf8_lossy(&data[start..p]).into_owned();
    *offset = p + 1;
    s
}

/// Incremental little-endian reader over the index payload, reporting the
/// offset of any truncation.
struct SectionReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::IndexTruncated { offset: self.pos })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.bytes(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.bytes(8)?.try_into().unwrap()))
    }

    fn remainder(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::compression::StoredCodec;
    use crate::error::Error;
    use crate::hash::{fnv_hash_path, murmur_hash_path};
    use crate::index::BundleIndex;
    use crate::testutil::{index_payload, pathspec, stored_bundle};

    fn decode(payload: &[u8]) -> crate::error::Result<BundleIndex> {
        BundleIndex::from_payload(payload, Arc::new(StoredCodec))
    }

    #[test]
    fn decode_index_with_both_hash_generations() {
        let modern = "data/baseitemtypes.datc64";
        let legacy = "data/mods.datc64";
        let ignored = "data/unreferenced.datc64";

        let path_data = pathspec(
            &[(u32::MAX, "data/")],
            &[
                (1, "baseitemtypes.datc64"),
                (1, "mods.datc64"),
                (1, "unreferenced.datc64"),
            ],
        );

        let payload = index_payload(
            &["Data", "Other"],
            &[
                (murmur_hash_path(modern), 0, 0, 100),
                (fnv_hash_path(legacy), 1, 100, 50),
            ],
            &[(murmur_hash_path("data/"), 0, path_data.len() as u32, 0)],
            &path_data,
        );

        let index = decode(&payload).unwrap();
        assert_eq!(index.bundles(), &["Data".to_string(), "Other".to_string()]);

        // sorted by path, only resolved entries exported
        let paths: Vec<&str> = index.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![modern, legacy]);

        let loc = index.location(modern).unwrap();
        assert_eq!((loc.bundle, loc.offset, loc.size), ("Data", 0, 100));

        let loc = index.location(legacy).unwrap();
        assert_eq!((loc.bundle, loc.offset, loc.size), ("Other", 100, 50));

        // the third path hashed to no file and was silently dropped
        assert!(index.lookup(ignored).is_none());
    }

    #[test]
    fn file_without_path_is_not_exported() {
        let path_data = pathspec(&[], &[]);
        let payload = index_payload(&["Data"], &[(1234, 0, 0, 10)], &[], &path_data);

        let index = decode(&payload).unwrap();
        assert!(index.files().is_empty());
        assert_eq!(index.bundles().len(), 1);
    }

    #[test]
    fn duplicate_hash_is_fatal() {
        let path_data = pathspec(&[], &[]);
        let payload = index_payload(
            &["Data"],
            &[(42, 0, 0, 10), (42, 0, 10, 10)],
            &[],
            &path_data,
        );

        assert!(matches!(
            decode(&payload),
            Err(Error::DuplicateHash { hash: 42 })
        ));
    }

    #[test]
    fn truncated_index() {
        let path_data = pathspec(&[], &[]);
        let payload = index_payload(&["Data"], &[(42, 0, 0, 10)], &[], &path_data);

        // chopping inside the file table loses the embedded bundle first
        assert!(matches!(
            decode(&payload[..payload.len() - 70]),
            Err(Error::IndexTruncated { .. }) | Err(Error::EmbeddedBundleError(_))
        ));
        // chopping inside the bundle list is a plain truncation
        assert!(matches!(
            decode(&payload[..6]),
            Err(Error::IndexTruncated { .. })
        ));
    }

    #[test]
    fn decode_outer_bundle() {
        let path_data = pathspec(&[], &[(u32::MAX, "data/one.datc64")]);
        let payload = index_payload(
            &["Data"],
            &[(murmur_hash_path("data/one.datc64"), 0, 0, 4)],
            &[(murmur_hash_path("data/"), 0, path_data.len() as u32, 0)],
            &path_data,
        );

        let raw = stored_bundle(&payload, 64);
        let index = BundleIndex::decode(&raw, Arc::new(StoredCodec)).unwrap();
        assert_eq!(index.files().len(), 1);
        assert_eq!(index.files()[0].path, "data/one.datc64");
    }

    #[test]
    fn pathspec_prefix_chaining() {
        // names built on names: "data/" then "data/french/"
        let path_data = pathspec(
            &[(u32::MAX, "data/"), (1, "french/")],
            &[(2, "mods.datc64")],
        );
        let path = "data/french/mods.datc64";
        let payload = index_payload(
            &["Data"],
            &[(murmur_hash_path(path), 0, 0, 1)],
            &[(murmur_hash_path("data/"), 0, path_data.len() as u32, 0)],
            &path_data,
        );

        let index = decode(&payload).unwrap();
        assert_eq!(index.files()[0].path, path);
    }
}
