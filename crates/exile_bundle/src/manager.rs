//! High-level access to files in a cached bundle tree.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    cache::CacheLayout,
    cdn::cdn_filename,
    compression::{Codec, OodleCodec},
    error::{Error, Result},
    index::{BundleIndex, FileRecord},
    read::BundleReader,
    resolve::{candidate_paths, DEFAULT_LANGUAGE},
};

/// File access over a patch's cached bundle tree.
///
/// Loads the master index once, then serves [`BundleManager::read_file`]
/// requests by locating the owning bundle, opening it lazily, and reading the
/// file's byte range out of the uncompressed stream. Opened bundle readers
/// are kept for the lifetime of the manager.
///
/// Requests for `data/` paths are expanded through the configured language
/// preference: a language-specific override wins when present, and a missing
/// variant silently falls back to the English base file.
pub struct BundleManager {
    layout: CacheLayout,
    patch: String,
    index: BundleIndex,
    languages: Vec<String>,
    codec: Arc<dyn Codec>,
    readers: Mutex<IndexMap<String, Arc<BundleReader<File>>>>,
}

impl BundleManager {
    /// Open the bundle tree of `patch` under the given cache root, using the
    /// production Oodle codec.
    pub fn open(cache_root: impl Into<PathBuf>, patch: &str) -> Result<Self> {
        Self::open_with_codec(cache_root, patch, Arc::new(OodleCodec))
    }

    /// Open the bundle tree with an explicit block codec.
    pub fn open_with_codec(
        cache_root: impl Into<PathBuf>,
        patch: &str,
        codec: Arc<dyn Codec>,
    ) -> Result<Self> {
        let layout = CacheLayout::new(cache_root);
        let index_path = layout.index_path(patch);
        let index_data = std::fs::read(&index_path)?;
        let index = BundleIndex::decode(&index_data, codec.clone())?;
        debug!(file_count = index.files().len(), "bundle index loaded");

        Ok(Self {
            layout,
            patch: patch.to_string(),
            index,
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            codec,
            readers: Mutex::new(IndexMap::new()),
        })
    }

    /// Configure the ordered language preference used to resolve `data/`
    /// paths. An empty list resets to English only.
    pub fn set_languages(&mut self, languages: &[String]) {
        if languages.is_empty() {
            self.languages = vec![DEFAULT_LANGUAGE.to_string()];
        } else {
            self.languages = languages.to_vec();
        }
    }

    /// The decoded master index.
    pub fn index(&self) -> &BundleIndex {
        &self.index
    }

    /// Whether any language variant of `path` exists in the index.
    pub fn file_exists(&self, path: &str) -> bool {
        candidate_paths(path, &self.languages)
            .iter()
            .any(|p| self.index.lookup(p).is_some())
    }

    /// Read the entire contents of a file, trying language-specific paths in
    /// preference order.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut last_err = None;
        for candidate in candidate_paths(path, &self.languages) {
            let Some(record) = self.index.lookup(&candidate) else {
                debug!(path = %candidate, "file not in index");
                continue;
            };

            match self.read_from_bundle(record) {
                Ok(content) => return Ok(content),
                Err(e) => {
                    debug!(path = %candidate, error = %e, "reading file from bundle failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::FileNotFound(path.to_string())))
    }

    fn read_from_bundle(&self, record: &FileRecord) -> Result<Vec<u8>> {
        let bundle_name = self
            .index
            .bundle_name(record.bundle_id)
            .ok_or_else(|| Error::FileNotFound(record.path.clone()))?;

        let mut bundle_path = self
            .layout
            .bundle_path(&self.patch, &cdn_filename(bundle_name));
        if !bundle_path.exists() {
            // legacy caches stored bundles without the CDN suffix
            bundle_path = self.layout.bundle_path(&self.patch, bundle_name);
        }

        // a directly cached .dat64 may be a raw DAT with no bundle header
        let ext_is_dat = bundle_path
            .extension()
            .is_some_and(|ext| ext == "dat64" || ext == "dat");
        if ext_is_dat && is_raw_dat_file(&bundle_path)? {
            return Ok(std::fs::read(&bundle_path)?);
        }

        let reader = self.bundle_reader(bundle_name, &bundle_path)?;
        let mut content = vec![0u8; record.size as usize];
        reader.read_at(&mut content, i64::from(record.offset))?;
        Ok(content)
    }

    fn bundle_reader(&self, name: &str, path: &Path) -> Result<Arc<BundleReader<File>>> {
        let mut readers = self.readers.lock().expect("bundle cache lock poisoned");
        if let Some(reader) = readers.get(name) {
            return Ok(reader.clone());
        }

        let file = File::open(path)?;
        let reader = Arc::new(BundleReader::with_codec(file, self.codec.clone())?);
        readers.insert(name.to_string(), reader.clone());
        Ok(reader)
    }
}

/// Sniff whether a file is a stand-alone DAT rather than a bundle container:
/// the first KiB must contain the 8-byte 0xBB boundary run at an offset of at
/// least 4, and the leading u32 must be a plausible row count.
fn is_raw_dat_file(path: &Path) -> Result<bool> {
    const BOUNDARY: [u8; 8] = [0xbb; 8];

    let mut head = [0u8; 1024];
    let mut file = File::open(path)?;
    let mut n = 0;
    while n < head.len() {
        let read = file.read(&mut head[n..])?;
        if read == 0 {
            break;
        }
        n += read;
    }

    if n < 12 {
        return Ok(false);
    }

    let row_count = u32::from_le_bytes(head[0..4].try_into().unwrap());
    if row_count == 0 || row_count >= 1_000_000 {
        return Ok(false);
    }

    Ok(head[4..n].windows(8).any(|window| window == BOUNDARY))
}

#[cfg(test)]
mod test {
    use super::is_raw_dat_file;

    #[test]
    fn raw_dat_sniffing() {
        let dir = tempfile::tempdir().unwrap();

        let mut dat = vec![2u8, 0, 0, 0];
        dat.extend_from_slice(&[0u8; 16]);
        dat.extend_from_slice(&[0xbb; 8]);
        let dat_path = dir.path().join("some.dat64");
        std::fs::write(&dat_path, &dat).unwrap();
        assert!(is_raw_dat_file(&dat_path).unwrap());

        // implausible row count
        let mut bogus = vec![0xffu8, 0xff, 0xff, 0x7f];
        bogus.extend_from_slice(&[0u8; 16]);
        bogus.extend_from_slice(&[0xbb; 8]);
        let bogus_path = dir.path().join("bogus.dat64");
        std::fs::write(&bogus_path, &bogus).unwrap();
        assert!(!is_raw_dat_file(&bogus_path).unwrap());

        // no boundary marker
        let plain_path = dir.path().join("plain.dat64");
        std::fs::write(&plain_path, [1u8, 0, 0, 0, 9, 9, 9, 9, 9, 9, 9, 9]).unwrap();
        assert!(!is_raw_dat_file(&plain_path).unwrap());
    }
}
