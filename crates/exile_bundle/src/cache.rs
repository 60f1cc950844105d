//! On-disk layout of the bundle cache.
//!
//! Downloaded files live under `<root>/<patch>/`, one file per bundle. Bundle
//! names may contain `/` and spaces; those are flattened to `_` so that names
//! like `Folders/metadata` and `Folders/metadata/49` cannot collide as a file
//! and a directory.

use std::path::{Path, PathBuf};

/// Path layout of the local bundle cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// A layout rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The default cache root, `$HOME/.exiledb/cache`.
    pub fn default_root() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".exiledb")
            .join("cache")
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all files of one patch.
    pub fn patch_dir(&self, patch: &str) -> PathBuf {
        self.root.join(patch)
    }

    /// Location of the cached master index for a patch.
    pub fn index_path(&self, patch: &str) -> PathBuf {
        self.patch_dir(patch).join("_.index.bin")
    }

    /// Location of the cached community schema document.
    pub fn schema_path(&self) -> PathBuf {
        self.root.join("schema.min.json")
    }

    /// Location of a cached bundle file for a patch.
    pub fn bundle_path(&self, patch: &str, bundle_name: &str) -> PathBuf {
        self.patch_dir(patch).join(safe_bundle_name(bundle_name))
    }
}

impl Default for CacheLayout {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Flatten a bundle name into a single safe file name.
pub fn safe_bundle_name(name: &str) -> String {
    name.replace(['/', ' '], "_")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{safe_bundle_name, CacheLayout};

    #[test]
    fn safe_names() {
        assert_eq!(safe_bundle_name("Folders/metadata"), "Folders_metadata");
        assert_eq!(
            safe_bundle_name("Data/Simplified Chinese"),
            "Data_Simplified_Chinese"
        );
    }

    #[test]
    fn layout_paths() {
        let layout = CacheLayout::new("/tmp/cache");
        assert_eq!(
            layout.index_path("3.25.1.1"),
            std::path::Path::new("/tmp/cache/3.25.1.1/_.index.bin")
        );
        assert_eq!(
            layout.bundle_path("3.25.1.1", "Folders/metadata.bundle.bin"),
            std::path::Path::new("/tmp/cache/3.25.1.1/Folders_metadata.bundle.bin")
        );
    }
}
