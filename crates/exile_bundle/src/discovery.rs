//! Projection of a table/language/file selection onto the bundles that must
//! be cached before decoding can start.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
    cdn::INDEX_FILENAME,
    index::BundleIndex,
    resolve::DEFAULT_LANGUAGE,
    sprite::{is_inside_sprite, SPRITE_LISTS},
};

const DAT_EXT: &str = ".datc64";

/// Compute the set of bundle names a selection of tables, languages, and
/// explicit files requires. The index bundle itself is always part of the
/// result; the set is deduplicated and sorted.
pub fn required_bundles(
    index: &BundleIndex,
    tables: &[String],
    languages: &[String],
    files: &[String],
) -> BTreeSet<String> {
    let mut bundles = BTreeSet::new();
    bundles.insert(INDEX_FILENAME.to_string());

    if tables.is_empty() {
        // no selection: every DAT file in the tree
        for file in index.files() {
            if file.path.starts_with("data/") && file.path.ends_with(DAT_EXT) {
                if let Some(loc) = index.location(&file.path) {
                    bundles.insert(loc.bundle.to_string());
                }
            }
        }
    } else {
        for table in tables {
            let lower = table.to_lowercase();
            let path = format!("data/{lower}{DAT_EXT}");
            match index.location(&path) {
                Some(loc) => {
                    bundles.insert(loc.bundle.to_string());
                }
                None => warn!(table = %table, path = %path, "table file not found in index"),
            }

            for language in languages {
                if language == DEFAULT_LANGUAGE {
                    continue;
                }
                let lang_path = format!("data/{}/{lower}{DAT_EXT}", language.to_lowercase());
                if let Some(loc) = index.location(&lang_path) {
                    bundles.insert(loc.bundle.to_string());
                }
            }
        }
    }

    if !files.is_empty() {
        let mut needs_sprite_indices = false;

        for path in files {
            match index.location(path) {
                Some(loc) => {
                    bundles.insert(loc.bundle.to_string());
                }
                None => warn!(path = %path, "file not found in index"),
            }
            if is_inside_sprite(path) {
                needs_sprite_indices = true;
            }
        }

        if needs_sprite_indices {
            for list in SPRITE_LISTS {
                match index.location(list.path) {
                    Some(loc) => {
                        debug!(path = list.path, bundle = loc.bundle, "adding sprite index");
                        bundles.insert(loc.bundle.to_string());
                    }
                    None => warn!(path = list.path, "sprite index file not found"),
                }
            }
        }
    }

    bundles
}
