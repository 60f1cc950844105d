//! CDN URL construction and patch version handling.
//!
//! Bundles are published under
//! `https://patch.poecdn.com/<patch>/Bundles2/<name>` for 3.x patches and
//! `https://patch-poe2.poecdn.com/<patch>/Bundles2/<name>` for 4.x. The
//! fetch itself is the caller's concern; this module only names the targets.

use crate::error::{Error, Result};

/// CDN base for game generation one (3.x patches).
pub const POE1_CDN_URL: &str = "https://patch.poecdn.com";

/// CDN base for game generation two (4.x patches).
pub const POE2_CDN_URL: &str = "https://patch-poe2.poecdn.com";

/// File name of the master index on the CDN and in the cache.
pub const INDEX_FILENAME: &str = "_.index.bin";

/// Parse a patch string of the form `M.m.p.b` and return the major version.
/// Only majors 3 and 4 name a supported game generation.
pub fn parse_game_version(patch: &str) -> Result<u32> {
    let major = patch
        .split('.')
        .next()
        .and_then(|part| part.parse::<u32>().ok())
        .ok_or_else(|| Error::UnsupportedGameVersion(patch.to_string()))?;

    if !(3..=4).contains(&major) {
        return Err(Error::UnsupportedGameVersion(patch.to_string()));
    }
    Ok(major)
}

/// The CDN file name for a bundle: the index keeps its name, everything else
/// gets the `.bundle.bin` suffix.
pub fn cdn_filename(bundle_name: &str) -> String {
    if bundle_name == INDEX_FILENAME {
        bundle_name.to_string()
    } else {
        format!("{bundle_name}.bundle.bin")
    }
}

/// Build the download URL for one file of a patch.
pub fn construct_url(major: u32, patch: &str, filename: &str) -> String {
    let base = if major >= 4 { POE2_CDN_URL } else { POE1_CDN_URL };
    format!("{base}/{patch}/Bundles2/{filename}")
}
