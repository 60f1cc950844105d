//! Fixture builders shared by the unit tests. Bundles built here use the
//! stored (identity) codec, so block payloads equal their uncompressed bytes.

/// Build a bundle file whose uncompressed stream is `content`, split into
/// blocks of `granularity` bytes.
pub fn stored_bundle(content: &[u8], granularity: u32) -> Vec<u8> {
    let blocks: Vec<&[u8]> = if content.is_empty() {
        Vec::new()
    } else {
        content.chunks(granularity as usize).collect()
    };

    let mut out = Vec::new();
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes()); // first_file_encode: Kraken
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(content.len() as i64).to_le_bytes());
    out.extend_from_slice(&(content.len() as i64).to_le_bytes());
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    out.extend_from_slice(&granularity.to_le_bytes());
    out.extend_from_slice(&[0u8; 16]);

    for block in &blocks {
        out.extend_from_slice(&(block.len() as u32).to_le_bytes());
    }
    for block in &blocks {
        out.extend_from_slice(block);
    }
    out
}

/// Build a decompressed master-index payload from bundle names, file-table
/// entries, and the path-rep sections.
///
/// `files` are `(path_hash, bundle_id, offset, length)` tuples. `pathreps`
/// are `(path_hash, offset, size, recursive_size)` tuples addressing into
/// `path_data`, which is wrapped into the embedded stored bundle.
pub fn index_payload(
    bundles: &[&str],
    files: &[(u64, u32, u32, u32)],
    pathreps: &[(u64, u32, u32, u32)],
    path_data: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(bundles.len() as u32).to_le_bytes());
    for name in bundles {
        out.extend_from_slice(&(name.len() as u32).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size, unused
    }

    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    for (hash, bundle_id, offset, length) in files {
        out.extend_from_slice(&hash.to_le_bytes());
        out.extend_from_slice(&bundle_id.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&length.to_le_bytes());
    }

    out.extend_from_slice(&(pathreps.len() as u32).to_le_bytes());
    for (hash, offset, size, recursive_size) in pathreps {
        out.extend_from_slice(&hash.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&recursive_size.to_le_bytes());
    }

    out.extend_from_slice(&stored_bundle(path_data, 256));
    out
}

/// Encode one path-rep section in the compact prefix encoding. Decoding
/// starts in the output phase; the first zero marker switches to the names
/// phase for `names`, a second zero switches back for `outputs`. Each entry
/// is a `(marker, text)` pair: a 1-based marker prepends the previously
/// emitted name at that index, while a marker past the name list (such as
/// `u32::MAX`) emits the text verbatim.
pub fn pathspec(names: &[(u32, &str)], outputs: &[(u32, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes()); // -> phase 0 (names)
    for (n, text) in names {
        out.extend_from_slice(&n.to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    }
    out.extend_from_slice(&0u32.to_le_bytes()); // -> phase 1 (outputs)
    for (n, text) in outputs {
        out.extend_from_slice(&n.to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    }
    out
}
