//! Block decompression handling.

use crate::error::{Error, Result};

/// Decompresses one compressed block into a caller-sized buffer.
///
/// The codec is treated as untrusted: the output buffer is allocated in advance
/// at the expected uncompressed length and the codec must fill exactly that
/// many bytes. Any shortfall, overrun, or internal failure is a
/// [`Error::CodecError`].
pub trait Codec: Send + Sync {
    /// Decompress `input` into `output`, filling it completely.
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<()>;
}

/// Oodle family decoder (Kraken, Mermaid, Selkie, Leviathan) backed by the
/// pure-Rust `oozextract` implementation. This is the codec production bundle
/// files are compressed with.
#[derive(Debug, Default)]
pub struct OodleCodec;

impl Codec for OodleCodec {
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let mut extractor = oozextract::Extractor::new(input);
        extractor
            .read(output)
            .map_err(|e| Error::CodecError(format!("{e:?}")))?;
        Ok(())
    }
}

/// Copies input to output unchanged. Raw test fixtures use this in place of
/// the Oodle codec.
#[derive(Debug, Default)]
pub struct StoredCodec;

impl Codec for StoredCodec {
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if input.len() != output.len() {
            return Err(Error::CodecError(format!(
                "stored block is {} bytes but {} were expected",
                input.len(),
                output.len()
            )));
        }
        output.copy_from_slice(input);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Codec, StoredCodec};

    #[test]
    fn stored_roundtrip() {
        let mut out = [0u8; 3];
        StoredCodec.decompress(b"abc", &mut out).unwrap();
        assert_eq!(&out, b"abc");
    }

    #[test]
    fn stored_length_mismatch() {
        let mut out = [0u8; 4];
        assert!(StoredCodec.decompress(b"abc", &mut out).is_err());
    }
}
