use crate::error::{DecompressionError, DecompressionErrorExt};
use crate::inflate::Inflater;
use flate2::read::DeflateDecoder;
use std::io::Read;

/// `flate2` streaming decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeInflater;

impl Inflater for NativeInflater {
    fn name(&self) -> &'static str {
        "native"
    }

    fn inflate(&self, compressed: &[u8], size_hint: usize) -> Result<Vec<u8>, DecompressionError> {
        let mut out = Vec::with_capacity(size_hint);
        DeflateDecoder::new(compressed).read_to_end(&mut out).context("flate2 raw deflate")?;
        Ok(out)
    }
}
