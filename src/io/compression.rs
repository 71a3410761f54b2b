//! Transparent compression for timeseries file I/O.
//!
//! Scenario archives are routinely shipped gzipped (`emissions.csv.gz`), so
//! every reader in this crate goes through [`auto_detect_reader`] and every
//! writer through [`auto_detect_writer`]. Detection is extension-first for
//! speed, falling back to magic bytes on the read path so a misnamed file
//! still decompresses; writers go by extension alone.
//!
//! The codec surface is a trait so embedders can wire in another algorithm
//! without touching the I/O code. The built-in codec is gzip, behind the
//! `compression-gzip` feature.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Pluggable compression codec.
///
/// Implementations must be `Send + Sync`; they are shared across the
/// parallel writer's shards.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g. "gzip").
    fn name(&self) -> &str;

    /// File extensions associated with this codec, lowercase with the
    /// leading dot (e.g. `&[".gz", ".gzip"]`).
    fn extensions(&self) -> &[&str];

    /// Magic byte signature for content-based detection, or `None` when the
    /// format has no reliable signature.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap a writer with compression.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>>;
}

/// The codecs this build knows about.
fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
    ]
}

/// Match a codec by file extension, case-insensitively.
fn detect_from_extension(path: impl AsRef<Path>) -> Option<Arc<dyn CompressionCodec>> {
    let path_str = path.as_ref().to_string_lossy().to_lowercase();
    for codec in builtin_codecs() {
        if codec.extensions().iter().any(|ext| path_str.ends_with(ext)) {
            return Some(codec);
        }
    }
    None
}

/// Match a codec by magic bytes at the start of a buffered stream.
///
/// The reader is only peeked, never advanced.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    for codec in builtin_codecs() {
        if let Some(magic) = codec.magic_bytes()
            && buf.starts_with(magic)
        {
            return Some(codec);
        }
    }
    None
}

/// Wrap a reader with decompression when the content calls for it.
///
/// Extension detection runs first; when the extension is not recognized the
/// stream's leading bytes are checked against codec signatures. Uncompressed
/// input comes back buffered and otherwise untouched.
///
/// # Errors
///
/// Returns an error if the matched codec fails to set up its decompressor.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(&path_hint) {
        return codec
            .wrap_reader_dyn(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        return codec
            .wrap_reader_dyn(Box::new(buf_reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buf_reader))
}

/// Wrap a writer with compression when the target path's extension calls for
/// it.
///
/// # Errors
///
/// Returns an error if the matched codec fails to set up its compressor.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Write>> {
    if let Some(codec) = detect_from_extension(&path_hint) {
        return codec
            .wrap_writer_dyn(Box::new(writer))
            .with_context(|| format!("wrap writer with {} codec", codec.name()));
    }
    Ok(Box::new(BufWriter::new(writer)))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::GzDecoder;
        Ok(Box::new(GzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}
