//! KMZ (zipped KML) containers

use crate::{Error, Result};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry name Google Earth and most tools use for the root document
pub const ROOT_ENTRY: &str = "doc.kml";

/// Largest uncompressed root document accepted from an archive
pub const MAX_KML_SIZE: u64 = 64 * 1024 * 1024;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Whether `bytes` look like a zip archive rather than plain KML
#[inline]
pub fn is_kmz(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Extract the root KML document from a KMZ archive
///
/// Prefers `doc.kml`; otherwise the first entry ending in `.kml`. Documents
/// larger than [`MAX_KML_SIZE`] once inflated are rejected with
/// `Error::DocumentTooLarge`.
pub fn read_kmz(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index_raw(i)?.name().to_string());
    }

    let index = names
        .iter()
        .position(|name| name == ROOT_ENTRY)
        .or_else(|| {
            names
                .iter()
                .position(|name| name.to_ascii_lowercase().ends_with(".kml"))
        })
        .ok_or(Error::MissingArchiveEntry)?;

    let entry = archive.by_index(index)?;
    tracing::debug!("Reading {} from KMZ archive", entry.name());
    if entry.size() > MAX_KML_SIZE {
        return Err(Error::DocumentTooLarge {
            limit: MAX_KML_SIZE,
        });
    }
    read_limited(entry, MAX_KML_SIZE)
}

/// Read all of `reader`, failing once more than `limit` bytes come out
///
/// The declared entry size is not trusted; the inflated stream is cut off.
fn read_limited(reader: impl Read, limit: u64) -> Result<Vec<u8>> {
    let mut document = Vec::new();
    reader.take(limit + 1).read_to_end(&mut document)?;
    if document.len() as u64 > limit {
        return Err(Error::DocumentTooLarge { limit });
    }
    Ok(document)
}

/// Wrap a KML document into a KMZ archive as a deflated `doc.kml`
pub fn write_kmz(document: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(ROOT_ENTRY, options)?;
    writer.write_all(document)?;
    Ok(writer.finish()?.into_inner())
}
