//! Pack rendered parts into a DEFLATE-compressed ZIP archive.

use std::io::{Cursor, Write};

use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::package::PackageParts;

/// Serialize every part of `package` at its fixed path.
///
/// Returns the `.xlsx` file as `Vec<u8>`.
pub fn serialize(package: &PackageParts, compression_level: Option<i32>) -> Result<Vec<u8>> {
    let buf: Vec<u8> = Vec::with_capacity(package.xml_size() / 4);
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(compression_level);

    for part in &package.parts {
        writer.start_file(part.path.as_str(), options)?;
        writer.write_all(&part.data).map_err(ZipError::Io)?;
    }

    let cursor = writer.finish()?;
    let bytes = cursor.into_inner();
    tracing::debug!(
        parts = package.parts.len(),
        xml_bytes = package.xml_size(),
        zip_bytes = bytes.len(),
        "serialized package"
    );
    Ok(bytes)
}
