//! Package format detection and byte-order-mark handling.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Zip local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Word-processor package formats understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// Flat HWPML markup in a single file.
    Hml,
    /// Zip archive of XML parts and binary payloads.
    Hwpx,
}

impl PackageFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            PackageFormat::Hml => "hml",
            PackageFormat::Hwpx => "hwpx",
        }
    }
}

impl std::fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageFormat::Hml => write!(f, "HML"),
            PackageFormat::Hwpx => write!(f, "HWPX"),
        }
    }
}

/// Strip a leading UTF-8 byte-order mark.
///
/// Stripping is idempotent: input without a BOM is returned unchanged, and
/// stripping twice equals stripping once.
///
/// # Example
/// ```
/// use hwpmerge::detect::strip_bom;
///
/// let raw = b"\xEF\xBB\xBF<HWPML/>";
/// assert_eq!(strip_bom(raw), b"<HWPML/>");
/// assert_eq!(strip_bom(strip_bom(raw)), strip_bom(raw));
/// ```
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Check whether data starts with a UTF-8 byte-order mark.
pub fn has_bom(data: &[u8]) -> bool {
    data.starts_with(UTF8_BOM)
}

/// Detect the package format from a file path.
///
/// # Example
/// ```no_run
/// use hwpmerge::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("exam.hml").unwrap();
/// println!("format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PackageFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = Vec::with_capacity(64);
    reader.by_ref().take(64).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the package format from leading bytes.
///
/// # Returns
/// * `Ok(PackageFormat::Hwpx)` for a zip archive
/// * `Ok(PackageFormat::Hml)` for markup (optionally preceded by a BOM and whitespace)
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PackageFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(PackageFormat::Hwpx);
    }

    let body = strip_bom(data);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => Ok(PackageFormat::Hml),
        _ => Err(Error::UnknownFormat),
    }
}

/// Check if a file is a package the engine can read.
pub fn is_package<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}
