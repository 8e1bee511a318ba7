//! Binary assets (embedded images) carried by fragments.

use super::node::Element;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use serde::Serialize;
use std::io::Read;

/// An embedded binary payload referenced from fragment markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    /// Identifier unique only within the originating fragment.
    pub id: String,

    /// Logical storage path (e.g. "BinData/image1.jpg").
    pub storage_path: String,

    /// Base64 encoded payload.
    #[serde(skip_serializing)]
    pub payload: String,

    /// File-type suffix without the dot.
    pub extension: String,

    /// Whether the decoded payload is raw-deflate compressed.
    pub compressed: bool,

    /// Declaration element from the source item table or manifest.
    #[serde(skip_serializing)]
    pub declaration: Element,
}

impl Asset {
    /// Create an asset from raw bytes.
    pub fn from_bytes(
        id: impl Into<String>,
        storage_path: impl Into<String>,
        data: &[u8],
        declaration: Element,
    ) -> Self {
        let storage_path = storage_path.into();
        let extension = extension_of(&storage_path)
            .map(str::to_string)
            .or_else(|| detect_mime_type(data).map(|m| extension_for_mime(m).to_string()))
            .unwrap_or_else(|| "bin".to_string());
        Self {
            id: id.into(),
            storage_path,
            payload: STANDARD.encode(data),
            extension,
            compressed: false,
            declaration,
        }
    }

    /// Decode the payload to raw bytes, inflating compressed payloads.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let cleaned: String = self
            .payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let raw = STANDARD.decode(cleaned.as_bytes())?;
        if !self.compressed {
            return Ok(raw);
        }
        let mut out = Vec::new();
        DeflateDecoder::new(raw.as_slice()).read_to_end(&mut out)?;
        Ok(out)
    }

    /// Decoded (stored) payload size in bytes, as recorded in the package.
    pub fn size(&self) -> usize {
        let len = self
            .payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .count();
        let padding = self.payload.trim_end().bytes().rev().take_while(|b| *b == b'=').count();
        (len / 4 * 3).saturating_sub(padding)
    }

    /// MIME type inferred from the file extension.
    pub fn mime_type(&self) -> &'static str {
        mime_for_extension(&self.extension)
    }
}

/// Storage path for a numbered payload (`BinData/BIN0007.png`).
pub fn bin_storage_path(storage_id: &str, extension: &str) -> String {
    match storage_id.trim().parse::<u32>() {
        Ok(n) => format!("BinData/BIN{:04X}.{}", n, extension),
        Err(_) => format!("BinData/{}.{}", storage_id, extension),
    }
}

/// File extension of a storage path, if any.
pub fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext).filter(|e| !e.is_empty())
}

/// MIME type for a file extension.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "wmf" => "image/x-wmf",
        "emf" => "image/x-emf",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// File extension for a MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/tiff" => "tiff",
        "image/bmp" => "bmp",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Detect MIME type from data magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}
