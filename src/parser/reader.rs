//! Package reader for flat HML files and HWPX archives.

use super::xml::parse_document;
use crate::detect::{detect_format_from_bytes, strip_bom, PackageFormat};
use crate::error::{Error, Result};
use crate::model::{Package, Part, HML_PART};
use crate::schema::Schema;
use std::io::{Cursor, Read};
use std::path::Path;

/// A package whose parts are loaded but not yet parsed.
#[derive(Debug, Clone)]
pub struct RawPackage {
    pub format: PackageFormat,
    pub parts: Vec<(String, Vec<u8>)>,
}

impl RawPackage {
    /// Load the parts of a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;
        let parts = match format {
            PackageFormat::Hml => vec![(HML_PART.to_string(), data.to_vec())],
            PackageFormat::Hwpx => read_archive(data)?,
        };
        Ok(Self { format, parts })
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.parts
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }

    /// Parse markup parts into trees.
    pub fn parse(self) -> Result<Package> {
        let schema = Schema::for_format(self.format);
        let mut package = Package::new(self.format);
        for (name, data) in self.parts {
            let part = if is_xml_part(&name) {
                let text = std::str::from_utf8(strip_bom(&data)).map_err(|e| Error::Xml {
                    part: name.clone(),
                    position: e.valid_up_to() as u64,
                    message: "invalid UTF-8".to_string(),
                })?;
                Part::Xml(parse_document(text, &name)?)
            } else {
                Part::Binary(data)
            };
            package.parts.push((name, part));
        }

        if self.format == PackageFormat::Hml {
            let root = package.xml(HML_PART).map(|d| d.root.name.as_str());
            if root != Some(schema.root) {
                return Err(Error::UnknownFormat);
            }
        } else if package.xml(schema.body.part).is_none() {
            return Err(Error::Archive(format!(
                "archive has no {} part",
                schema.body.part
            )));
        }

        log::debug!(
            "read {} package with {} parts",
            package.format,
            package.parts.len()
        );
        Ok(package)
    }
}

/// Read and parse a package from bytes.
pub fn read_package(data: &[u8]) -> Result<Package> {
    RawPackage::from_bytes(data)?.parse()
}

/// Read and parse a package from a file.
pub fn read_package_file<P: AsRef<Path>>(path: P) -> Result<Package> {
    let data = std::fs::read(path)?;
    read_package(&data)
}

/// Whether an archive entry holds markup.
pub fn is_xml_part(name: &str) -> bool {
    if name == HML_PART {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".hpf") || lower.ends_with(".rdf")
}

fn read_archive(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut parts = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        parts.push((name, buf));
    }
    Ok(parts)
}
