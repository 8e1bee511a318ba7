//! Package writer for flat HML files and HWPX archives.

use super::xml::document_to_string;
use crate::detect::PackageFormat;
use crate::error::{Error, Result};
use crate::model::{Package, Part, HML_PART};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Archive entry that must come first and be stored uncompressed.
const MIMETYPE: &str = "mimetype";

/// Render a package to bytes.
pub fn write_package(package: &Package) -> Result<Vec<u8>> {
    match package.format {
        PackageFormat::Hml => {
            let doc = package
                .xml(HML_PART)
                .ok_or_else(|| Error::Serialize("HML package has no document part".into()))?;
            Ok(document_to_string(doc).into_bytes())
        }
        PackageFormat::Hwpx => write_archive(package),
    }
}

fn write_archive(package: &Package) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    // mimetype first, then every other part in archive order
    let ordered = package
        .parts
        .iter()
        .filter(|(name, _)| name == MIMETYPE)
        .chain(package.parts.iter().filter(|(name, _)| name != MIMETYPE));

    for (name, part) in ordered {
        let options = if name == MIMETYPE { stored } else { deflated };
        zip.start_file(name.as_str(), options)?;
        match part {
            Part::Xml(doc) => zip.write_all(document_to_string(doc).as_bytes())?,
            Part::Binary(data) => zip.write_all(data)?,
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Write a package to a file.
pub fn write_package_file<P: AsRef<std::path::Path>>(package: &Package, path: P) -> Result<()> {
    let bytes = write_package(package)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, XmlDocument};
    use crate::parser::read_package;
    use std::io::Read;

    #[test]
    fn test_hwpx_mimetype_first_and_stored() {
        let mut pkg = Package::new(PackageFormat::Hwpx);
        pkg.insert(
            "Contents/section0.xml",
            Part::Xml(XmlDocument::new(Element::new("hs:sec"))),
        );
        pkg.insert("mimetype", Part::Binary(b"application/hwp+zip".to_vec()));

        let bytes = write_package(&pkg).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        let mut body = String::new();
        first.read_to_string(&mut body).unwrap();
        assert_eq!(body, "application/hwp+zip");
        drop(first);

        let reread = read_package(&bytes).unwrap();
        assert_eq!(
            reread.xml("Contents/section0.xml").unwrap().root.name,
            "hs:sec"
        );
    }

    #[test]
    fn test_hml_output_has_no_bom() {
        let pkg = Package::hml(XmlDocument::new(Element::new("HWPML")));
        let bytes = write_package(&pkg).unwrap();
        assert_eq!(bytes, b"<HWPML/>".to_vec());
    }
}
