//! In-memory package: named XML and binary parts.

use super::node::{Element, Node};
use crate::detect::PackageFormat;

/// Part name used for the single document of a flat HML package.
pub const HML_PART: &str = "document.hml";

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Raw XML declaration content (e.g. `xml version="1.0" encoding="UTF-8"`).
    pub declaration: Option<String>,
    /// Comments, instructions and doctype between the declaration and the root.
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Nodes after the root element.
    pub epilog: Vec<Node>,
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// A single package part.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Xml(XmlDocument),
    Binary(Vec<u8>),
}

/// A package with its parts in archive order.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub format: PackageFormat,
    pub parts: Vec<(String, Part)>,
}

impl Package {
    pub fn new(format: PackageFormat) -> Self {
        Self {
            format,
            parts: Vec::new(),
        }
    }

    /// A flat HML package around one document.
    pub fn hml(document: XmlDocument) -> Self {
        Self {
            format: PackageFormat::Hml,
            parts: vec![(HML_PART.to_string(), Part::Xml(document))],
        }
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Part> {
        self.parts
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn xml(&self, name: &str) -> Option<&XmlDocument> {
        match self.part(name)? {
            Part::Xml(doc) => Some(doc),
            Part::Binary(_) => None,
        }
    }

    pub fn xml_mut(&mut self, name: &str) -> Option<&mut XmlDocument> {
        match self.part_mut(name)? {
            Part::Xml(doc) => Some(doc),
            Part::Binary(_) => None,
        }
    }

    pub fn binary(&self, name: &str) -> Option<&[u8]> {
        match self.part(name)? {
            Part::Binary(data) => Some(data),
            Part::Xml(_) => None,
        }
    }

    /// Add a part, replacing any part with the same name.
    pub fn insert(&mut self, name: impl Into<String>, part: Part) {
        let name = name.into();
        match self.parts.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = part,
            None => self.parts.push((name, part)),
        }
    }

    /// Names of all parts.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Names of all XML parts.
    pub fn xml_part_names(&self) -> Vec<String> {
        self.parts
            .iter()
            .filter(|(_, p)| matches!(p, Part::Xml(_)))
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut pkg = Package::new(PackageFormat::Hwpx);
        pkg.insert("BinData/image1.png", Part::Binary(vec![1]));
        pkg.insert("BinData/image1.png", Part::Binary(vec![2]));
        assert_eq!(pkg.parts.len(), 1);
        assert_eq!(pkg.binary("BinData/image1.png"), Some(&[2u8][..]));
        assert!(pkg.xml("BinData/image1.png").is_none());
    }

    #[test]
    fn test_hml_package() {
        let pkg = Package::hml(XmlDocument::new(Element::new("HWPML")));
        assert_eq!(pkg.format, PackageFormat::Hml);
        assert_eq!(pkg.xml(HML_PART).map(|d| d.root.name.as_str()), Some("HWPML"));
        assert_eq!(pkg.xml_part_names(), vec![HML_PART.to_string()]);
    }
}
