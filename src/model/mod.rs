//! In-memory representation of packages and the fragments merged into them.
//!
//! Packages are kept as owned XML trees plus raw binary parts, so every
//! merge stage works on structure rather than text offsets.

mod fragment;
mod node;
mod package;
mod resource;

pub use fragment::{Fragment, SectionDefs};
pub use node::{Element, Node};
pub use package::{Package, Part, XmlDocument, HML_PART};
pub use resource::{
    bin_storage_path, detect_mime_type, extension_for_mime, extension_of, mime_for_extension,
    Asset,
};
