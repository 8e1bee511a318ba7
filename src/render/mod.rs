//! Output rendering: package serialization and JSON reports.

mod json;
mod package;
mod xml;

pub use json::{to_json, JsonFormat};
pub use package::{write_package, write_package_file};
pub use xml::{document_to_string, element_to_string};
