//! Package reading and fragment extraction.

mod extractor;
mod options;
mod reader;
mod xml;

pub use extractor::{extract_fragment, list_questions, FragmentExtractor, QuestionPreview};
pub use options::{ExtractOptions, Selector};
pub use reader::{is_xml_part, read_package, read_package_file, RawPackage};
pub use xml::{parse_document, parse_element};
