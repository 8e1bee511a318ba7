//! Template binding: byte-order-mark stripping, placeholder substitution and
//! content-anchor location.

use super::target::TargetDocument;
use crate::detect::strip_bom;
use crate::error::{Error, Result};
use crate::model::{Node, Package};
use crate::parser::RawPackage;
use crate::schema::Schema;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use unicode_normalization::UnicodeNormalization;

/// Placeholder syntax: `{{NAME}}`.
const TOKEN_PATTERN: &str = r"\{\{([A-Za-z0-9_]+)\}\}";

pub const DATE: &str = "DATE";
pub const TITLE: &str = "TITLE";
/// Marks where merged body content is inserted.
pub const CONTENT_HERE: &str = "CONTENT_HERE";

/// Recognized placeholder names, their values, and which must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
    required: BTreeSet<String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize a placeholder and set its substitution value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Require a placeholder to be present in the template.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }
}

/// A placeholder found in template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpan {
    pub name: String,
    /// Byte offset of the opening braces.
    pub offset: usize,
}

/// Find every `{{NAME}}` token in raw bytes, in document order.
///
/// Offsets are relative to the slice given; callers strip the byte-order
/// mark first so offsets line up with the decoded text.
pub fn locate_placeholders(text: &[u8]) -> Result<Vec<PlaceholderSpan>> {
    let re = regex::bytes::Regex::new(TOKEN_PATTERN).map_err(|e| Error::Template(e.to_string()))?;
    Ok(re
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(PlaceholderSpan {
                name: String::from_utf8_lossy(name.as_bytes()).into_owned(),
                offset: whole.start(),
            })
        })
        .collect())
}

/// Escape a substitution value for XML text.
///
/// Braces become character references so substituted text can never form
/// a token, which makes substitution idempotent.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.nfc() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace recognized tokens in one left-to-right pass. Unknown tokens are
/// left untouched.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let re = Regex::new(TOKEN_PATTERN).map_err(|e| Error::Template(e.to_string()))?;
    Ok(re
        .replace_all(text, |caps: &regex::Captures<'_>| match values.get(&caps[1]) {
            Some(value) => escape_value(value),
            None => caps[0].to_string(),
        })
        .into_owned())
}

/// Bind raw template text: strip the byte-order mark, check required
/// placeholders, substitute recognized ones.
pub fn bind_text(raw: &[u8], placeholders: &Placeholders) -> Result<String> {
    let stripped = strip_bom(raw);
    let text = std::str::from_utf8(stripped)
        .map_err(|e| Error::Template(format!("template is not UTF-8 at byte {}", e.valid_up_to())))?;

    let found: BTreeSet<String> = locate_placeholders(stripped)?
        .into_iter()
        .map(|span| span.name)
        .collect();
    check_required(&found, placeholders)?;

    let bound = substitute(text, &placeholders.values)?;

    let leftover = locate_placeholders(bound.as_bytes())?
        .into_iter()
        .find(|span| placeholders.values.contains_key(&span.name));
    if let Some(span) = leftover {
        return Err(Error::Template(format!(
            "placeholder {{{{{}}}}} still present at byte {} after substitution",
            span.name, span.offset
        )));
    }
    Ok(bound)
}

fn check_required(found: &BTreeSet<String>, placeholders: &Placeholders) -> Result<()> {
    match placeholders.required().find(|name| !found.contains(*name)) {
        Some(missing) => Err(Error::Template(format!(
            "required placeholder {{{{{}}}}} not found in template",
            missing
        ))),
        None => Ok(()),
    }
}

/// Load a template package, bind its placeholders, and seed a target
/// document positioned at the content anchor.
pub fn bind_template(raw: &[u8], placeholders: &Placeholders, content_token: &str) -> Result<TargetDocument> {
    let mut package = RawPackage::from_bytes(strip_bom(raw)).map_err(template_error)?;
    let schema = Schema::for_format(package.format);
    let body_part = package
        .part_mut(schema.body.part)
        .ok_or_else(|| Error::Template(format!("template has no {} part", schema.body.part)))?;
    let bound = bind_text(body_part, placeholders)?;
    *body_part = bound.into_bytes();

    let package = package.parse().map_err(template_error)?;
    TargetDocument::new(package, content_token)
}

fn template_error(err: Error) -> Error {
    match err {
        Error::Xml { .. } | Error::UnknownFormat | Error::Archive(_) => {
            Error::Template(format!("malformed template: {}", err))
        }
        other => other,
    }
}

/// Locate the content anchor in the body container and return the child
/// position where merged content goes.
///
/// An anchor paragraph that carries no section properties is removed and
/// content takes its place; otherwise the token text is stripped and content
/// goes right after it. A bare token sitting between paragraphs is cut out of
/// its text node and content goes where it stood.
pub fn take_content_anchor(schema: &Schema, package: &mut Package, token: &str) -> Result<usize> {
    let literal = format!("{{{{{}}}}}", token);
    let body = schema.body.resolve_mut(package).ok_or_else(|| {
        Error::Template(format!(
            "template has no <{}> body container",
            schema.body.container_name()
        ))
    })?;

    let position = body
        .children
        .iter()
        .position(|n| match n {
            Node::Element(e) => e.text_content().contains(&literal),
            Node::Text(t) => t.contains(&literal),
            _ => false,
        })
        .ok_or_else(|| Error::Template(format!("content placeholder {} not found", literal)))?;

    // Bare token between paragraphs: split the text around it and drop blank halves.
    if let Node::Text(text) = &body.children[position] {
        let (before, after) = text.split_once(&literal).unwrap_or((text.as_str(), ""));
        let halves: Vec<Node> = [before, after]
            .into_iter()
            .map(|t| Node::Text(t.to_string()))
            .collect();
        body.children.remove(position);
        let mut cursor = position;
        for (i, half) in halves.into_iter().enumerate() {
            if half.is_blank_text() {
                continue;
            }
            body.children.insert(cursor, half);
            if i == 0 {
                cursor += 1;
            }
        }
        return Ok(cursor);
    }

    let removable = body.children[position]
        .as_element()
        .is_some_and(|e| e.is(schema.paragraph) && !e.contains(schema.section.section));
    if removable {
        body.children.remove(position);
        return Ok(position);
    }

    if let Some(anchor) = body.children[position].as_element_mut() {
        strip_token(anchor, &literal);
    }
    Ok(position + 1)
}

fn strip_token(element: &mut crate::model::Element, literal: &str) {
    for node in &mut element.children {
        match node {
            Node::Text(t) if t.contains(literal) => *t = t.replace(literal, ""),
            Node::Element(e) => strip_token(e, literal),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageFormat;
    use crate::parser::read_package;

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("a<b & {{X}}"), "a&lt;b &amp; &#123;&#123;X&#125;&#125;");
    }

    #[test]
    fn test_escape_value_normalizes_to_nfc() {
        // decomposed Hangul jamo compose to a single syllable
        assert_eq!(escape_value("\u{1100}\u{1161}"), "\u{AC00}");
    }

    #[test]
    fn test_substitute_unknown_untouched() {
        let values: BTreeMap<String, String> = [("DATE".to_string(), "2024.03.01".to_string())].into();
        let out = substitute("<C>{{DATE}} {{OTHER}} {DATE}</C>", &values).unwrap();
        assert_eq!(out, "<C>2024.03.01 {{OTHER}} {DATE}</C>");
    }

    #[test]
    fn test_bind_text_missing_required() {
        let ph = Placeholders::new().require(CONTENT_HERE);
        let err = bind_text(b"<A>{{DATE}}</A>", &ph).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_locate_after_bom_strip() {
        let raw = b"\xEF\xBB\xBF<A>1234{{DATE}}";
        let spans = locate_placeholders(strip_bom(raw)).unwrap();
        assert_eq!(spans[0].name, "DATE");
        assert_eq!(spans[0].offset, 7);
    }

    #[test]
    fn test_take_anchor_removes_plain_paragraph() {
        let src = "<HWPML><BODY><SECTION><P><TEXT><SECDEF/></TEXT></P><P><TEXT><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P><P/></SECTION></BODY></HWPML>";
        let mut pkg = read_package(src.as_bytes()).unwrap();
        let schema = Schema::for_format(PackageFormat::Hml);
        let pos = take_content_anchor(schema, &mut pkg, CONTENT_HERE).unwrap();
        assert_eq!(pos, 1);
        let section = schema.body.resolve(&pkg).unwrap();
        assert_eq!(section.children.len(), 2);
    }

    #[test]
    fn test_take_anchor_keeps_section_paragraph() {
        let src = "<HWPML><BODY><SECTION><P><TEXT><SECDEF/><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P></SECTION></BODY></HWPML>";
        let mut pkg = read_package(src.as_bytes()).unwrap();
        let schema = Schema::for_format(PackageFormat::Hml);
        let pos = take_content_anchor(schema, &mut pkg, CONTENT_HERE).unwrap();
        assert_eq!(pos, 1);
        let section = schema.body.resolve(&pkg).unwrap();
        assert_eq!(section.children.len(), 1);
        assert!(!section.text_content().contains("CONTENT_HERE"));
    }

    #[test]
    fn test_take_anchor_missing() {
        let src = "<HWPML><BODY><SECTION><P/></SECTION></BODY></HWPML>";
        let mut pkg = read_package(src.as_bytes()).unwrap();
        let schema = Schema::for_format(PackageFormat::Hml);
        assert!(matches!(
            take_content_anchor(schema, &mut pkg, CONTENT_HERE),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_take_anchor_bare_token_between_paragraphs() {
        let src = "<HWPML><BODY><SECTION><P InstId=\"1\"><TEXT><SECDEF/></TEXT></P>\n{{CONTENT_HERE}}\n<P/></SECTION></BODY></HWPML>";
        let mut pkg = read_package(src.as_bytes()).unwrap();
        let schema = Schema::for_format(PackageFormat::Hml);
        let pos = take_content_anchor(schema, &mut pkg, CONTENT_HERE).unwrap();
        let section = schema.body.resolve(&pkg).unwrap();
        assert!(!section.children.iter().any(|n| matches!(n, Node::Text(t) if t.contains("CONTENT_HERE"))));
        assert_eq!(section.elements().count(), 2);
        assert!(section.children[..pos].iter().any(|n| n.as_element().is_some_and(|e| e.has_attr("InstId"))));
        assert!(section.children[pos..].iter().any(|n| n.as_element().is_some()));
    }
}
