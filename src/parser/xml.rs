//! XML event reader producing owned trees.

use crate::error::{Error, Result};
use crate::model::{Element, Node, XmlDocument};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse a complete XML document.
///
/// Text is kept in escaped form and whitespace between elements is kept as
/// text nodes, so the document re-serializes in its original style. No
/// particular attribute order or formatting is assumed.
pub fn parse_document(text: &str, part: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut declaration = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| xml_error(part, reader.error_position() as u64, e))?;
        let end = reader.buffer_position() as usize;
        let raw = text.get(start..end).unwrap_or("");

        let node = match event {
            Event::Eof => break,
            Event::Decl(_) => {
                let inner = raw.trim_start_matches("<?").trim_end_matches("?>");
                declaration = Some(inner.to_string());
                continue;
            }
            Event::Start(e) => {
                stack.push(element_from(&e, part, start)?);
                continue;
            }
            Event::End(_) => match stack.pop() {
                Some(el) => Node::Element(el),
                None => return Err(xml_error(part, start as u64, "unexpected closing tag")),
            },
            Event::Empty(e) => Node::Element(element_from(&e, part, start)?),
            Event::Text(t) => Node::Text(String::from_utf8_lossy(&t.into_inner()).into_owned()),
            Event::CData(c) => Node::CData(String::from_utf8_lossy(&c.into_inner()).into_owned()),
            Event::Comment(c) => {
                Node::Comment(String::from_utf8_lossy(&c.into_inner()).into_owned())
            }
            Event::PI(_) => {
                let inner = raw.trim_start_matches("<?").trim_end_matches("?>");
                Node::Instruction(inner.to_string())
            }
            // Doctype is only legal in the prolog; keep it verbatim as raw text.
            Event::DocType(_) => Node::Text(raw.to_string()),
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => match node {
                Node::Element(el) => {
                    if root.is_some() {
                        return Err(xml_error(part, start as u64, "multiple root elements"));
                    }
                    root = Some(el);
                }
                other if root.is_some() => epilog.push(other),
                other => prolog.push(other),
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(
            part,
            text.len() as u64,
            format!("unclosed element <{}>", open.name),
        ));
    }

    let root = root.ok_or_else(|| xml_error(part, 0, "no root element"))?;
    Ok(XmlDocument {
        declaration,
        prolog,
        root,
        epilog,
    })
}

/// Parse a standalone fragment of markup holding exactly one element.
pub fn parse_element(text: &str) -> Result<Element> {
    parse_document(text, "fragment").map(|doc| doc.root)
}

fn element_from(start: &BytesStart<'_>, part: &str, position: usize) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(part, position as u64, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(part, position as u64, e))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn xml_error(part: &str, position: u64, message: impl std::fmt::Display) -> Error {
    Error::Xml {
        part: part.to_string(),
        position,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_structure_and_whitespace() {
        let src = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n<HWPML Version=\"2.8\"><BODY>\r\n<SECTION Id=\"0\"><P><TEXT><CHAR>a &amp; b</CHAR></TEXT></P></SECTION></BODY></HWPML>";
        let doc = parse_document(src, "doc").unwrap();
        assert_eq!(
            doc.declaration.as_deref(),
            Some("xml version=\"1.0\" encoding=\"UTF-8\"")
        );
        assert_eq!(doc.prolog, vec![Node::Text("\r\n".into())]);
        assert_eq!(doc.root.name, "HWPML");
        assert_eq!(doc.root.attr("Version"), Some("2.8"));

        let body = doc.root.child("BODY").unwrap();
        assert_eq!(body.children.len(), 2);
        assert!(body.children[0].is_blank_text());

        let ch = doc.root.find(&["BODY", "SECTION", "P", "TEXT", "CHAR"]).unwrap();
        assert_eq!(ch.children, vec![Node::Text("a &amp; b".into())]);
        assert_eq!(ch.text_content(), "a & b");
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let el = parse_element("<opf:item id=\"a&amp;b\" href='BinData/x.png'/>").unwrap();
        assert_eq!(el.attr("id"), Some("a&b"));
        assert_eq!(el.attr("href"), Some("BinData/x.png"));
    }

    #[test]
    fn test_cdata_comment_and_pi() {
        let el = parse_element("<A><!-- note --><?hwp keep?><![CDATA[x<y]]></A>").unwrap();
        assert_eq!(
            el.children,
            vec![
                Node::Comment(" note ".into()),
                Node::Instruction("hwp keep".into()),
                Node::CData("x<y".into()),
            ]
        );
    }

    #[test]
    fn test_malformed_markup() {
        assert!(matches!(
            parse_document("<A><B></A>", "section0.xml"),
            Err(Error::Xml { .. })
        ));
        assert!(matches!(
            parse_document("<A><B>", "section0.xml"),
            Err(Error::Xml { .. })
        ));
        assert!(matches!(parse_document("", "x"), Err(Error::Xml { .. })));
    }
}
