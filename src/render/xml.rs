//! XML serialization of owned trees.
//!
//! Output contains exactly the whitespace present in the tree: no
//! indentation or line breaks are introduced between elements.

use crate::model::{Element, Node, XmlDocument};

/// Render a document, including its declaration and prolog.
pub fn document_to_string(doc: &XmlDocument) -> String {
    let mut out = String::with_capacity(4096);
    if let Some(decl) = &doc.declaration {
        out.push_str("<?");
        out.push_str(decl);
        out.push_str("?>");
    }
    for node in &doc.prolog {
        write_node(node, &mut out);
    }
    write_element(&doc.root, &mut out);
    for node in &doc.epilog {
        write_node(node, &mut out);
    }
    out
}

/// Render a single element subtree.
pub fn element_to_string(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => write_element(e, out),
        Node::Text(t) => out.push_str(t),
        Node::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
        }
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        Node::Instruction(t) => {
            out.push_str("<?");
            out.push_str(t);
            out.push_str("?>");
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}
