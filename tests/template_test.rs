//! Template binding: byte-order marks, placeholder offsets and substitution.

use hwpmerge::detect::{has_bom, strip_bom, UTF8_BOM};
use hwpmerge::merge::template::{bind_text, locate_placeholders, substitute, Placeholders};
use hwpmerge::model::HML_PART;
use hwpmerge::{merge, read_package, ErrorKind, MergeOptions};
use std::collections::BTreeMap;

/// BOM, then `<A>1234`, then `{{DATE}}` at byte 10 of the raw bytes.
fn bom_template() -> Vec<u8> {
    let mut raw = UTF8_BOM.to_vec();
    raw.extend_from_slice(b"<A>1234{{DATE}}</A>");
    raw
}

#[test]
fn test_date_offset_with_and_without_stripping() {
    let raw = bom_template();
    let unstripped = locate_placeholders(&raw).unwrap();
    assert_eq!(unstripped[0].offset, 10);

    let stripped = strip_bom(&raw);
    let spans = locate_placeholders(stripped).unwrap();
    assert_eq!(spans[0].name, "DATE");
    assert_eq!(spans[0].offset, 7);
    assert!(stripped[7..].starts_with(b"{{DATE}}"));

    // an offset taken from the raw bytes points past the token in the decoded text
    assert!(!stripped[unstripped[0].offset..].starts_with(b"{{DATE}}"));
}

#[test]
fn test_bind_text_strips_bom_before_substitution() {
    let placeholders = Placeholders::new().with("DATE", "2024.03.01");
    let bound = bind_text(&bom_template(), &placeholders).unwrap();
    assert_eq!(bound, "<A>12342024.03.01</A>");
    assert!(!has_bom(bound.as_bytes()));
}

#[test]
fn test_strip_bom_is_idempotent() {
    let raw = bom_template();
    assert_eq!(strip_bom(strip_bom(&raw)), strip_bom(&raw));

    let plain = b"<A>{{DATE}}</A>";
    assert_eq!(strip_bom(plain), plain);
}

#[test]
fn test_substitution_is_idempotent() {
    let values: BTreeMap<String, String> = [
        ("TITLE".to_string(), "Quiz {{DATE}}".to_string()),
        ("DATE".to_string(), "2024.03.01".to_string()),
    ]
    .into();
    let once = substitute("<T>{{TITLE}}</T><D>{{DATE}}</D>", &values).unwrap();
    let twice = substitute(&once, &values).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, "<T>Quiz &#123;&#123;DATE&#125;&#125;</T><D>2024.03.01</D>");
}

#[test]
fn test_lookalike_tokens_are_left_alone() {
    let values: BTreeMap<String, String> = [("DATE".to_string(), "today".to_string())].into();
    let text = "{DATE} {{ DATE }} {{date}} {{DATE}";
    assert_eq!(substitute(text, &values).unwrap(), text);
}

#[test]
fn test_missing_required_placeholder() {
    let placeholders = Placeholders::new().require("SCHOOL");
    let err = bind_text(b"<A>{{DATE}}</A>", &placeholders).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Template);
}

#[test]
fn test_merge_with_bom_template() {
    let mut template = UTF8_BOM.to_vec();
    template.extend_from_slice(
        br#"<HWPML><HEAD><MAPPINGTABLE/></HEAD><BODY><SECTION><P InstId="1"><TEXT><SECDEF/><CHAR>{{DATE}}</CHAR></TEXT></P><P><TEXT><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P></SECTION></BODY></HWPML>"#,
    );
    let source = r#"<HWPML><BODY><SECTION><P><TEXT><CHAR>Q</CHAR></TEXT></P></SECTION></BODY></HWPML>"#;

    let options = MergeOptions::new().with_date("2024-03-01");
    let output = merge(&template, &[source], &options).unwrap();
    assert!(!has_bom(&output.bytes));

    let text = String::from_utf8(output.bytes.clone()).unwrap();
    assert!(text.contains("<CHAR>2024-03-01</CHAR>"));
    assert!(!text.contains("{{"));
    read_package(&output.bytes).unwrap();
}

#[test]
fn test_merge_without_content_anchor() {
    let template = r#"<HWPML><BODY><SECTION><P><TEXT><CHAR>{{TITLE}}</CHAR></TEXT></P></SECTION></BODY></HWPML>"#;
    let source = r#"<HWPML><BODY><SECTION><P/></SECTION></BODY></HWPML>"#;
    let err = merge(template.as_bytes(), &[source], &MergeOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Template);
}

#[test]
fn test_merge_with_anchor_between_paragraphs() {
    let template = r#"<HWPML><HEAD><MAPPINGTABLE/></HEAD><BODY><SECTION><P InstId="1"><TEXT><SECDEF/><CHAR>{{TITLE}}</CHAR></TEXT></P>{{CONTENT_HERE}}</SECTION></BODY></HWPML>"#;
    let source = r#"<HWPML><BODY><SECTION><P InstId="5"><TEXT><CHAR>Q1</CHAR></TEXT></P></SECTION></BODY></HWPML>"#;

    let output = merge(template.as_bytes(), &[source], &MergeOptions::new().with_title("Quiz")).unwrap();
    let text = String::from_utf8(output.bytes.clone()).unwrap();
    assert!(!text.contains("CONTENT_HERE"));

    let package = read_package(&output.bytes).unwrap();
    let section = package
        .xml(HML_PART)
        .and_then(|doc| doc.root.find(&["BODY", "SECTION"]))
        .unwrap();
    let paragraphs: Vec<String> = section.elements().map(|p| p.text_content()).collect();
    assert_eq!(paragraphs, vec!["Quiz", "Q1"]);
    assert_eq!(section.elements().nth(1).and_then(|p| p.attr("InstId")), Some("2"));
}
