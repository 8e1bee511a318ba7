//! End-to-end merge tests on flat HML packages.

use hwpmerge::model::{Element, HML_PART};
use hwpmerge::{
    audit, merge, merge_files, read_package, ErrorKind, HwpMerge, MergeOptions, Package, Selector,
    StylePolicy,
};

const EMPTY_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HWPML Version="2.8"><HEAD><MAPPINGTABLE><BINDATALIST Count="0"/><CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0"><P ParaShape="0"><TEXT CharShape="0"><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P></SECTION></BODY><TAIL><BINDATASTORAGE Count="0"/></TAIL></HWPML>"#;

const TITLED_TEMPLATE: &str = r#"<HWPML Version="2.8"><HEAD><MAPPINGTABLE><BINDATALIST Count="0"/><CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0"><P InstId="1" ParaShape="0"><TEXT CharShape="0"><SECDEF/><CHAR>{{TITLE}} / {{DATE}}</CHAR></TEXT></P><P ParaShape="0"><TEXT CharShape="0"><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P><P InstId="2" ParaShape="0"><TEXT CharShape="0"><CHAR>End</CHAR></TEXT></P></SECTION></BODY><TAIL><BINDATASTORAGE/></TAIL></HWPML>"#;

/// A single paragraph holding one picture that references local asset 1.
fn image_source(label: &str) -> String {
    format!(
        r#"<HWPML Version="2.8"><HEAD><MAPPINGTABLE><BINDATALIST Count="1"><BINITEM BinData="1" Format="png" Type="Embedding"/></BINDATALIST><CHARSHAPELIST Count="1"><CHARSHAPE Id="0" Height="1000"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0"><P InstId="5" ParaShape="0"><TEXT CharShape="0"><CHAR>{}</CHAR><PICTURE><IMAGE BinItem="1"/></PICTURE></TEXT></P></SECTION></BODY><TAIL><BINDATASTORAGE Count="1"><BINDATA Id="1" Encoding="Base64" Compress="false">iVBORw0KGgo=</BINDATA></BINDATASTORAGE></TAIL></HWPML>"#,
        label
    )
}

const TWO_QUESTIONS: &str = r#"<HWPML Version="2.8"><HEAD><MAPPINGTABLE><CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0">
<P ParaShape="0"><TEXT CharShape="0"><ENDNOTE><AUTONUM Number="1"/></ENDNOTE><CHAR>1. Which is prime?</CHAR></TEXT></P>
<P ParaShape="0"><TEXT CharShape="0"><CHAR>(A) 4 (B) 7</CHAR></TEXT></P>
<P ParaShape="0"><TEXT CharShape="0"><ENDNOTE><AUTONUM Number="2"/></ENDNOTE><CHAR>2. Which is even?</CHAR></TEXT></P>
</SECTION></BODY></HWPML>"#;

fn section(package: &Package) -> &Element {
    package
        .xml(HML_PART)
        .and_then(|doc| doc.root.find(&["BODY", "SECTION"]))
        .unwrap()
}

fn mapping<'a>(package: &'a Package, list: &str) -> &'a Element {
    package
        .xml(HML_PART)
        .and_then(|doc| doc.root.find(&["HEAD", "MAPPINGTABLE", list]))
        .unwrap()
}

fn collect<'a>(root: &'a Element, name: &str) -> Vec<&'a Element> {
    let mut out = Vec::new();
    root.walk(&mut |e| {
        if e.is(name) {
            out.push(e);
        }
    });
    out
}

#[test]
fn test_two_fragments_with_same_local_asset_id() {
    let sources = [image_source("Q1"), image_source("Q2")];
    let output = merge(EMPTY_TEMPLATE.as_bytes(), &sources, &MergeOptions::default()).unwrap();
    let package = read_package(&output.bytes).unwrap();

    let paragraphs: Vec<&Element> = section(&package).elements().filter(|e| e.is("P")).collect();
    assert_eq!(paragraphs.len(), 2);
    assert_ne!(paragraphs[0].attr("InstId"), paragraphs[1].attr("InstId"));

    let refs: Vec<&str> = collect(section(&package), "IMAGE")
        .into_iter()
        .filter_map(|e| e.attr("BinItem"))
        .collect();
    assert_eq!(refs, vec!["1", "2"]);

    let items = mapping(&package, "BINDATALIST");
    assert_eq!(items.attr("Count"), Some("2"));
    let storage: Vec<&str> = items.elements().filter_map(|e| e.attr("BinData")).collect();
    assert_eq!(storage.len(), 2);
    assert_ne!(storage[0], storage[1]);

    let store = package
        .xml(HML_PART)
        .and_then(|doc| doc.root.find(&["TAIL", "BINDATASTORAGE"]))
        .unwrap();
    assert_eq!(store.attr("Count"), Some("2"));
    assert_eq!(store.elements().count(), 2);

    assert!(audit(&package).is_empty());
    assert!(output.report.is_clean());
    assert_eq!(output.report.stats.asset_count, 2);
    assert_eq!(output.report.fragments[1].asset_map.get("1").map(String::as_str), Some("2"));
}

#[test]
fn test_template_placeholders_and_cursor() {
    let options = MergeOptions::new().with_title("Unit 3 Review").with_date("2024.05.01");
    let sources = [image_source("First"), image_source("Second")];
    let output = merge(TITLED_TEMPLATE.as_bytes(), &sources, &options).unwrap();
    let package = read_package(&output.bytes).unwrap();
    let body = section(&package);

    let texts: Vec<String> = body.elements().map(|e| e.text_content()).collect();
    assert_eq!(texts, vec!["Unit 3 Review / 2024.05.01", "First", "Second", "End"]);

    // fresh ids continue past the template's highest id
    let ids: Vec<&str> = body.elements().filter_map(|e| e.attr("InstId")).collect();
    assert_eq!(ids, vec!["1", "3", "4", "2"]);
}

#[test]
fn test_imported_styles_are_renumbered() {
    let sources = [image_source("A"), image_source("B")];
    let output = merge(EMPTY_TEMPLATE.as_bytes(), &sources, &MergeOptions::default()).unwrap();
    let package = read_package(&output.bytes).unwrap();

    let shapes = mapping(&package, "CHARSHAPELIST");
    assert_eq!(shapes.attr("Count"), Some("3"));
    let ids: Vec<&str> = shapes.elements().filter_map(|e| e.attr("Id")).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);

    let runs: Vec<&str> = collect(section(&package), "TEXT")
        .into_iter()
        .filter_map(|e| e.attr("CharShape"))
        .collect();
    assert_eq!(runs, vec!["1", "2"]);
}

#[test]
fn test_template_style_policy_keeps_template_tables() {
    let options = MergeOptions::new().with_style_policy(StylePolicy::TemplateDefaults);
    let sources = [image_source("A")];
    let output = merge(EMPTY_TEMPLATE.as_bytes(), &sources, &options).unwrap();
    let package = read_package(&output.bytes).unwrap();

    assert_eq!(mapping(&package, "CHARSHAPELIST").attr("Count"), Some("1"));
    let runs: Vec<&str> = collect(section(&package), "TEXT")
        .into_iter()
        .filter_map(|e| e.attr("CharShape"))
        .collect();
    assert_eq!(runs, vec!["0"]);
}

#[test]
fn test_missing_asset_list_fails_without_output() {
    let template = EMPTY_TEMPLATE.replace(r#"<BINDATALIST Count="0"/>"#, "");
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.hml");
    let source_path = dir.path().join("q1.hml");
    let output_path = dir.path().join("out.hml");
    std::fs::write(&template_path, template).unwrap();
    std::fs::write(&source_path, image_source("Q")).unwrap();

    let err = merge_files(&template_path, &[&source_path], &output_path, &MergeOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Placement);
    assert_eq!(err.fragment(), Some(0));
    assert!(err.to_string().contains("BINDATALIST"));
    assert!(!output_path.exists());
}

#[test]
fn test_select_second_question() {
    let output = HwpMerge::new()
        .with_selector(Selector::Question(2))
        .merge_bytes(EMPTY_TEMPLATE.as_bytes(), &[TWO_QUESTIONS])
        .unwrap();
    let package = read_package(&output.bytes).unwrap();
    let text = section(&package).text_content();
    assert!(text.contains("Which is even?"));
    assert!(!text.contains("Which is prime?"));
    assert_eq!(output.report.stats.element_count, 1);
}

#[test]
fn test_missing_question_is_extraction_error() {
    let err = HwpMerge::new()
        .with_selector(Selector::Question(5))
        .merge_bytes(EMPTY_TEMPLATE.as_bytes(), &[TWO_QUESTIONS])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[test]
fn test_dangling_picture_reference_is_reconciliation_error() {
    let broken = image_source("Q").replace(r#"<IMAGE BinItem="1"/>"#, r#"<IMAGE BinItem="9"/>"#);
    let sources = [image_source("ok"), broken];
    let err = merge(EMPTY_TEMPLATE.as_bytes(), &sources, &MergeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reconciliation);
    assert_eq!(err.fragment(), Some(1));
}

#[test]
fn test_fragment_order_follows_source_order() {
    let labels = ["one", "two", "three", "four"];
    let sources: Vec<String> = labels.iter().map(|l| image_source(l)).collect();
    let output = merge(EMPTY_TEMPLATE.as_bytes(), &sources, &MergeOptions::default()).unwrap();
    let package = read_package(&output.bytes).unwrap();

    let texts: Vec<String> = section(&package).elements().map(|e| e.text_content()).collect();
    assert_eq!(texts, labels);

    let mut ids: Vec<&str> = collect(section(&package), "P")
        .into_iter()
        .filter_map(|e| e.attr("InstId"))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
