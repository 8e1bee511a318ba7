//! Structural audit of a package against its format's schema tables.
//!
//! The audit never modifies the package. It reports what a strict host
//! reader would trip over: duplicate paragraph ids, stale declared counts,
//! elements outside their required container, column definitions placed in
//! ordinary paragraph content, and references that resolve to nothing.

use crate::model::{Element, Package};
use crate::schema::{AssetLayout, ColumnHost, RefTarget, Schema, StyleCategory};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Category of a structural problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateParagraphId,
    CountMismatch,
    MisplacedElement,
    ColumnOutsideSection,
    DanglingAsset,
    DanglingStyle,
}

/// One structural problem found in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub part: String,
    pub element: String,
    pub detail: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: <{}> {}", self.part, self.element, self.detail)
    }
}

/// Audit a package.
pub fn audit(package: &Package) -> Vec<Finding> {
    let schema = Schema::for_format(package.format);
    let mut findings = Vec::new();
    duplicate_paragraph_ids(package, schema, &mut findings);
    count_mismatches(package, schema, &mut findings);
    misplaced_elements(package, schema, &mut findings);
    misplaced_columns(package, schema, &mut findings);
    dangling_assets(package, schema, &mut findings);
    dangling_styles(package, schema, &mut findings);
    findings
}

/// Visit every element with its ancestor chain (root first).
fn walk_with_ancestors<'a>(
    element: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    f: &mut impl FnMut(&'a Element, &[&'a Element]),
) {
    f(element, ancestors);
    ancestors.push(element);
    for child in element.elements() {
        walk_with_ancestors(child, ancestors, f);
    }
    ancestors.pop();
}

fn duplicate_paragraph_ids(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    // Ids are document-wide: count across every section part.
    let parts = schema.section_part_names(package);
    let mut seen: HashMap<&str, (usize, &str)> = HashMap::new();
    for part in &parts {
        let name = part.as_str();
        let Some(doc) = package.xml(name) else {
            continue;
        };
        doc.root.walk(&mut |e| {
            if e.is(schema.paragraph) {
                if let Some(id) = e.attr(schema.paragraph_id) {
                    let entry = seen.entry(id).or_insert((0, name));
                    entry.0 += 1;
                    if entry.0 > 1 {
                        entry.1 = name;
                    }
                }
            }
        });
    }
    let duplicates: BTreeMap<&str, (usize, &str)> =
        seen.into_iter().filter(|(_, (n, _))| *n > 1).collect();
    for (id, (n, part)) in duplicates {
        out.push(Finding {
            kind: FindingKind::DuplicateParagraphId,
            part: part.to_string(),
            element: schema.paragraph.to_string(),
            detail: format!("paragraph id {} used {} times", id, n),
        });
    }
}

fn count_mismatches(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    for part in package.xml_part_names() {
        let Some(doc) = package.xml(&part) else {
            continue;
        };
        doc.root.walk(&mut |e| {
            let Some(rule) = schema.count_rule(&e.name) else {
                return;
            };
            let actual = e.elements().filter(|c| c.is(rule.child)).count();
            for attr in rule.attrs {
                match e.attr(attr.name) {
                    Some(value) if value.trim() == actual.to_string() => {}
                    None if !attr.required => {}
                    declared => out.push(Finding {
                        kind: FindingKind::CountMismatch,
                        part: part.clone(),
                        element: e.name.clone(),
                        detail: format!(
                            "{} declares {} but holds {} <{}>",
                            attr.name,
                            declared.unwrap_or("nothing"),
                            actual,
                            rule.child
                        ),
                    }),
                }
            }
        });
    }
}

fn misplaced_elements(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    for rule in schema.ancestor_rules() {
        let Some(doc) = package.xml(rule.container.part) else {
            continue;
        };
        walk_with_ancestors(&doc.root, &mut Vec::new(), &mut |e, ancestors| {
            if !e.is(rule.element) || ancestors.is_empty() {
                return;
            }
            let path: Vec<&str> = ancestors[1..].iter().map(|a| a.name.as_str()).collect();
            if path != rule.container.path {
                out.push(Finding {
                    kind: FindingKind::MisplacedElement,
                    part: rule.container.part.to_string(),
                    element: e.name.clone(),
                    detail: format!(
                        "found under '{}', required under '{}'",
                        path.join("/"),
                        rule.container.path.join("/")
                    ),
                });
            }
        });
    }
}

fn misplaced_columns(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    for part in schema.section_part_names(package) {
        if let Some(doc) = package.xml(&part) {
            misplaced_columns_in(&part, &doc.root, schema, out);
        }
    }
}

fn misplaced_columns_in(part: &str, root: &Element, schema: &Schema, out: &mut Vec<Finding>) {
    let rule = schema.section;
    walk_with_ancestors(root, &mut Vec::new(), &mut |e, ancestors| {
        if !e.is(rule.column) {
            return;
        }
        let parent = ancestors.last();
        let hosted = match rule.host {
            ColumnHost::Section => parent.is_some_and(|p| p.is(rule.section)),
            ColumnHost::SiblingControl(wrapper) => {
                let grandparent = ancestors.len().checked_sub(2).map(|i| ancestors[i]);
                parent.is_some_and(|p| p.is(wrapper))
                    && grandparent.is_some_and(|g| g.child(rule.section).is_some())
            }
        };
        if !hosted {
            out.push(Finding {
                kind: FindingKind::ColumnOutsideSection,
                part: part.to_string(),
                element: e.name.clone(),
                detail: format!(
                    "column definition inside <{}> instead of section properties",
                    parent.map_or("", |p| p.name.as_str())
                ),
            });
        }
    });
}

fn dangling_assets(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    // Reference values that reach a stored payload.
    let valid: BTreeSet<String> = match schema.assets {
        AssetLayout::Inline {
            items,
            item,
            item_payload_attr,
            payloads,
            payload,
            payload_id_attr,
            ..
        } => {
            let stored: BTreeSet<&str> = payloads
                .resolve(package)
                .map(|s| {
                    s.elements()
                        .filter(|e| e.is(payload))
                        .filter_map(|e| e.attr(payload_id_attr).map(str::trim))
                        .collect()
                })
                .unwrap_or_default();
            items
                .resolve(package)
                .map(|list| {
                    list.elements()
                        .filter(|e| e.is(item))
                        .enumerate()
                        .filter(|(_, e)| {
                            e.attr(item_payload_attr)
                                .is_some_and(|id| stored.contains(id.trim()))
                        })
                        .map(|(i, _)| (i + 1).to_string())
                        .collect()
                })
                .unwrap_or_default()
        }
        AssetLayout::Manifest { manifest, item, .. } => manifest
            .resolve(package)
            .map(|m| {
                m.elements()
                    .filter(|e| e.is(item))
                    .filter(|e| e.attr("href").is_some_and(|href| package.has_part(href)))
                    .filter_map(|e| e.attr("id").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    };

    for part in schema.section_part_names(package) {
        let Some(doc) = package.xml(&part) else {
            continue;
        };
        doc.root.walk(&mut |e| {
            for rule in schema.refs_for(&e.name) {
                if rule.target != RefTarget::Asset {
                    continue;
                }
                if let Some(value) = e.attr(rule.attr) {
                    if !valid.contains(value.trim()) {
                        out.push(Finding {
                            kind: FindingKind::DanglingAsset,
                            part: part.clone(),
                            element: e.name.clone(),
                            detail: format!("{}=\"{}\" resolves to no stored asset", rule.attr, value),
                        });
                    }
                }
            }
        });
    }
}

fn dangling_styles(package: &Package, schema: &Schema, out: &mut Vec<Finding>) {
    let mut declared: BTreeMap<StyleCategory, BTreeSet<u32>> = BTreeMap::new();
    for table in schema.styles {
        let ids = declared.entry(table.category).or_default();
        if let Some(list) = table.container.resolve(package) {
            ids.extend(
                list.elements()
                    .filter(|e| e.is(table.item))
                    .filter_map(|e| e.attr(table.id_attr)?.trim().parse::<u32>().ok()),
            );
        }
    }

    let mut check = |part: &str, root: &Element| {
        root.walk(&mut |e| {
            let mut refs: Vec<(&str, StyleCategory, &str)> = schema
                .refs_for(&e.name)
                .into_iter()
                .filter_map(|rule| match rule.target {
                    RefTarget::Style(category) => Some((rule.attr, category, e.attr(rule.attr)?)),
                    RefTarget::Asset => None,
                })
                .collect();
            if e.is(schema.heading.element) {
                if let (Some(category), Some(value)) =
                    (schema.heading.category(e), e.attr(schema.heading.id_attr))
                {
                    refs.push((schema.heading.id_attr, category, value));
                }
            }
            for (attr, category, value) in refs {
                let Some(id) = category.parse_ref(value) else {
                    continue;
                };
                if !declared.get(&category).is_some_and(|ids| ids.contains(&id)) {
                    out.push(Finding {
                        kind: FindingKind::DanglingStyle,
                        part: part.to_string(),
                        element: e.name.clone(),
                        detail: format!("{}=\"{}\" has no {} entry", attr, value, category),
                    });
                }
            }
        });
    };

    for part in schema.section_part_names(package) {
        if let Some(doc) = package.xml(&part) {
            check(&part, &doc.root);
        }
    }
    if schema.head_part != schema.body.part {
        if let Some(doc) = package.xml(schema.head_part) {
            check(schema.head_part, &doc.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::read_package;

    fn kinds(findings: &[Finding]) -> Vec<FindingKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_clean_package_has_no_findings() {
        let src = r#"<HWPML><HEAD><MAPPINGTABLE>
<BINDATALIST Count="1"><BINITEM BinData="3" Format="png"/></BINDATALIST>
<CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST>
</MAPPINGTABLE></HEAD><BODY><SECTION>
<P InstId="1"><TEXT CharShape="0"><SECDEF><COLDEF Count="2"/></SECDEF></TEXT></P>
<P InstId="2"><TEXT CharShape="0"><PICTURE><IMAGE BinItem="1"/></PICTURE></TEXT></P>
</SECTION></BODY><TAIL><BINDATASTORAGE><BINDATA Id="3">AA==</BINDATA></BINDATASTORAGE></TAIL></HWPML>"#;
        let pkg = read_package(src.as_bytes()).unwrap();
        assert_eq!(audit(&pkg), vec![]);
    }

    #[test]
    fn test_broken_package_findings() {
        let src = r#"<HWPML><HEAD><MAPPINGTABLE>
<BINDATALIST Count="3"><BINITEM BinData="3" Format="png"/></BINDATALIST>
<CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST>
</MAPPINGTABLE></HEAD><BODY><SECTION>
<P InstId="1"><TEXT CharShape="9"><COLDEF Count="2"/></TEXT></P>
<P InstId="1"><TEXT CharShape="4294967295"><PICTURE><IMAGE BinItem="2"/></PICTURE></TEXT></P>
<BINDATASTORAGE/>
</SECTION></BODY></HWPML>"#;
        let pkg = read_package(src.as_bytes()).unwrap();
        let found = kinds(&audit(&pkg));
        assert_eq!(
            found,
            vec![
                FindingKind::DuplicateParagraphId,
                FindingKind::CountMismatch,
                FindingKind::MisplacedElement,
                FindingKind::ColumnOutsideSection,
                FindingKind::DanglingAsset,
                FindingKind::DanglingStyle,
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_across_section_parts() {
        use crate::detect::PackageFormat;
        use crate::model::{Part, XmlDocument};

        let section = |id: &str| {
            Part::Xml(XmlDocument::new(
                Element::new("hs:sec").with_child(Element::new("hp:p").with_attr("id", id)),
            ))
        };
        let mut pkg = Package::new(PackageFormat::Hwpx);
        pkg.insert("Contents/section0.xml", section("2"));
        pkg.insert("Contents/section1.xml", section("2"));
        let findings = audit(&pkg);
        assert_eq!(kinds(&findings), vec![FindingKind::DuplicateParagraphId]);
        assert_eq!(findings[0].part, "Contents/section1.xml");
        assert_eq!(findings[0].detail, "paragraph id 2 used 2 times");
    }
}
