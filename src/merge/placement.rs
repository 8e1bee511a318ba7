//! Structural placement of reconciled fragments into the target tree.

use super::target::TargetDocument;
use crate::error::{Error, Result};
use crate::model::{Element, Fragment, Node, Package, Part};
use crate::schema::{AssetLayout, ColumnHost, ContentKind, PartPath, Schema};
use std::collections::{BTreeMap, HashSet};

/// What one fragment contributed to the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placed {
    pub elements: usize,
    pub assets: usize,
    pub styles: usize,
    pub column_adopted: bool,
    pub notes: Vec<String>,
}

/// Verify that every container the fragment needs exists in the target.
///
/// Missing containers are never synthesized; the template must supply them.
pub fn check_containers(schema: &Schema, package: &Package, fragment: &Fragment) -> Result<()> {
    let mut kinds = vec![ContentKind::Body];
    kinds.extend(
        fragment
            .styles
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(category, _)| ContentKind::Style(*category)),
    );
    if !fragment.assets.is_empty() {
        kinds.push(ContentKind::AssetItem);
        kinds.push(ContentKind::AssetPayload);
    }

    for kind in kinds {
        if let Some(container) = schema.container_for(kind) {
            require(package, container, fragment.index)?;
        }
    }

    if fragment.section_defs.column.is_some() {
        let has_section = package
            .xml(schema.body.part)
            .is_some_and(|doc| doc.root.contains(schema.section.section));
        if !has_section {
            return Err(Error::placement(
                Some(fragment.index),
                schema.section.section,
                "template has no section properties to host the column definition",
            ));
        }
    }
    Ok(())
}

fn require(package: &Package, container: PartPath, fragment: usize) -> Result<()> {
    if container.resolve(package).is_some() {
        return Ok(());
    }
    let location = if container.path.len() > 1 {
        format!(" under {}", container.path[..container.path.len() - 1].join("/"))
    } else {
        String::new()
    };
    Err(Error::placement(
        Some(fragment),
        container.container_name(),
        format!(
            "required container missing from template{} in {}",
            location, container.part
        ),
    ))
}

/// Insert a reconciled fragment into the target.
pub fn place(target: &mut TargetDocument, mut fragment: Fragment) -> Result<Placed> {
    let schema = target.schema;
    check_containers(schema, &target.package, &fragment)?;

    let mut placed = Placed::default();
    reset_fonts(schema, &target.package, &mut fragment, &mut placed.notes);
    strip_declared_namespaces(schema, &target.package, &mut fragment);

    placed.styles = place_styles(schema, &mut target.package, &mut fragment)?;
    placed.assets = place_assets(schema, &mut target.package, &fragment)?;
    place_section_defs(schema, &mut target.package, &mut fragment, &mut placed)?;

    let markup = std::mem::take(&mut fragment.markup);
    placed.elements = target.insert_body(markup, fragment.index)?;

    for note in &placed.notes {
        log::warn!("{}", note);
    }
    log::debug!(
        "fragment {}: placed {} elements, {} assets, {} style entries",
        fragment.index,
        placed.elements,
        placed.assets,
        placed.styles
    );
    Ok(placed)
}

/// Character-shape font references that do not resolve in the target's
/// per-language font table are reset to index 0.
fn reset_fonts(schema: &Schema, package: &Package, fragment: &mut Fragment, notes: &mut Vec<String>) {
    let rule = schema.fonts;
    let mut available: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    if let Some(faces) = rule.faces.resolve(package) {
        for face in faces.elements().filter(|e| e.is(rule.face)) {
            let Some(lang) = face.attr(rule.lang_attr) else {
                continue;
            };
            let ids = available.entry(lang).or_default();
            ids.extend(
                face.elements()
                    .filter(|f| f.is(rule.font))
                    .filter_map(|f| f.attr(rule.id_attr).map(str::trim)),
            );
        }
    }

    let index = fragment.index;
    let Some(entries) = fragment.styles.get_mut(&crate::schema::StyleCategory::CharShape) else {
        return;
    };
    let mut reset = 0;
    for entry in entries.values_mut() {
        entry.walk_mut(&mut |e| {
            if !e.is(rule.reference) {
                return;
            }
            for (attr, lang) in rule.languages {
                let Some(value) = e.attr(attr) else {
                    continue;
                };
                let resolves = available
                    .get(lang)
                    .is_some_and(|ids| ids.contains(value.trim()));
                if !resolves && value.trim() != "0" {
                    e.set_attr(*attr, "0");
                    reset += 1;
                }
            }
        });
    }
    if reset > 0 {
        notes.push(format!(
            "fragment {}: {} font references not in the template font table were reset to 0",
            index, reset
        ));
    }
}

/// Drop `xmlns:*` declarations the destination part root already carries.
fn strip_declared_namespaces(schema: &Schema, package: &Package, fragment: &mut Fragment) {
    let declared = |part: &str| -> Vec<(String, String)> {
        package
            .xml(part)
            .map(|doc| {
                doc.root
                    .attributes
                    .iter()
                    .filter(|(name, _)| name.starts_with("xmlns"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    };
    let strip = |element: &mut Element, decls: &[(String, String)]| {
        element.walk_mut(&mut |e| {
            e.attributes.retain(|attr| !decls.contains(attr));
        });
    };

    let body = declared(schema.body.part);
    for element in &mut fragment.markup {
        strip(element, &body);
    }
    let head = declared(schema.head_part);
    for element in fragment.styles.values_mut().flat_map(BTreeMap::values_mut) {
        strip(element, &head);
    }
}

fn place_styles(schema: &Schema, package: &mut Package, fragment: &mut Fragment) -> Result<usize> {
    let mut count = 0;
    for (category, entries) in std::mem::take(&mut fragment.styles) {
        if entries.is_empty() {
            continue;
        }
        let container = schema
            .container_for(ContentKind::Style(category))
            .ok_or_else(|| Error::placement(Some(fragment.index), category.name(), "no style table"))?;
        let list = container.resolve_mut(package).ok_or_else(|| {
            Error::placement(
                Some(fragment.index),
                container.container_name(),
                "style list missing from template",
            )
        })?;
        count += entries.len();
        for entry in entries.into_values() {
            list.push(entry);
        }
    }
    Ok(count)
}

fn place_assets(schema: &Schema, package: &mut Package, fragment: &Fragment) -> Result<usize> {
    let missing = |container: PartPath| {
        Error::placement(
            Some(fragment.index),
            container.container_name(),
            "asset container missing from template",
        )
    };

    match schema.assets {
        AssetLayout::Inline {
            items,
            item_payload_attr,
            payloads,
            payload,
            payload_id_attr,
            ..
        } => {
            for asset in &fragment.assets {
                let list = items.resolve_mut(package).ok_or_else(|| missing(items))?;
                list.push(asset.declaration.clone());

                let storage_id = asset
                    .declaration
                    .attr(item_payload_attr)
                    .unwrap_or(asset.id.as_str())
                    .to_string();
                let mut data = Element::new(payload)
                    .with_attr(payload_id_attr, storage_id)
                    .with_attr("Size", asset.size().to_string())
                    .with_attr("Encoding", "Base64")
                    .with_attr("Compress", if asset.compressed { "true" } else { "false" });
                data.children.push(Node::text(&asset.payload));
                let store = payloads.resolve_mut(package).ok_or_else(|| missing(payloads))?;
                store.push(data);
            }
        }
        AssetLayout::Manifest { manifest, .. } => {
            for asset in &fragment.assets {
                let declaration = fragment
                    .manifest_entries
                    .get(&asset.id)
                    .unwrap_or(&asset.declaration)
                    .clone();
                let list = manifest.resolve_mut(package).ok_or_else(|| missing(manifest))?;
                list.push(declaration);
                package.insert(asset.storage_path.clone(), Part::Binary(asset.decode()?));
            }
        }
    }
    Ok(fragment.assets.len())
}

/// Adopt the fragment's column definition when the template has none;
/// everything else lifted from the fragment gives way to the template's.
fn place_section_defs(
    schema: &Schema,
    package: &mut Package,
    fragment: &mut Fragment,
    placed: &mut Placed,
) -> Result<()> {
    let rule = schema.section;
    let defs = std::mem::take(&mut fragment.section_defs);
    let index = fragment.index;

    if let Some(column) = defs.column {
        let doc = package.xml_mut(schema.body.part).ok_or_else(|| {
            Error::placement(Some(index), schema.body.part, "body part missing from template")
        })?;
        if doc.root.contains(rule.column) {
            placed.notes.push(format!(
                "fragment {}: column definition discarded, template defines its own",
                index
            ));
        } else {
            let no_host = || {
                Error::placement(
                    Some(index),
                    rule.section,
                    "template has no section properties to host the column definition",
                )
            };
            match rule.host {
                ColumnHost::Section => {
                    let section = doc.root.descendant_mut(rule.section).ok_or_else(no_host)?;
                    section.push(column);
                }
                ColumnHost::SiblingControl(wrapper) => {
                    let run = parent_of_mut(&mut doc.root, rule.section).ok_or_else(no_host)?;
                    let at = run
                        .children
                        .iter()
                        .position(|n| matches!(n, Node::Element(e) if e.is(rule.section)))
                        .map_or(run.children.len(), |i| i + 1);
                    run.children
                        .insert(at, Node::Element(Element::new(wrapper).with_child(column)));
                }
            }
            placed.column_adopted = true;
            log::debug!("fragment {}: adopted column definition", index);
        }
    }

    if defs.section.is_some() {
        placed.notes.push(format!(
            "fragment {}: section properties discarded in favor of the template's",
            index
        ));
    }
    if !defs.layout.is_empty() {
        let names: Vec<&str> = defs.layout.iter().map(|e| e.name.as_str()).collect();
        placed.notes.push(format!(
            "fragment {}: layout definitions discarded: {}",
            index,
            names.join(", ")
        ));
    }
    Ok(())
}

/// The element whose direct child is named `name`.
fn parent_of_mut<'a>(element: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    if element.child(name).is_some() {
        return Some(element);
    }
    for child in element.elements_mut() {
        if let Some(found) = parent_of_mut(child, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageFormat;
    use crate::merge::template::CONTENT_HERE;
    use crate::model::Asset;
    use crate::parser::read_package;
    use crate::schema::StyleCategory;

    const TEMPLATE: &str = r#"<HWPML xmlns:x="urn:x"><HEAD><MAPPINGTABLE>
<FACENAMELIST><FONTFACE Lang="Hangul" Count="1"><FONT Id="0" Name="Batang"/></FONTFACE></FACENAMELIST>
<BINDATALIST Count="0"/>
<CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST>
</MAPPINGTABLE></HEAD><BODY><SECTION><P><TEXT><SECDEF><PAGEDEF/></SECDEF><CHAR>Head</CHAR></TEXT></P><P><TEXT><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P></SECTION></BODY>
<TAIL><BINDATASTORAGE/></TAIL></HWPML>"#;

    fn target(src: &str) -> TargetDocument {
        TargetDocument::new(read_package(src.as_bytes()).unwrap(), CONTENT_HERE).unwrap()
    }

    fn fragment() -> Fragment {
        let mut fragment = Fragment::new(0, PackageFormat::Hml);
        fragment
            .markup
            .push(Element::new("P").with_attr("xmlns:x", "urn:x").with_child(Element::new("TEXT")));
        fragment.styles.entry(StyleCategory::CharShape).or_default().insert(
            1,
            Element::new("CHARSHAPE")
                .with_attr("Id", "1")
                .with_child(Element::new("FONTID").with_attr("Hangul", "5").with_attr("Latin", "0")),
        );
        let decl = Element::new("BINITEM").with_attr("BinData", "1").with_attr("Format", "png");
        fragment.assets.push(Asset::from_bytes("1", "BinData/BIN0001.png", b"\x89PNG\r\n\x1a\n", decl));
        fragment
    }

    #[test]
    fn test_place_puts_everything_in_its_container() {
        let mut target = target(TEMPLATE);
        let placed = place(&mut target, fragment()).unwrap();
        assert_eq!((placed.elements, placed.assets, placed.styles), (1, 1, 1));

        let root = &target.package.xml(crate::model::HML_PART).unwrap().root;
        let items = root.find(&["HEAD", "MAPPINGTABLE", "BINDATALIST"]).unwrap();
        assert_eq!(items.elements().count(), 1);
        let store = root.find(&["TAIL", "BINDATASTORAGE"]).unwrap();
        let data = store.child("BINDATA").unwrap();
        assert_eq!(data.attr("Id"), Some("1"));
        assert_eq!(data.attr("Encoding"), Some("Base64"));

        let chars = root.find(&["HEAD", "MAPPINGTABLE", "CHARSHAPELIST"]).unwrap();
        let font = chars.elements().nth(1).and_then(|c| c.child("FONTID")).unwrap();
        assert_eq!(font.attr("Hangul"), Some("0"));
        assert!(placed.notes.iter().any(|n| n.contains("font")));

        let section = root.find(&["BODY", "SECTION"]).unwrap();
        let inserted = section.elements().nth(1).unwrap();
        assert!(!inserted.has_attr("xmlns:x"));
    }

    #[test]
    fn test_missing_asset_list_is_placement_error() {
        let src = TEMPLATE.replace("<BINDATALIST Count=\"0\"/>", "");
        let mut target = target(&src);
        let err = place(&mut target, fragment()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Placement);
        assert!(err.to_string().contains("BINDATALIST"));
    }

    #[test]
    fn test_column_adopted_into_section_properties() {
        let mut target = target(TEMPLATE);
        let mut frag = fragment();
        frag.section_defs.column = Some(Element::new("COLDEF").with_attr("Count", "2"));
        frag.section_defs.layout.push(Element::new("PAGEDEF"));
        let placed = place(&mut target, frag).unwrap();
        assert!(placed.column_adopted);

        let root = &target.package.xml(crate::model::HML_PART).unwrap().root;
        let secdef = root.descendant("SECDEF").unwrap();
        assert!(secdef.child("COLDEF").is_some());
        assert!(placed.notes.iter().any(|n| n.contains("PAGEDEF")));
    }

    #[test]
    fn test_parent_of_section_properties_is_the_run() {
        let mut doc = Element::new("hs:sec").with_child(
            Element::new("hp:p").with_child(Element::new("hp:run").with_child(Element::new("hp:secPr"))),
        );
        let run = parent_of_mut(&mut doc, "hp:secPr").unwrap();
        assert!(run.is("hp:run"));
        assert!(parent_of_mut(&mut doc, "hp:colPr").is_none());
    }
}
