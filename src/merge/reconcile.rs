//! Identifier reconciliation: validates fragment references, then moves
//! paragraph ids, asset ids and style indices into target-global ranges.

use super::allocator::Allocators;
use super::options::StylePolicy;
use crate::error::{Error, Result};
use crate::model::{bin_storage_path, Element, Fragment};
use crate::schema::{AssetLayout, RefTarget, Schema, StyleCategory};
use serde::Serialize;
use std::collections::BTreeMap;

/// Local-to-global identifier mappings produced for one fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Renames {
    /// Asset id mapping (local -> global).
    pub assets: BTreeMap<String, String>,
    /// Style index mapping per category.
    pub styles: BTreeMap<StyleCategory, BTreeMap<u32, u32>>,
    /// Number of paragraph ids reassigned.
    pub paragraphs: usize,
}

/// Check that every reference in the fragment resolves within the fragment.
///
/// Runs before any target mutation so a dangling reference never leaves a
/// half-merged target behind.
pub fn validate(fragment: &Fragment, schema: &Schema) -> Result<()> {
    let roots = fragment
        .markup
        .iter()
        .chain(fragment.styles.values().flat_map(BTreeMap::values));
    for root in roots {
        if let Some(dangling) = first_dangling(root, fragment, schema) {
            return Err(dangling);
        }
    }
    Ok(())
}

fn first_dangling(root: &Element, fragment: &Fragment, schema: &Schema) -> Option<Error> {
    let mut found = None;
    let dangling = |namespace: &str, id: &str, element: &str| Error::Reconciliation {
        fragment: fragment.index,
        namespace: namespace.to_string(),
        id: id.to_string(),
        element: element.to_string(),
    };
    let has_style = |category: StyleCategory, id: u32| {
        fragment
            .styles
            .get(&category)
            .is_some_and(|entries| entries.contains_key(&id))
    };

    root.walk(&mut |e| {
        if found.is_some() {
            return;
        }
        for rule in schema.refs_for(&e.name) {
            let Some(value) = e.attr(rule.attr) else {
                continue;
            };
            match rule.target {
                RefTarget::Asset => {
                    if fragment.asset(value).is_none() {
                        found = Some(dangling("asset", value, &e.name));
                        return;
                    }
                }
                RefTarget::Style(category) => {
                    if let Some(id) = category.parse_ref(value) {
                        if !has_style(category, id) {
                            found = Some(dangling(category.name(), value, &e.name));
                            return;
                        }
                    }
                }
            }
        }
        if e.is(schema.heading.element) {
            if let (Some(category), Some(value)) =
                (schema.heading.category(e), e.attr(schema.heading.id_attr))
            {
                if let Some(id) = category.parse_ref(value) {
                    if !has_style(category, id) {
                        found = Some(dangling(category.name(), value, &e.name));
                    }
                }
            }
        }
    });
    found
}

/// Rewrite a validated fragment into the target's identifier ranges.
pub fn reconcile(
    fragment: &mut Fragment,
    allocators: &mut Allocators,
    schema: &Schema,
    policy: StylePolicy,
) -> Result<Renames> {
    let mut renames = Renames {
        assets: rename_assets(fragment, allocators, schema),
        styles: renumber_styles(fragment, allocators, schema, policy)?,
        paragraphs: 0,
    };

    for root in fragment
        .markup
        .iter_mut()
        .chain(fragment.styles.values_mut().flat_map(BTreeMap::values_mut))
    {
        rewrite_refs(root, schema, &renames);
    }

    for element in &mut fragment.markup {
        element.walk_mut(&mut |e| {
            if e.is(schema.paragraph) && e.has_attr(schema.paragraph_id) {
                e.set_attr(schema.paragraph_id, allocators.paragraph.allocate().to_string());
                renames.paragraphs += 1;
            }
        });
    }

    log::debug!(
        "fragment {}: {} assets renamed, {} style entries renumbered, {} paragraph ids assigned",
        fragment.index,
        renames.assets.len(),
        renames.styles.values().map(BTreeMap::len).sum::<usize>(),
        renames.paragraphs
    );
    Ok(renames)
}

/// One fresh global id per local asset, applied to the declaration and storage path.
fn rename_assets(
    fragment: &mut Fragment,
    allocators: &mut Allocators,
    schema: &Schema,
) -> BTreeMap<String, String> {
    let mut mapping = BTreeMap::new();
    let mut manifest_entries = BTreeMap::new();

    for asset in &mut fragment.assets {
        let slot = allocators.allocate_asset();
        match schema.assets {
            AssetLayout::Inline {
                item_payload_attr, ..
            } => {
                asset.declaration.set_attr(item_payload_attr, slot.storage.as_str());
                asset.storage_path = bin_storage_path(&slot.storage, &asset.extension);
            }
            AssetLayout::Manifest { directory, .. } => {
                let href = format!("{}/{}.{}", directory, slot.storage, asset.extension);
                asset.declaration.set_attr("id", slot.reference.as_str());
                asset.declaration.set_attr("href", href.as_str());
                asset.storage_path = href;
                manifest_entries.insert(slot.reference.clone(), asset.declaration.clone());
            }
        }
        mapping.insert(std::mem::replace(&mut asset.id, slot.reference.clone()), slot.reference);
    }

    if let AssetLayout::Manifest { .. } = schema.assets {
        fragment.manifest_entries = manifest_entries;
    }
    mapping
}

fn renumber_styles(
    fragment: &mut Fragment,
    allocators: &mut Allocators,
    schema: &Schema,
    policy: StylePolicy,
) -> Result<BTreeMap<StyleCategory, BTreeMap<u32, u32>>> {
    let mut mapping: BTreeMap<StyleCategory, BTreeMap<u32, u32>> = BTreeMap::new();

    match policy {
        StylePolicy::TemplateDefaults => {
            for (category, entries) in &fragment.styles {
                let base = category.base();
                mapping.insert(*category, entries.keys().map(|&local| (local, base)).collect());
            }
            fragment.styles.clear();
        }
        StylePolicy::Import => {
            let index = fragment.index;
            let styles = std::mem::take(&mut fragment.styles);
            for (category, entries) in styles {
                let id_attr = schema.style_table(category).map_or("Id", |t| t.id_attr);
                let map = mapping.entry(category).or_default();
                let renumbered = fragment.styles.entry(category).or_default();
                // BTreeMap order keeps ascending local indices ascending globally.
                for (local, mut entry) in entries {
                    let global = allocators
                        .allocate_style(category)
                        .ok_or_else(|| Error::IdSpaceExhausted {
                            fragment: index,
                            namespace: category.name().to_string(),
                            id: local.to_string(),
                        })?;
                    entry.set_attr(id_attr, global.to_string());
                    map.insert(local, global);
                    renumbered.insert(global, entry);
                }
            }
        }
    }
    Ok(mapping)
}

fn rewrite_refs(root: &mut Element, schema: &Schema, renames: &Renames) {
    let style = |category: StyleCategory, value: &str| -> Option<String> {
        let id = category.parse_ref(value)?;
        renames.styles.get(&category)?.get(&id).map(u32::to_string)
    };

    root.walk_mut(&mut |e| {
        for rule in schema.refs_for(&e.name) {
            let Some(value) = e.attr(rule.attr) else {
                continue;
            };
            let replacement = match rule.target {
                RefTarget::Asset => renames.assets.get(value).cloned(),
                RefTarget::Style(category) => style(category, value),
            };
            if let Some(new) = replacement {
                e.set_attr(rule.attr, new);
            }
        }
        if e.is(schema.heading.element) {
            if let Some(category) = schema.heading.category(e) {
                if let Some(new) = e.attr(schema.heading.id_attr).and_then(|v| style(category, v)) {
                    e.set_attr(schema.heading.id_attr, new);
                }
            }
        }
    });
}
