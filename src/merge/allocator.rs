//! Per-namespace identifier allocators owned by a target document.

use crate::model::{Element, Package};
use crate::schema::{AssetLayout, Schema, StyleCategory};
use std::collections::{BTreeMap, HashSet};

/// Monotonically increasing numeric allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Hand out the next identifier.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Allocator for prefixed names (`image7`) that skips names already taken.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    prefix: &'static str,
    next: u64,
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new(prefix: &'static str, taken: HashSet<String>) -> Self {
        Self {
            prefix,
            next: 1,
            taken,
        }
    }

    pub fn allocate(&mut self) -> String {
        loop {
            let name = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// Global id handed out for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSlot {
    /// Value written at reference sites.
    pub reference: String,
    /// Storage key: payload id (HML) or part stem (HWPX).
    pub storage: String,
}

/// Every allocator a merge run needs.
#[derive(Debug, Clone)]
pub struct Allocators {
    pub paragraph: IdAllocator,
    pub styles: BTreeMap<StyleCategory, IdAllocator>,
    assets: AssetAllocator,
}

#[derive(Debug, Clone)]
enum AssetAllocator {
    /// Item position in the item table plus payload id in storage.
    Inline {
        position: IdAllocator,
        storage: IdAllocator,
    },
    Named(NameAllocator),
}

impl Allocators {
    /// Seed allocators past everything already declared in the target.
    pub fn seed(schema: &Schema, package: &Package) -> Self {
        let mut max_paragraph = None::<u64>;
        for part in schema.section_part_names(package) {
            let Some(doc) = package.xml(&part) else {
                continue;
            };
            doc.root.walk(&mut |e| {
                if e.is(schema.paragraph) {
                    if let Some(id) = e.attr(schema.paragraph_id).and_then(|v| v.trim().parse().ok()) {
                        max_paragraph = max_paragraph.max(Some(id));
                    }
                }
            });
        }
        let paragraph = IdAllocator::starting_at(max_paragraph.map_or(1, |m| m + 1));

        let styles = schema
            .styles
            .iter()
            .map(|table| {
                let base = u64::from(table.category.base());
                let next = table
                    .container
                    .resolve(package)
                    .map(|list| {
                        let items: Vec<&Element> = list.elements().filter(|e| e.is(table.item)).collect();
                        let max_id = items
                            .iter()
                            .filter_map(|e| e.attr(table.id_attr)?.trim().parse::<u64>().ok())
                            .max();
                        let positional = items.len() as u64 + base;
                        max_id.map_or(positional, |m| positional.max(m + 1))
                    })
                    .unwrap_or(base);
                (table.category, IdAllocator::starting_at(next))
            })
            .collect();

        let assets = match schema.assets {
            AssetLayout::Inline {
                items,
                item,
                item_payload_attr,
                payloads,
                payload,
                payload_id_attr,
                ..
            } => {
                let declared: Vec<&Element> = items
                    .resolve(package)
                    .map(|l| l.elements().filter(|e| e.is(item)).collect())
                    .unwrap_or_default();
                let mut max_storage = declared
                    .iter()
                    .filter_map(|e| e.attr(item_payload_attr)?.trim().parse::<u64>().ok())
                    .max()
                    .unwrap_or(0);
                if let Some(store) = payloads.resolve(package) {
                    for data in store.elements().filter(|e| e.is(payload)) {
                        if let Some(id) = data.attr(payload_id_attr).and_then(|v| v.trim().parse().ok()) {
                            max_storage = max_storage.max(id);
                        }
                    }
                }
                AssetAllocator::Inline {
                    position: IdAllocator::starting_at(declared.len() as u64 + 1),
                    storage: IdAllocator::starting_at(max_storage + 1),
                }
            }
            AssetLayout::Manifest {
                manifest,
                item,
                directory,
            } => {
                let mut taken: HashSet<String> = manifest
                    .resolve(package)
                    .map(|m| {
                        m.elements()
                            .filter(|e| e.is(item))
                            .filter_map(|e| e.attr("id").map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                let prefix = format!("{}/", directory);
                for name in package.part_names() {
                    if let Some(file) = name.strip_prefix(&prefix) {
                        let stem = file.rsplit_once('.').map_or(file, |(s, _)| s);
                        taken.insert(stem.to_string());
                    }
                }
                AssetAllocator::Named(NameAllocator::new("image", taken))
            }
        };

        Self {
            paragraph,
            styles,
            assets,
        }
    }

    /// Next global style index in a category.
    ///
    /// Returns `None` once the category's index space is used up; the last
    /// value is reserved as the null reference.
    pub fn allocate_style(&mut self, category: StyleCategory) -> Option<u32> {
        let alloc = self
            .styles
            .entry(category)
            .or_insert_with(|| IdAllocator::starting_at(u64::from(category.base())));
        if alloc.peek() >= u64::from(u32::MAX) {
            return None;
        }
        u32::try_from(alloc.allocate()).ok()
    }

    /// Next global asset identity.
    pub fn allocate_asset(&mut self) -> AssetSlot {
        match &mut self.assets {
            AssetAllocator::Inline { position, storage } => AssetSlot {
                reference: position.allocate().to_string(),
                storage: storage.allocate().to_string(),
            },
            AssetAllocator::Named(names) => {
                let name = names.allocate();
                AssetSlot {
                    reference: name.clone(),
                    storage: name,
                }
            }
        }
    }
}
