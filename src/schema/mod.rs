//! Static structural tables for each package format.
//!
//! Every structural fact the merge stages rely on lives here: which
//! containers hold which items, which attributes reference which
//! identifier namespace, where declared counts are carried, and which
//! ancestor each kind of merged content requires. The merge stages read
//! these tables and carry no format-specific element names of their own.

mod hml;
mod hwpx;

use crate::detect::PackageFormat;
use crate::model::{Element, Package};
use serde::Serialize;

/// Style-table namespaces. Indices within each are positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StyleCategory {
    BorderFill,
    CharShape,
    TabDef,
    Numbering,
    Bullet,
    ParaShape,
    Style,
}

impl StyleCategory {
    pub const ALL: [StyleCategory; 7] = [
        StyleCategory::BorderFill,
        StyleCategory::CharShape,
        StyleCategory::TabDef,
        StyleCategory::Numbering,
        StyleCategory::Bullet,
        StyleCategory::ParaShape,
        StyleCategory::Style,
    ];

    /// Lowest valid index in this category.
    pub fn base(self) -> u32 {
        match self {
            StyleCategory::BorderFill | StyleCategory::Numbering | StyleCategory::Bullet => 1,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleCategory::BorderFill => "borderFill",
            StyleCategory::CharShape => "charShape",
            StyleCategory::TabDef => "tabDef",
            StyleCategory::Numbering => "numbering",
            StyleCategory::Bullet => "bullet",
            StyleCategory::ParaShape => "paraShape",
            StyleCategory::Style => "style",
        }
    }

    /// Parse a reference value, treating null markers and out-of-range
    /// values as no reference.
    pub fn parse_ref(self, value: &str) -> Option<u32> {
        let index: u32 = value.trim().parse().ok()?;
        if index == u32::MAX || index < self.base() {
            None
        } else {
            Some(index)
        }
    }
}

impl std::fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A container located by part name and a child path from the part root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPath {
    pub part: &'static str,
    pub path: &'static [&'static str],
}

impl PartPath {
    /// Last element name of the path, or the part name for the root.
    pub fn container_name(&self) -> &'static str {
        self.path.last().copied().unwrap_or(self.part)
    }

    pub fn resolve<'a>(&self, package: &'a Package) -> Option<&'a Element> {
        package.xml(self.part)?.root.find(self.path)
    }

    pub fn resolve_mut<'a>(&self, package: &'a mut Package) -> Option<&'a mut Element> {
        package.xml_mut(self.part)?.root.find_mut(self.path)
    }
}

/// A style list in the head part.
#[derive(Debug, Clone, Copy)]
pub struct StyleTable {
    pub category: StyleCategory,
    pub container: PartPath,
    pub item: &'static str,
    pub id_attr: &'static str,
}

/// What a reference attribute points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Style(StyleCategory),
    Asset,
}

/// An attribute on an element that references another declaration.
#[derive(Debug, Clone, Copy)]
pub struct RefRule {
    pub element: &'static str,
    pub attr: &'static str,
    pub target: RefTarget,
}

/// Paragraph-shape heading: the type attribute selects the namespace of the id attribute.
#[derive(Debug, Clone, Copy)]
pub struct HeadingRule {
    pub element: &'static str,
    pub type_attr: &'static str,
    pub id_attr: &'static str,
    pub numbering_types: &'static [&'static str],
    pub bullet_types: &'static [&'static str],
}

impl HeadingRule {
    /// Category referenced by a heading element, if its type carries a reference.
    pub fn category(&self, element: &Element) -> Option<StyleCategory> {
        let kind = element.attr(self.type_attr)?;
        if self.numbering_types.contains(&kind) {
            Some(StyleCategory::Numbering)
        } else if self.bullet_types.contains(&kind) {
            Some(StyleCategory::Bullet)
        } else {
            None
        }
    }
}

/// Per-language font tables and the character-shape element that references them.
#[derive(Debug, Clone, Copy)]
pub struct FontRule {
    pub reference: &'static str,
    /// (attribute on the reference element, language value on the font face)
    pub languages: &'static [(&'static str, &'static str)],
    pub faces: PartPath,
    pub face: &'static str,
    pub lang_attr: &'static str,
    pub font: &'static str,
    pub id_attr: &'static str,
}

/// A declared-count attribute.
#[derive(Debug, Clone, Copy)]
pub struct CountAttr {
    pub name: &'static str,
    /// Required attributes are always written; optional ones only when present.
    pub required: bool,
}

/// A container whose count attributes must equal its number of `child` elements.
#[derive(Debug, Clone, Copy)]
pub struct CountRule {
    pub container: &'static str,
    pub child: &'static str,
    pub attrs: &'static [CountAttr],
}

/// How a format stores binary assets.
#[derive(Debug, Clone, Copy)]
pub enum AssetLayout {
    /// Item table in the head plus base64 payloads in a storage container.
    Inline {
        items: PartPath,
        item: &'static str,
        item_payload_attr: &'static str,
        item_format_attr: &'static str,
        payloads: PartPath,
        payload: &'static str,
        payload_id_attr: &'static str,
    },
    /// Manifest declarations plus one binary part per asset.
    Manifest {
        manifest: PartPath,
        item: &'static str,
        directory: &'static str,
    },
}

/// Where column definitions live relative to section properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHost {
    /// Column definition is a child of the section-properties element.
    Section,
    /// Column definition is wrapped in a control element placed right after
    /// section properties in the same run.
    SiblingControl(&'static str),
}

/// Section-definition rules.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub section: &'static str,
    pub column: &'static str,
    pub host: ColumnHost,
    /// Document-level layout elements that never travel with a fragment.
    pub layout: &'static [&'static str],
}

/// Paragraph break flags.
#[derive(Debug, Clone, Copy)]
pub struct BreakRule {
    pub attrs: &'static [&'static str],
    pub off: &'static str,
    pub elements: &'static [&'static str],
}

/// Element that must sit directly inside a specific container.
#[derive(Debug, Clone, Copy)]
pub struct AncestorRule {
    pub element: &'static str,
    pub container: PartPath,
}

/// Kind of merged content, keyed to its required container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Body,
    Style(StyleCategory),
    AssetItem,
    AssetPayload,
}

/// Complete structural description of a package format.
#[derive(Debug)]
pub struct Schema {
    pub format: PackageFormat,
    pub root: &'static str,
    pub head_part: &'static str,
    pub body: PartPath,
    /// Name prefix and suffix of further parts that hold body sections.
    pub section_parts: Option<(&'static str, &'static str)>,
    pub paragraph: &'static str,
    pub paragraph_id: &'static str,
    pub run: &'static str,
    pub text_elements: &'static [&'static str],
    pub visible_elements: &'static [&'static str],
    pub endnote: &'static str,
    pub breaks: BreakRule,
    pub styles: &'static [StyleTable],
    pub refs: &'static [RefRule],
    pub heading: HeadingRule,
    pub fonts: FontRule,
    pub counts: &'static [CountRule],
    pub assets: AssetLayout,
    pub section: SectionRule,
    pub ancestors: &'static [AncestorRule],
}

impl Schema {
    /// The schema for a package format.
    pub fn for_format(format: PackageFormat) -> &'static Schema {
        match format {
            PackageFormat::Hml => &hml::SCHEMA,
            PackageFormat::Hwpx => &hwpx::SCHEMA,
        }
    }

    /// Whether a part holds a body section.
    pub fn is_section_part(&self, name: &str) -> bool {
        name == self.body.part
            || self
                .section_parts
                .is_some_and(|(prefix, suffix)| name.starts_with(prefix) && name.ends_with(suffix))
    }

    /// Names of every body-section XML part in the package, primary part first.
    pub fn section_part_names(&self, package: &Package) -> Vec<String> {
        let mut names: Vec<String> = package
            .xml_part_names()
            .into_iter()
            .filter(|n| n.as_str() != self.body.part && self.is_section_part(n))
            .collect();
        names.sort();
        if package.xml(self.body.part).is_some() {
            names.insert(0, self.body.part.to_string());
        }
        names
    }

    pub fn style_table(&self, category: StyleCategory) -> Option<&StyleTable> {
        self.styles.iter().find(|t| t.category == category)
    }

    /// Style table whose item element has the given name.
    pub fn style_table_for_item(&self, item: &str) -> Option<&StyleTable> {
        self.styles.iter().find(|t| t.item == item)
    }

    pub fn count_rule(&self, container: &str) -> Option<&CountRule> {
        self.counts.iter().find(|r| r.container == container)
    }

    /// Reference rules for an element name.
    pub fn refs_for(&self, element: &str) -> Vec<&RefRule> {
        self.refs.iter().filter(|r| r.element == element).collect()
    }

    pub fn is_text_element(&self, name: &str) -> bool {
        self.text_elements.contains(&name)
    }

    /// Container required by a kind of merged content. `None` means the
    /// content has no container (e.g. standalone binary parts).
    pub fn container_for(&self, kind: ContentKind) -> Option<PartPath> {
        match kind {
            ContentKind::Body => Some(self.body),
            ContentKind::Style(category) => self.style_table(category).map(|t| t.container),
            ContentKind::AssetItem => Some(match self.assets {
                AssetLayout::Inline { items, .. } => items,
                AssetLayout::Manifest { manifest, .. } => manifest,
            }),
            ContentKind::AssetPayload => match self.assets {
                AssetLayout::Inline { payloads, .. } => Some(payloads),
                AssetLayout::Manifest { .. } => None,
            },
        }
    }

    /// Every element-to-container rule: explicit rules plus the item
    /// elements of style tables and asset containers.
    pub fn ancestor_rules(&self) -> Vec<AncestorRule> {
        let mut rules: Vec<AncestorRule> = self.ancestors.to_vec();
        rules.extend(self.styles.iter().map(|t| AncestorRule {
            element: t.item,
            container: t.container,
        }));
        match self.assets {
            AssetLayout::Inline {
                items,
                item,
                payloads,
                payload,
                ..
            } => {
                rules.push(AncestorRule {
                    element: item,
                    container: items,
                });
                rules.push(AncestorRule {
                    element: payload,
                    container: payloads,
                });
            }
            AssetLayout::Manifest { manifest, item, .. } => rules.push(AncestorRule {
                element: item,
                container: manifest,
            }),
        }
        rules
    }
}
