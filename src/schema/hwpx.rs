//! HWPX archive parts.

use super::*;

pub(super) const HEADER_PART: &str = "Contents/header.xml";
pub(super) const SECTION_PART: &str = "Contents/section0.xml";
pub(super) const MANIFEST_PART: &str = "Contents/content.hpf";

const fn header(path: &'static [&'static str]) -> PartPath {
    PartPath {
        part: HEADER_PART,
        path,
    }
}

const ITEM_CNT: &[CountAttr] = &[
    CountAttr {
        name: "itemCnt",
        required: true,
    },
    CountAttr {
        name: "cnt",
        required: false,
    },
];

const FONT_CNT: &[CountAttr] = &[CountAttr {
    name: "fontCnt",
    required: true,
}];

pub(super) static SCHEMA: Schema = Schema {
    format: PackageFormat::Hwpx,
    root: "hs:sec",
    head_part: HEADER_PART,
    body: PartPath {
        part: SECTION_PART,
        path: &[],
    },
    section_parts: Some(("Contents/section", ".xml")),
    paragraph: "hp:p",
    paragraph_id: "id",
    run: "hp:run",
    text_elements: &["hp:t", "hp:script"],
    visible_elements: &["hp:pic", "hp:equation", "hp:tbl"],
    endnote: "hp:endNote",
    breaks: BreakRule {
        attrs: &["columnBreak", "pageBreak"],
        off: "0",
        elements: &[],
    },
    styles: &[
        StyleTable {
            category: StyleCategory::BorderFill,
            container: header(&["hh:refList", "hh:borderFills"]),
            item: "hh:borderFill",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::CharShape,
            container: header(&["hh:refList", "hh:charProperties"]),
            item: "hh:charPr",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::TabDef,
            container: header(&["hh:refList", "hh:tabProperties"]),
            item: "hh:tabPr",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::Numbering,
            container: header(&["hh:refList", "hh:numberings"]),
            item: "hh:numbering",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::Bullet,
            container: header(&["hh:refList", "hh:bullets"]),
            item: "hh:bullet",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::ParaShape,
            container: header(&["hh:refList", "hh:paraProperties"]),
            item: "hh:paraPr",
            id_attr: "id",
        },
        StyleTable {
            category: StyleCategory::Style,
            container: header(&["hh:refList", "hh:styles"]),
            item: "hh:style",
            id_attr: "id",
        },
    ],
    refs: &[
        RefRule {
            element: "hp:p",
            attr: "paraPrIDRef",
            target: RefTarget::Style(StyleCategory::ParaShape),
        },
        RefRule {
            element: "hp:p",
            attr: "styleIDRef",
            target: RefTarget::Style(StyleCategory::Style),
        },
        RefRule {
            element: "hp:run",
            attr: "charPrIDRef",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "hh:charPr",
            attr: "borderFillIDRef",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "hh:paraPr",
            attr: "tabPrIDRef",
            target: RefTarget::Style(StyleCategory::TabDef),
        },
        RefRule {
            element: "hh:border",
            attr: "borderFillIDRef",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "hh:paraHead",
            attr: "charPrIDRef",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "hh:style",
            attr: "paraPrIDRef",
            target: RefTarget::Style(StyleCategory::ParaShape),
        },
        RefRule {
            element: "hh:style",
            attr: "charPrIDRef",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "hh:style",
            attr: "nextStyleIDRef",
            target: RefTarget::Style(StyleCategory::Style),
        },
        RefRule {
            element: "hp:tbl",
            attr: "borderFillIDRef",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "hp:tc",
            attr: "borderFillIDRef",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "hc:img",
            attr: "binaryItemIDRef",
            target: RefTarget::Asset,
        },
    ],
    heading: HeadingRule {
        element: "hh:heading",
        type_attr: "type",
        id_attr: "idRef",
        numbering_types: &["NUMBER", "OUTLINE"],
        bullet_types: &["BULLET"],
    },
    fonts: FontRule {
        reference: "hh:fontRef",
        languages: &[
            ("hangul", "HANGUL"),
            ("latin", "LATIN"),
            ("hanja", "HANJA"),
            ("japanese", "JAPANESE"),
            ("other", "OTHER"),
            ("symbol", "SYMBOL"),
            ("user", "USER"),
        ],
        faces: header(&["hh:refList", "hh:fontfaces"]),
        face: "hh:fontface",
        lang_attr: "lang",
        font: "hh:font",
        id_attr: "id",
    },
    counts: &[
        CountRule {
            container: "hh:fontfaces",
            child: "hh:fontface",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:fontface",
            child: "hh:font",
            attrs: FONT_CNT,
        },
        CountRule {
            container: "hh:borderFills",
            child: "hh:borderFill",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:charProperties",
            child: "hh:charPr",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:tabProperties",
            child: "hh:tabPr",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:numberings",
            child: "hh:numbering",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:bullets",
            child: "hh:bullet",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:paraProperties",
            child: "hh:paraPr",
            attrs: ITEM_CNT,
        },
        CountRule {
            container: "hh:styles",
            child: "hh:style",
            attrs: ITEM_CNT,
        },
    ],
    assets: AssetLayout::Manifest {
        manifest: PartPath {
            part: MANIFEST_PART,
            path: &["opf:manifest"],
        },
        item: "opf:item",
        directory: "BinData",
    },
    section: SectionRule {
        section: "hp:secPr",
        column: "hp:colPr",
        host: ColumnHost::SiblingControl("hp:ctrl"),
        layout: &[],
    },
    ancestors: &[AncestorRule {
        element: "hh:refList",
        container: header(&[]),
    }],
};
