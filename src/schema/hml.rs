//! Flat HWPML markup.

use super::*;
use crate::model::HML_PART;

const MAPPING: &[&str] = &["HEAD", "MAPPINGTABLE"];

const fn head(path: &'static [&'static str]) -> PartPath {
    PartPath {
        part: HML_PART,
        path,
    }
}

const COUNT: &[CountAttr] = &[CountAttr {
    name: "Count",
    required: true,
}];

const OPTIONAL_COUNT: &[CountAttr] = &[CountAttr {
    name: "Count",
    required: false,
}];

pub(super) static SCHEMA: Schema = Schema {
    format: PackageFormat::Hml,
    root: "HWPML",
    head_part: HML_PART,
    body: head(&["BODY", "SECTION"]),
    section_parts: None,
    paragraph: "P",
    paragraph_id: "InstId",
    run: "TEXT",
    text_elements: &["CHAR", "SCRIPT"],
    visible_elements: &["PICTURE", "EQUATION", "TABLE"],
    endnote: "ENDNOTE",
    breaks: BreakRule {
        attrs: &["ColumnBreak", "PageBreak"],
        off: "false",
        elements: &["COLBREAK"],
    },
    styles: &[
        StyleTable {
            category: StyleCategory::BorderFill,
            container: head(&["HEAD", "MAPPINGTABLE", "BORDERFILLLIST"]),
            item: "BORDERFILL",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::CharShape,
            container: head(&["HEAD", "MAPPINGTABLE", "CHARSHAPELIST"]),
            item: "CHARSHAPE",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::TabDef,
            container: head(&["HEAD", "MAPPINGTABLE", "TABDEFLIST"]),
            item: "TABDEF",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::Numbering,
            container: head(&["HEAD", "MAPPINGTABLE", "NUMBERINGLIST"]),
            item: "NUMBERING",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::Bullet,
            container: head(&["HEAD", "MAPPINGTABLE", "BULLETLIST"]),
            item: "BULLET",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::ParaShape,
            container: head(&["HEAD", "MAPPINGTABLE", "PARASHAPELIST"]),
            item: "PARASHAPE",
            id_attr: "Id",
        },
        StyleTable {
            category: StyleCategory::Style,
            container: head(&["HEAD", "MAPPINGTABLE", "STYLELIST"]),
            item: "STYLE",
            id_attr: "Id",
        },
    ],
    refs: &[
        RefRule {
            element: "P",
            attr: "ParaShape",
            target: RefTarget::Style(StyleCategory::ParaShape),
        },
        RefRule {
            element: "P",
            attr: "Style",
            target: RefTarget::Style(StyleCategory::Style),
        },
        RefRule {
            element: "TEXT",
            attr: "CharShape",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "CHARSHAPE",
            attr: "BorderFillId",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "PARASHAPE",
            attr: "TabDef",
            target: RefTarget::Style(StyleCategory::TabDef),
        },
        RefRule {
            element: "PARABORDER",
            attr: "BorderFill",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "PARAHEAD",
            attr: "CharShape",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "STYLE",
            attr: "ParaShape",
            target: RefTarget::Style(StyleCategory::ParaShape),
        },
        RefRule {
            element: "STYLE",
            attr: "CharShape",
            target: RefTarget::Style(StyleCategory::CharShape),
        },
        RefRule {
            element: "STYLE",
            attr: "NextStyle",
            target: RefTarget::Style(StyleCategory::Style),
        },
        RefRule {
            element: "TABLE",
            attr: "BorderFill",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "CELL",
            attr: "BorderFill",
            target: RefTarget::Style(StyleCategory::BorderFill),
        },
        RefRule {
            element: "IMAGE",
            attr: "BinItem",
            target: RefTarget::Asset,
        },
    ],
    heading: HeadingRule {
        element: "PARASHAPE",
        type_attr: "HeadingType",
        id_attr: "Heading",
        numbering_types: &["Number", "Outline"],
        bullet_types: &["Bullet"],
    },
    fonts: FontRule {
        reference: "FONTID",
        languages: &[
            ("Hangul", "Hangul"),
            ("Latin", "Latin"),
            ("Hanja", "Hanja"),
            ("Japanese", "Japanese"),
            ("Other", "Other"),
            ("Symbol", "Symbol"),
            ("User", "User"),
        ],
        faces: head(&["HEAD", "MAPPINGTABLE", "FACENAMELIST"]),
        face: "FONTFACE",
        lang_attr: "Lang",
        font: "FONT",
        id_attr: "Id",
    },
    counts: &[
        CountRule {
            container: "BINDATALIST",
            child: "BINITEM",
            attrs: COUNT,
        },
        CountRule {
            container: "BINDATASTORAGE",
            child: "BINDATA",
            attrs: OPTIONAL_COUNT,
        },
        CountRule {
            container: "FONTFACE",
            child: "FONT",
            attrs: COUNT,
        },
        CountRule {
            container: "BORDERFILLLIST",
            child: "BORDERFILL",
            attrs: COUNT,
        },
        CountRule {
            container: "CHARSHAPELIST",
            child: "CHARSHAPE",
            attrs: COUNT,
        },
        CountRule {
            container: "TABDEFLIST",
            child: "TABDEF",
            attrs: COUNT,
        },
        CountRule {
            container: "NUMBERINGLIST",
            child: "NUMBERING",
            attrs: COUNT,
        },
        CountRule {
            container: "BULLETLIST",
            child: "BULLET",
            attrs: COUNT,
        },
        CountRule {
            container: "PARASHAPELIST",
            child: "PARASHAPE",
            attrs: COUNT,
        },
        CountRule {
            container: "STYLELIST",
            child: "STYLE",
            attrs: COUNT,
        },
    ],
    assets: AssetLayout::Inline {
        items: head(&["HEAD", "MAPPINGTABLE", "BINDATALIST"]),
        item: "BINITEM",
        item_payload_attr: "BinData",
        item_format_attr: "Format",
        payloads: head(&["TAIL", "BINDATASTORAGE"]),
        payload: "BINDATA",
        payload_id_attr: "Id",
    },
    section: SectionRule {
        section: "SECDEF",
        column: "COLDEF",
        host: ColumnHost::Section,
        layout: &[
            "PAGEDEF",
            "FOOTNOTESHAPE",
            "ENDNOTESHAPE",
            "PAGEBORDERFILL",
            "MASTERPAGE",
            "STARTNUMBER",
            "HIDE",
        ],
    },
    ancestors: &[
        AncestorRule {
            element: "BINDATALIST",
            container: head(MAPPING),
        },
        AncestorRule {
            element: "BINDATASTORAGE",
            container: head(&["TAIL"]),
        },
    ],
};
