//! Final pass that makes every declared count equal its container's true child count.

use crate::error::{Error, Result};
use crate::model::{Element, Node, Package};
use crate::schema::{CountRule, Schema};
use serde::Serialize;

/// A declared count rewritten by the enforcer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountAdjustment {
    pub part: String,
    pub container: String,
    pub attribute: String,
    /// Value before the rewrite (`None` when the attribute was absent).
    pub declared: Option<String>,
    pub actual: usize,
}

/// Rewrite every count attribute known to the schema, in every XML part.
///
/// Each count attribute is an independent invariant: sibling attributes on
/// the same container are checked against the child count separately.
/// Containers holding anything other than their item elements fail closed.
pub fn enforce(package: &mut Package, schema: &Schema) -> Result<Vec<CountAdjustment>> {
    let mut adjustments = Vec::new();
    for part in package.xml_part_names() {
        let Some(doc) = package.xml_mut(&part) else {
            continue;
        };
        let mut failure = None;
        doc.root.walk_mut(&mut |e| {
            if failure.is_some() {
                return;
            }
            let Some(rule) = schema.count_rule(&e.name) else {
                return;
            };
            match enforce_container(e, rule, &part) {
                Ok(mut changed) => adjustments.append(&mut changed),
                Err(err) => failure = Some(err),
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
    }

    if !adjustments.is_empty() {
        log::debug!("rewrote {} declared counts", adjustments.len());
    }
    Ok(adjustments)
}

fn enforce_container(element: &mut Element, rule: &CountRule, part: &str) -> Result<Vec<CountAdjustment>> {
    let actual = true_count(element, rule)?;
    let mut changed = Vec::new();
    for attr in rule.attrs {
        let declared = element.attr(attr.name).map(str::to_string);
        if declared.is_none() && !attr.required {
            continue;
        }
        if declared.as_deref().map(str::trim) == Some(actual.to_string().as_str()) {
            continue;
        }
        element.set_attr(attr.name, actual.to_string());
        changed.push(CountAdjustment {
            part: part.to_string(),
            container: element.name.clone(),
            attribute: attr.name.to_string(),
            declared,
            actual,
        });
    }
    Ok(changed)
}

/// Number of item children, or an error when the container holds content
/// the count cannot account for.
fn true_count(element: &Element, rule: &CountRule) -> Result<usize> {
    let mut count = 0;
    for node in &element.children {
        let unexpected = match node {
            Node::Element(child) if child.is(rule.child) => {
                count += 1;
                None
            }
            Node::Element(child) => Some(format!("unexpected <{}> child", child.name)),
            Node::Text(_) if node.is_blank_text() => None,
            Node::Text(_) | Node::CData(_) => Some("character data among items".to_string()),
            Node::Comment(_) | Node::Instruction(_) => None,
        };
        if let Some(reason) = unexpected {
            let attribute = rule.attrs.first().map_or("", |a| a.name);
            let expected = element
                .attr(attribute)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            return Err(Error::CountInvariant {
                container: element.name.clone(),
                attribute: attribute.to_string(),
                expected,
                actual: count,
                reason,
            });
        }
    }
    Ok(count)
}
