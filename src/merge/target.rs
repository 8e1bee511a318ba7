//! The accumulating merge result.

use super::allocator::Allocators;
use super::template::take_content_anchor;
use crate::error::{Error, Result};
use crate::model::{Element, Node, Package};
use crate::schema::Schema;

/// Target package seeded from a template, plus the allocators and insertion
/// cursor of one merge run. Owned exclusively by that run.
#[derive(Debug)]
pub struct TargetDocument {
    pub schema: &'static Schema,
    pub package: Package,
    pub allocators: Allocators,
    /// Child position in the body container where the next fragment goes.
    cursor: usize,
}

impl TargetDocument {
    /// Seed a target from a bound template package.
    pub fn new(mut package: Package, content_token: &str) -> Result<Self> {
        let schema = Schema::for_format(package.format);
        let cursor = take_content_anchor(schema, &mut package, content_token)?;
        let allocators = Allocators::seed(schema, &package);
        log::debug!(
            "target {} seeded, content cursor at {}, next paragraph id {}",
            package.format,
            cursor,
            allocators.paragraph.peek()
        );
        Ok(Self {
            schema,
            package,
            allocators,
            cursor,
        })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Insert body elements at the cursor and advance it.
    pub fn insert_body(&mut self, elements: Vec<Element>, fragment: usize) -> Result<usize> {
        let body = self.schema.body.resolve_mut(&mut self.package).ok_or_else(|| {
            Error::placement(
                Some(fragment),
                self.schema.body.container_name(),
                "body container missing from template",
            )
        })?;
        let at = self.cursor.min(body.children.len());
        let count = elements.len();
        body.children
            .splice(at..at, elements.into_iter().map(Node::Element));
        self.cursor = at + count;
        Ok(count)
    }

    /// Paragraph elements in the body part, at any depth.
    pub fn paragraph_count(&self) -> usize {
        let mut count = 0;
        if let Some(doc) = self.package.xml(self.schema.body.part) {
            doc.root.walk(&mut |e| {
                if e.is(self.schema.paragraph) {
                    count += 1;
                }
            });
        }
        count
    }

    /// Hand the finished package to the serializer.
    pub fn into_package(self) -> Package {
        self.package
    }
}
