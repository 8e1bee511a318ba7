//! Fragment assembly: folds extracted fragments into a template package.
//!
//! A merge run reads every source, extracts and validates its fragment,
//! binds the template, then folds fragments one by one in source order
//! (reconcile identifiers, then place). Declared counts are enforced once at
//! the end and the result is serialized. A run either succeeds completely or
//! returns an error and no output.
//!
//! Each run owns its [`TargetDocument`] and allocators, so independent runs
//! can execute in parallel (see [`merge_batch`]).

mod allocator;
mod counts;
mod options;
mod placement;
mod reconcile;
mod report;
mod target;
pub mod template;

pub use allocator::{Allocators, AssetSlot, IdAllocator, NameAllocator};
pub use counts::{enforce, CountAdjustment};
pub use options::{MergeOptions, StylePolicy};
pub use placement::{check_containers, place, Placed};
pub use reconcile::{reconcile, validate, Renames};
pub use report::{FragmentReport, MergeReport, MergeStats};
pub use target::TargetDocument;
pub use template::{bind_template, Placeholders};

use crate::audit::audit;
use crate::error::{Error, Result};
use crate::model::Fragment;
use crate::parser::{extract_fragment, read_package};
use crate::render::write_package;
use crate::schema::Schema;
use rayon::prelude::*;

/// Serialized package plus the report of the run that produced it.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub report: MergeReport,
}

/// Merge source packages into a template package.
///
/// Sources are folded in slice order; each source's position is the
/// fragment index carried by every error raised for it.
pub fn merge<S: AsRef<[u8]>>(template: &[u8], sources: &[S], options: &MergeOptions) -> Result<MergeOutput> {
    let fragments = sources
        .iter()
        .enumerate()
        .map(|(index, source)| extract_source(index, source.as_ref(), options))
        .collect::<Result<Vec<_>>>()?;

    for fragment in &fragments {
        validate(fragment, Schema::for_format(fragment.format))?;
    }

    let mut target = bind_template(template, &options.placeholders(), &options.content_token)?;
    let schema = target.schema;
    for fragment in &fragments {
        if fragment.format != schema.format {
            return Err(Error::placement(
                Some(fragment.index),
                schema.root,
                format!(
                    "{} fragment cannot be placed into a {} template",
                    fragment.format, schema.format
                ),
            ));
        }
        check_containers(schema, &target.package, fragment)?;
    }

    let mut report = MergeReport::new(schema.format);
    for mut fragment in fragments {
        let renames = reconcile(&mut fragment, &mut target.allocators, schema, options.style_policy)?;
        let index = fragment.index;
        let placed = place(&mut target, fragment)?;
        if !renames.assets.is_empty() {
            report.notes.push(format!(
                "fragment {}: renumbered {} assets",
                index,
                renames.assets.len()
            ));
        }
        report.notes.extend(placed.notes);
        report.add_fragment(FragmentReport {
            index,
            elements: placed.elements,
            paragraphs: renames.paragraphs,
            assets: placed.assets,
            styles: placed.styles,
            column_adopted: placed.column_adopted,
            asset_map: renames.assets,
        });
    }

    let mut package = target.into_package();
    report.count_adjustments = enforce(&mut package, schema)?;

    if options.audit {
        report.findings = audit(&package);
        for finding in &report.findings {
            log::warn!("audit: {}", finding);
        }
    }

    let bytes = write_package(&package)?;
    log::info!(
        "merged {} fragments into {} package ({} elements, {} assets, {} bytes)",
        report.stats.fragment_count,
        schema.format,
        report.stats.element_count,
        report.stats.asset_count,
        bytes.len()
    );
    Ok(MergeOutput { bytes, report })
}

fn extract_source(index: usize, source: &[u8], options: &MergeOptions) -> Result<Fragment> {
    let package = read_package(source).map_err(|err| match err {
        Error::Extraction { .. } => err,
        other => Error::extraction(index, other.to_string()),
    })?;
    extract_fragment(&package, options.extract.clone(), index)
}

/// An independent merge run.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub template: Vec<u8>,
    pub sources: Vec<Vec<u8>>,
    pub options: MergeOptions,
}

/// Run independent merges in parallel. Results come back in job order.
pub fn merge_batch(jobs: &[MergeJob]) -> Vec<Result<MergeOutput>> {
    jobs.par_iter()
        .map(|job| merge(&job.template, &job.sources, &job.options))
        .collect()
}
