//! Merge report with per-fragment details and statistics.

use super::counts::CountAdjustment;
use crate::audit::Finding;
use crate::detect::PackageFormat;
use serde::Serialize;
use std::collections::BTreeMap;

/// Observability record of one merge run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Output package format
    pub format: Option<PackageFormat>,

    /// One entry per folded fragment, in source order
    pub fragments: Vec<FragmentReport>,

    /// Declared counts rewritten by the final pass
    pub count_adjustments: Vec<CountAdjustment>,

    /// Non-fatal reconciliation notes
    pub notes: Vec<String>,

    /// Structural audit findings on the output
    pub findings: Vec<Finding>,

    /// Totals across all fragments
    pub stats: MergeStats,
}

impl MergeReport {
    pub fn new(format: PackageFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }

    /// Record a folded fragment.
    pub fn add_fragment(&mut self, fragment: FragmentReport) {
        self.stats.add(&fragment);
        self.fragments.push(fragment);
    }

    /// Whether the output passed the structural audit.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// What one fragment contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FragmentReport {
    pub index: usize,
    /// Top-level body elements inserted
    pub elements: usize,
    /// Paragraph ids reassigned
    pub paragraphs: usize,
    pub assets: usize,
    pub styles: usize,
    pub column_adopted: bool,
    /// Local asset id -> global asset id
    pub asset_map: BTreeMap<String, String>,
}

/// Totals collected during a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub fragment_count: u32,
    pub element_count: u32,
    pub paragraph_count: u32,
    pub asset_count: u32,
    pub style_count: u32,
}

impl MergeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one fragment's contribution.
    pub fn add(&mut self, fragment: &FragmentReport) {
        self.fragment_count += 1;
        self.element_count += fragment.elements as u32;
        self.paragraph_count += fragment.paragraphs as u32;
        self.asset_count += fragment.assets as u32;
        self.style_count += fragment.styles as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &MergeStats) {
        self.fragment_count += other.fragment_count;
        self.element_count += other.element_count;
        self.paragraph_count += other.paragraph_count;
        self.asset_count += other.asset_count;
        self.style_count += other.style_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_fragment_updates_stats() {
        let mut report = MergeReport::new(PackageFormat::Hml);
        report.add_fragment(FragmentReport {
            index: 0,
            elements: 2,
            paragraphs: 2,
            assets: 1,
            ..Default::default()
        });
        report.add_fragment(FragmentReport {
            index: 1,
            elements: 1,
            paragraphs: 1,
            assets: 1,
            styles: 3,
            ..Default::default()
        });
        assert_eq!(report.stats.fragment_count, 2);
        assert_eq!(report.stats.element_count, 3);
        assert_eq!(report.stats.asset_count, 2);
        assert_eq!(report.stats.style_count, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_stats_merge() {
        let mut total = MergeStats::new();
        let batch = MergeStats {
            fragment_count: 3,
            asset_count: 4,
            ..Default::default()
        };
        total.merge(&batch);
        total.merge(&batch);
        assert_eq!(total.fragment_count, 6);
        assert_eq!(total.asset_count, 8);
    }
}
