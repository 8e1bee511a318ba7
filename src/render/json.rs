//! JSON rendering for merge reports and question previews.

use crate::error::{Error, Result};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert any serializable value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Serialize(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeReport;

    #[test]
    fn test_to_json_pretty() {
        let mut report = MergeReport::default();
        report.notes.push("renumbered 2 assets".to_string());

        let json = to_json(&report, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"notes\""));
        assert!(json.contains("renumbered 2 assets"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let report = MergeReport::default();
        let json = to_json(&report, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }
}
