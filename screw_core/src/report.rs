//! # Batch Report
//!
//! JSON form of a processed table: run metadata, a summary, and one entry per
//! input row holding what was read, what was computed, or why it failed.
//!
//! ## Structure
//!
//! ```text
//! BatchReport
//! ├── meta: ReportMetadata (run id, timestamp, tool version, settings, source)
//! ├── summary: ReportSummary (rows, computed, failed)
//! └── rows: Vec<RowReport> (row number, passthrough columns, input, result | error)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::ProcessedTable;
use crate::calculations::power_screw::{PowerScrewInput, PowerScrewResult};
use crate::errors::CalcError;
use crate::schema::validate_schema;
use crate::settings::BatchSettings;

/// Version of the crate that produced a report
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub meta: ReportMetadata,
    pub summary: ReportSummary,
    pub rows: Vec<RowReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Unique id of this run
    pub run_id: Uuid,

    /// When the report was generated
    pub generated: DateTime<Utc>,

    pub tool_version: String,

    /// Input file the rows came from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub settings: BatchSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub rows: usize,
    pub computed: usize,
    pub failed: usize,
}

/// One input row and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowReport {
    /// 1-based data row number
    pub row: usize,

    /// Source columns the calculation does not use, carried through by header
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PowerScrewInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PowerScrewResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

impl BatchReport {
    /// Build a report from a processed table.
    pub fn new(processed: &ProcessedTable) -> Self {
        let source = &processed.source;
        let required = validate_schema(source.headers.as_slice()).ok();

        let rows = processed
            .batch
            .results
            .iter()
            .enumerate()
            .map(|(index, result)| {
                let columns = source
                    .headers
                    .iter()
                    .enumerate()
                    .filter(|(col, _)| !required.is_some_and(|map| map.is_required(*col)))
                    .map(|(col, header)| (header.clone(), source.cell(index, col).to_string()))
                    .collect();

                RowReport {
                    row: index + 1,
                    columns,
                    input: processed.inputs.get(index).copied().flatten(),
                    result: *result,
                    error: processed.batch.error_for(index + 1).cloned(),
                }
            })
            .collect();

        BatchReport {
            meta: ReportMetadata {
                run_id: Uuid::new_v4(),
                generated: Utc::now(),
                tool_version: TOOL_VERSION.to_string(),
                source: None,
                settings: processed.settings,
            },
            summary: ReportSummary {
                rows: processed.batch.results.len(),
                computed: processed.batch.computed_count(),
                failed: processed.batch.failed_count(),
            },
            rows,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::process_table;
    use crate::settings::ErrorPolicy;
    use crate::table::Table;

    fn table() -> Table {
        Table::new(
            ["Design", "Pitch", "Threads", "NominalDiameter", "CoreDiameter", "FrictionAngle", "Load"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
        .with_row(["Jack A", "2", "1", "20", "17", "10", "5000"])
        .with_row(["Jack B", "2", "1", "20", "0", "10", "5000"])
    }

    fn flagged() -> ProcessedTable {
        let settings = BatchSettings {
            error_policy: ErrorPolicy::Flag,
            ..Default::default()
        };
        process_table(&table(), &settings).unwrap()
    }

    #[test]
    fn test_report_rows() {
        let report = BatchReport::new(&flagged());

        assert_eq!(report.summary, ReportSummary { rows: 2, computed: 1, failed: 1 });
        assert_eq!(report.rows[0].row, 1);
        assert_eq!(report.rows[0].columns.len(), 1);
        assert_eq!(report.rows[0].columns["Design"], "Jack A");
        assert_eq!(report.rows[0].result.map(|r| r.mean_diameter), Some(19.0));
        assert!(report.rows[0].error.is_none());

        // Parsed but not computable: input kept, error attached
        assert!(report.rows[1].input.is_some());
        assert!(report.rows[1].result.is_none());
        assert_eq!(report.rows[1].error.as_ref().map(|e| e.error_code()), Some("DOMAIN_ERROR"));
    }

    #[test]
    fn test_report_metadata() {
        let report = BatchReport::new(&flagged()).with_source("jacks.csv");
        assert_eq!(report.meta.source.as_deref(), Some("jacks.csv"));
        assert_eq!(report.meta.tool_version, TOOL_VERSION);
        assert_eq!(report.meta.settings.error_policy, ErrorPolicy::Flag);
    }

    #[test]
    fn test_report_serialization() {
        let report = BatchReport::new(&flagged());
        let json = serde_json::to_string_pretty(&report).unwrap();

        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"torque_raise\": 10026.317"));
        assert!(json.contains("\"DomainError\""));
        assert!(!json.contains("\"source\""));

        let roundtrip: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.run_id, report.meta.run_id);
        assert_eq!(roundtrip.rows.len(), 2);
    }

    #[test]
    fn test_run_ids_unique() {
        let processed = flagged();
        assert_ne!(BatchReport::new(&processed).meta.run_id, BatchReport::new(&processed).meta.run_id);
    }
}
