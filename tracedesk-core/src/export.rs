use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::coverage::CoverageStats;
use crate::models::{TraceabilityItem, TraceabilityMapping};

/// The on-disk shape of a JSON matrix export
#[derive(Debug, Serialize, Deserialize)]
pub struct MatrixExport {
    pub exported_at: chrono::DateTime<chrono::Utc>,
    pub rows: Vec<TraceabilityItem>,
    pub mappings: Vec<TraceabilityMapping>,
}

/// Export the matrix rows and mappings as pretty JSON
pub fn export_json(
    rows: &[TraceabilityItem],
    mappings: &[TraceabilityMapping],
    output_path: &Path,
) -> Result<()> {
    let export = MatrixExport {
        exported_at: chrono::Utc::now(),
        rows: rows.to_vec(),
        mappings: mappings.to_vec(),
    };
    let json = serde_json::to_string_pretty(&export)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write export to {:?}", output_path))?;

    log::info!(
        "Exported {} rows and {} mappings to {}",
        rows.len(),
        mappings.len(),
        output_path.display()
    );
    Ok(())
}

/// Render the matrix as a Markdown report
pub fn render_markdown(rows: &[TraceabilityItem], mappings: &[TraceabilityMapping]) -> String {
    let mut output = String::new();
    output.push_str("# Traceability Matrix\n\n");

    let stats = CoverageStats::compute(rows, mappings);
    output.push_str(&format!(
        "**Coverage:** {:.0}% ({} of {} requirements) | **Test cases:** {} | **Mappings:** {}\n\n",
        stats.percentage,
        stats.covered,
        stats.requirements,
        stats.test_cases,
        mappings.len()
    ));

    output.push_str("| Requirement | Content | Test cases | IDs | Remediation |\n");
    output.push_str("|---|---|---|---|---|\n");

    for row in rows {
        let (id, content) = match &row.requirement {
            Some(req) => (req.req_id.as_str(), req.content.as_str()),
            None => ("N/A", ""),
        };
        let test_ids = row
            .test_cases
            .iter()
            .map(|tc| tc.test_id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let remediation = match &row.remediation {
            Some(r) => format!("[{}] {} ({})", r.severity.badge(), r.description, r.status),
            None => String::new(),
        };

        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(id),
            escape_cell(content),
            row.test_cases.len(),
            escape_cell(&test_ids),
            escape_cell(&remediation)
        ));
    }

    output
}

/// Write the Markdown report to disk
pub fn export_markdown(
    rows: &[TraceabilityItem],
    mappings: &[TraceabilityMapping],
    output_path: &Path,
) -> Result<()> {
    fs::write(output_path, render_markdown(rows, mappings))
        .with_context(|| format!("Failed to write report to {:?}", output_path))?;
    log::info!("Exported matrix report: {}", output_path.display());
    Ok(())
}

// Pipes end a table cell; newlines end the row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Remediation, RemediationSeverity, Requirement, TestCase};
    use tempfile::tempdir;

    fn sample() -> (Vec<TraceabilityItem>, Vec<TraceabilityMapping>) {
        let mut covered = TraceabilityItem::for_requirement(Requirement::new("REQ-1", "Login | logout"));
        covered.test_cases.push(TestCase::new("TC-1", "login"));
        covered.test_cases.push(TestCase::new("TC-2", "logout"));
        covered.remediation = Some(Remediation::new("REM-1", "REQ-1", "add negative case", RemediationSeverity::High));

        let bare = TraceabilityItem::for_requirement(Requirement::new("REQ-2", "Audit\nlog"));
        let mappings = vec![TraceabilityMapping::new("REQ-2", "TC-9", "")];
        (vec![covered, bare], mappings)
    }

    #[test]
    fn test_markdown_has_one_line_per_row() {
        let (rows, mappings) = sample();
        let report = render_markdown(&rows, &mappings);

        assert!(report.contains("**Coverage:** 100% (2 of 2 requirements)"));
        assert!(report.contains("| REQ-1 | Login \\| logout | 2 | TC-1, TC-2 | [H] add negative case (Pending) |"));
        assert!(report.contains("| REQ-2 | Audit log | 0 |  |  |"));
    }

    #[test]
    fn test_export_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("matrix.json");
        let (rows, mappings) = sample();

        export_json(&rows, &mappings, &path)?;

        let loaded: MatrixExport = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(loaded.rows, rows);
        assert_eq!(loaded.mappings, mappings);
        Ok(())
    }

    #[test]
    fn test_export_markdown_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.md");
        assert!(export_markdown(&[], &[], &path).is_err());
    }
}
