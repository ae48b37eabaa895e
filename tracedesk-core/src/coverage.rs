//! Test coverage figures for the dashboard gauge

use std::collections::HashSet;
use std::fmt;

use crate::models::{TraceabilityItem, TraceabilityMapping};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageStats {
    pub requirements: usize,
    /// Test cases attached to matrix rows
    pub test_cases: usize,
    /// Requirements with at least one test case or mapping
    pub covered: usize,
    pub percentage: f64,
}

impl CoverageStats {
    /// Compute coverage from the matrix rows and the mapping list.
    ///
    /// A requirement is covered when its row holds a test case or any
    /// mapping names it by either of its ids.
    pub fn compute(rows: &[TraceabilityItem], mappings: &[TraceabilityMapping]) -> Self {
        let mapped: HashSet<&str> = mappings.iter().map(|m| m.requirement_id.as_str()).collect();

        let mut requirements = 0;
        let mut test_cases = 0;
        let mut covered = 0;
        for row in rows {
            test_cases += row.test_cases.len();
            let Some(req) = &row.requirement else {
                continue;
            };
            requirements += 1;

            let is_mapped = mapped.contains(req.req_id.as_str())
                || req.id.as_deref().is_some_and(|id| mapped.contains(id));
            if !row.test_cases.is_empty() || is_mapped {
                covered += 1;
            }
        }

        let percentage = if requirements == 0 {
            0.0
        } else {
            covered as f64 / requirements as f64 * 100.0
        };

        Self {
            requirements,
            test_cases,
            covered,
            percentage,
        }
    }

    pub fn band(&self) -> CoverageBand {
        CoverageBand::for_percentage(self.percentage)
    }

    pub fn needle_angle(&self) -> f64 {
        needle_angle(self.percentage)
    }
}

/// Gauge needle rotation in degrees: -90 at 0%, +90 at 100%
pub fn needle_angle(percentage: f64) -> f64 {
    let pct = percentage.clamp(0.0, 100.0);
    pct / 100.0 * 180.0 - 90.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageBand {
    Low,
    Medium,
    High,
}

impl CoverageBand {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage < 40.0 {
            CoverageBand::Low
        } else if percentage < 75.0 {
            CoverageBand::Medium
        } else {
            CoverageBand::High
        }
    }
}

impl fmt::Display for CoverageBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageBand::Low => write!(f, "low"),
            CoverageBand::Medium => write!(f, "medium"),
            CoverageBand::High => write!(f, "high"),
        }
    }
}
