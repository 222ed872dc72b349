use apitester_scanner::{ApiType, ProbeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful probes, 0 for an empty scan
    pub success_rate: f64,
    pub type_distribution: BTreeMap<ApiType, usize>,
}

impl ScanStatistics {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();

        let mut type_distribution = BTreeMap::new();
        for result in results {
            *type_distribution.entry(result.api_type).or_insert(0) += 1;
        }

        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };

        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
            type_distribution,
        }
    }
}
