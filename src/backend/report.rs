//! Typed QC report payload as produced by the analysis backend.
//!
//! The report is written to object storage by the compute job and served by
//! the results endpoint once the job status reads `Succeeded`. Every section
//! beyond the filename is optional so partially-written or older reports
//! still deserialize.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// A finished QC report for one sequence file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcReport {
    /// Name of the analyzed file, echoed back by the pipeline.
    pub filename: String,
    /// Pass/warn/fail verdict per analysis module.
    #[serde(default)]
    pub summary: Vec<ModuleSummary>,
    /// Headline statistics for the whole file.
    #[serde(default)]
    pub basic_stats: Option<BasicStats>,
    /// Per-module data series for charting.
    #[serde(default)]
    pub report_modules: ReportModules,
}

/// Verdict for a single analysis module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module: String,
    pub status: ModuleStatus,
}

/// Traffic-light verdict emitted by the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Pass,
    Warn,
    Fail,
}

/// Headline statistics section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    #[serde(default)]
    pub total_sequences: Option<u64>,
    /// Read length or length range, e.g. `"151"` or `"35-76"`.
    #[serde(default)]
    pub sequence_length: Option<String>,
    /// Mean GC content in percent.
    #[serde(default)]
    pub gc_content: Option<f64>,
    /// Detected quality encoding, e.g. `"Sanger / Illumina 1.9"`.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Chartable data series, keyed by analysis module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportModules {
    /// Mean/median quality score per base position.
    #[serde(default)]
    pub per_base_quality: Option<Vec<QualityPoint>>,
    /// Read-count histogram over GC percentage.
    #[serde(default)]
    pub per_sequence_gc_content: Option<Vec<GcBin>>,
}

/// One point of the per-base quality series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPoint {
    /// 1-based position in the read.
    pub base: u32,
    pub mean: f64,
    #[serde(default)]
    pub median: Option<f64>,
}

/// One bin of the GC-content histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcBin {
    /// GC percentage this bin covers.
    pub gc: u32,
    /// Number of reads falling into the bin.
    pub count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
