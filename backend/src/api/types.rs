//! REST API types.
//!
//! Per-row `flags` are aligned with the uploaded rows so a client can
//! highlight duplicates without re-implementing the rules.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::dedup::pipeline::{CoreOutcome, DedupRun, ExactOutcome, TableInfo};
use crate::dedup::report::{CoreReport, ExactReport};
use crate::models::Table;

/// Response to `POST /api/check`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Unique job identifier
    pub job_id: String,
    /// "clean" or "duplicates"
    pub status: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub table: TableInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<ExactSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core: Option<CoreSection>,
}

/// Exact-rule part of the response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSection {
    pub summary: String,
    #[serde(flatten)]
    pub report: ExactReport,
    pub flags: Vec<bool>,
    pub cleaned: Table,
}

/// Core-rule part of the response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSection {
    pub summary: String,
    #[serde(flatten)]
    pub report: CoreReport,
    pub flags: Vec<bool>,
}

impl From<ExactOutcome> for ExactSection {
    fn from(outcome: ExactOutcome) -> Self {
        Self {
            summary: outcome.report.summary(),
            report: outcome.report,
            flags: outcome.flags,
            cleaned: outcome.cleaned,
        }
    }
}

impl From<CoreOutcome> for CoreSection {
    fn from(outcome: CoreOutcome) -> Self {
        Self {
            summary: outcome.report.summary(),
            report: outcome.report,
            flags: outcome.flags,
        }
    }
}

impl From<DedupRun> for CheckResponse {
    fn from(run: DedupRun) -> Self {
        let status = if run.outcome.is_clean() { "clean" } else { "duplicates" };

        CheckResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            table: run.table_info,
            exact: run.outcome.exact.map(ExactSection::from),
            core: run.outcome.core.map(CoreSection::from),
        }
    }
}

/// Multipart form fields other than the file.
#[derive(Debug, Clone, Default)]
pub struct CheckParams {
    pub rules: Option<String>,
    pub delimiter: Option<char>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// Error response naming missing columns.
pub fn schema_error_response(error: &str, missing: &[String]) -> Value {
    let mut body = error_response(error);
    body["missingColumns"] = json!(missing);
    body
}
