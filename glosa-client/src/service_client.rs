//! HTTP client for the correction service
//!
//! Two endpoints, one wire contract: `POST {base}/analizar` turns
//! validation faults into correction proposals, `POST {base}/aplicar`
//! applies an assembled change set and returns the corrected documents.
//! Path strings travel through both calls byte-exact.

use glosa_core::correction::ChangeEntry;
use glosa_core::normalize::{normalize_analysis, AnalysisOutcome, ValidationFault};
use glosa_core::GlosaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct CorrectionClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    errores: &'a [ValidationFault],
    xml_content: &'a str,
    rips_json: &'a Value,
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    cambios: &'a [ChangeEntry],
    xml_original: &'a str,
    rips_json_original: &'a Value,
}

/// Corrected documents returned by the patch collaborator. This response
/// is the sole source of truth for the next review cycle; the client never
/// applies changes locally.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectedDocuments {
    #[serde(rename = "xml_corregido")]
    pub xml_text: String,
    #[serde(rename = "rips_json_corregido")]
    pub rips_json: Value,
    #[serde(rename = "cambios_aplicados")]
    pub changes_applied: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

impl CorrectionClient {
    pub fn new(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GlosaError::ServiceError {
                code: "client_init".to_string(),
                message: e.to_string(),
                hint: "Check TLS and proxy settings".to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Ask the analysis collaborator for correction proposals.
    ///
    /// The raw body is normalized at this boundary; callers only ever see
    /// the single [`AnalysisOutcome`] shape.
    pub fn analyze(
        &self,
        faults: &[ValidationFault],
        xml_text: &str,
        rips_json: &Value,
    ) -> crate::Result<AnalysisOutcome> {
        let url = format!("{}/analizar", self.base_url);
        debug!(faults = faults.len(), url = %url, "requesting correction analysis");
        let req = AnalyzeRequest {
            errores: faults,
            xml_content: xml_text,
            rips_json,
        };
        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .map_err(connection_error)?;

        if !resp.status().is_success() {
            return Err(self.handle_error(resp));
        }

        let body: Value = resp.json().map_err(parse_error)?;
        let outcome = normalize_analysis(&body)?;
        debug!(
            proposals = outcome.proposals.len(),
            manual_review = outcome.manual_review.len(),
            "analysis normalized"
        );
        Ok(outcome)
    }

    /// Hand the assembled change set to the patch collaborator.
    pub fn apply(
        &self,
        changes: &[ChangeEntry],
        xml_text: &str,
        rips_json: &Value,
    ) -> crate::Result<CorrectedDocuments> {
        let url = format!("{}/aplicar", self.base_url);
        debug!(changes = changes.len(), url = %url, "submitting change set");
        let req = ApplyRequest {
            cambios: changes,
            xml_original: xml_text,
            rips_json_original: rips_json,
        };
        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .map_err(connection_error)?;

        if !resp.status().is_success() {
            return Err(self.handle_error(resp));
        }

        resp.json::<CorrectedDocuments>().map_err(parse_error)
    }

    fn handle_error(&self, resp: reqwest::blocking::Response) -> GlosaError {
        let status = resp.status();
        let detail = resp
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.detail)
            .map(|detail| match detail {
                Value::String(s) => s,
                other => other.to_string(),
            });
        GlosaError::ServiceError {
            code: format!("http_{}", status.as_u16()),
            message: detail.unwrap_or_else(|| format!("HTTP {} from service", status)),
            hint: "Check the correction service logs".to_string(),
        }
    }
}

fn connection_error(e: reqwest::Error) -> GlosaError {
    GlosaError::ServiceError {
        code: "connection_error".to_string(),
        message: e.to_string(),
        hint: "Is the correction service running?".to_string(),
    }
}

fn parse_error(e: reqwest::Error) -> GlosaError {
    GlosaError::ServiceError {
        code: "parse_error".to_string(),
        message: e.to_string(),
        hint: "Unexpected response from service".to_string(),
    }
}

/// Check if a service error has a specific error code
pub fn is_error_code(err: &GlosaError, code: &str) -> bool {
    matches!(err, GlosaError::ServiceError { code: c, .. } if c == code)
}
