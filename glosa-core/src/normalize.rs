//! Boundary normalization for the analysis collaborator
//!
//! The analysis service emits loosely-shaped JSON: the same concept arrives
//! under several alternate field names, and items it could not analyze may
//! carry a nested validation fault instead of flat fields. Everything is
//! normalized once, here, into a single shape; nothing downstream branches
//! on wire variants.

use crate::correction::CorrectionProposal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validation fault reported by the upstream validator, sent back to the
/// analysis collaborator verbatim. Wire names are the validator's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFault {
    #[serde(rename = "Clase")]
    pub class: String,
    #[serde(rename = "Codigo")]
    pub code: String,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Fuente", default)]
    pub source: String,
    #[serde(rename = "Observaciones", default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(rename = "PathFuente", default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

/// An error the analysis collaborator could not turn into a proposal; the
/// operator resolves it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualReviewItem {
    pub error_code: String,
    pub error_description: String,
    pub reason: String,
}

/// Normalized result of one analysis round.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub proposals: Vec<CorrectionProposal>,
    pub manual_review: Vec<ManualReviewItem>,
}

/// Normalize a raw analysis response body.
///
/// Proposals lacking both a JSON and an XML path are valid input but have
/// no machine-resolvable location; they are moved to the manual-review
/// list rather than erroring or being silently dropped.
pub fn normalize_analysis(body: &Value) -> crate::Result<AnalysisOutcome> {
    let proposals: Vec<CorrectionProposal> = match body.get("propuestas") {
        Some(raw) => serde_json::from_value(raw.clone())?,
        None => Vec::new(),
    };

    let mut manual_review: Vec<ManualReviewItem> = body
        .get("requieren_revision_manual")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_review_item).collect())
        .unwrap_or_default();

    let (located, unlocated): (Vec<_>, Vec<_>) =
        proposals.into_iter().partition(CorrectionProposal::has_location);

    for proposal in unlocated {
        manual_review.push(ManualReviewItem {
            error_code: proposal.error_code,
            error_description: proposal.error_description,
            reason: "proposal has no resolvable document location".to_string(),
        });
    }

    Ok(AnalysisOutcome {
        proposals: located,
        manual_review,
    })
}

/// Collapse the alternate wire shapes for one review item.
fn normalize_review_item(item: &Value) -> ManualReviewItem {
    let nested = item.get("error");
    let error_code = pick_str(item, &["codigo", "error_codigo"])
        .or_else(|| nested.and_then(|e| pick_str(e, &["Codigo", "codigo"])))
        .unwrap_or_default();
    let error_description = pick_str(item, &["descripcion", "error_descripcion"])
        .or_else(|| nested.and_then(|e| pick_str(e, &["Descripcion", "descripcion"])))
        .unwrap_or_default();
    let reason = pick_str(item, &["razon", "motivo"])
        .unwrap_or_else(|| "Requiere corrección manual".to_string());

    ManualReviewItem {
        error_code,
        error_description,
        reason,
    }
}

fn pick_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(key))
        .and_then(Value::as_str)
        .map(String::from)
}
