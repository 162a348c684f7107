//! One review cycle over a pair of coupled documents
//!
//! Owns the current document snapshot and the decision state together so
//! callers cannot desynchronize them. Submission is all-or-nothing: only a
//! successful patch response swaps the snapshot, so a failed call leaves
//! every decision and manual correction in place for retry.

use crate::service_client::CorrectionClient;
use glosa_core::correction::{CorrectionSession, ManualCorrection};
use glosa_core::normalize::{ManualReviewItem, ValidationFault};
use glosa_core::GlosaError;
use serde_json::Value;
use tracing::info;

pub struct ReviewCycle {
    xml_text: String,
    rips_json: Value,
    session: CorrectionSession,
    manual_review: Vec<ManualReviewItem>,
    rounds: usize,
}

impl ReviewCycle {
    pub fn new(xml_text: String, rips_json: Value) -> Self {
        Self {
            xml_text,
            rips_json,
            session: CorrectionSession::new(Vec::new()),
            manual_review: Vec::new(),
            rounds: 0,
        }
    }

    /// Current XML snapshot (re-parse after every submission).
    pub fn xml_text(&self) -> &str {
        &self.xml_text
    }

    pub fn rips_json(&self) -> &Value {
        &self.rips_json
    }

    pub fn session(&self) -> &CorrectionSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CorrectionSession {
        &mut self.session
    }

    pub fn manual_review(&self) -> &[ManualReviewItem] {
        &self.manual_review
    }

    /// Analysis rounds completed so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Show validator faults directly as manual-review items, without
    /// consulting the analysis collaborator.
    pub fn review_without_analysis(&mut self, faults: &[ValidationFault]) {
        self.session.replace_proposals(Vec::new());
        self.manual_review = faults
            .iter()
            .map(|fault| ManualReviewItem {
                error_code: fault.code.clone(),
                error_description: fault.description.clone(),
                reason: "Requiere corrección manual".to_string(),
            })
            .collect();
        self.rounds += 1;
    }

    /// Run one analysis round. Decisions and edited values reset for the
    /// new proposal list; manual corrections survive.
    pub fn analyze(
        &mut self,
        client: &CorrectionClient,
        faults: &[ValidationFault],
    ) -> crate::Result<()> {
        let outcome = client.analyze(faults, &self.xml_text, &self.rips_json)?;
        self.session.replace_proposals(outcome.proposals);
        self.manual_review = outcome.manual_review;
        self.rounds += 1;
        info!(
            round = self.rounds,
            proposals = self.session.proposals().len(),
            manual_review = self.manual_review.len(),
            "analysis round complete"
        );
        Ok(())
    }

    pub fn add_manual_correction(&mut self, entry: ManualCorrection) -> crate::Result<()> {
        self.session.add_manual_correction(entry)
    }

    /// Submit the assembled change set and, on success, adopt the
    /// corrected documents as the next snapshot with a fresh session.
    ///
    /// Returns the number of changes the collaborator reports applied.
    pub fn submit(&mut self, client: &CorrectionClient) -> crate::Result<usize> {
        let changes = self.session.assemble_change_set();
        if changes.is_empty() {
            return Err(GlosaError::EmptyChangeSet);
        }

        let corrected = client.apply(&changes, &self.xml_text, &self.rips_json)?;

        // Only now: swap the snapshot. The submitted corrections have been
        // consumed, so the session starts over.
        self.xml_text = corrected.xml_text;
        self.rips_json = corrected.rips_json;
        self.session = CorrectionSession::new(Vec::new());
        self.manual_review.clear();
        info!(applied = corrected.changes_applied, "change set applied");
        Ok(corrected.changes_applied)
    }
}
