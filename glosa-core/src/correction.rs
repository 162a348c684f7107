//! Correction decision engine
//!
//! Tracks a tri-state decision per machine-proposed correction, a separate
//! operator-authored list of manual corrections, and assembles the final
//! ordered change set handed to the patch collaborator. All state is owned
//! by one reviewing session; nothing here touches the documents themselves.

use crate::error::GlosaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One machine-proposed field correction, as produced by the analysis
/// collaborator. Wire names are the collaborator's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionProposal {
    #[serde(rename = "error_codigo")]
    pub error_code: String,
    #[serde(rename = "error_descripcion")]
    pub error_description: String,
    #[serde(rename = "campo")]
    pub field_label: String,
    #[serde(rename = "ruta_json", default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(rename = "ruta_xml", default, skip_serializing_if = "Option::is_none")]
    pub xml_path: Option<String>,
    #[serde(rename = "valor_actual", default)]
    pub current_value: Value,
    #[serde(rename = "valor_propuesto", default)]
    pub proposed_value: Value,
    #[serde(rename = "justificacion", default)]
    pub justification: String,
}

impl CorrectionProposal {
    /// Proposals with no resolvable location require manual handling.
    pub fn has_location(&self) -> bool {
        self.json_path.is_some() || self.xml_path.is_some()
    }
}

/// Operator verdict on one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Which document a manual correction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Json,
    Xml,
}

/// An operator-authored correction. Never overwritten by machine
/// proposals; survives analysis rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualCorrection {
    pub field_label: String,
    pub target_format: TargetFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_path: Option<String>,
    #[serde(default)]
    pub current_value_text: String,
    pub new_value_text: String,
    #[serde(default)]
    pub justification: String,
}

impl ManualCorrection {
    fn validate(&self) -> crate::Result<()> {
        if self.field_label.trim().is_empty() {
            return Err(invalid("field label is required"));
        }
        if self.new_value_text.trim().is_empty() {
            return Err(invalid("new value is required"));
        }
        match self.target_format {
            TargetFormat::Json => {
                if self.json_path.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(invalid("a JSON path is required for a JSON correction"));
                }
            }
            TargetFormat::Xml => {
                if self.xml_path.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(invalid("an XML path is required for an XML correction"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> GlosaError {
    GlosaError::InvalidManualCorrection(message.to_string())
}

/// One unit of the assembled change set. Exactly one path field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    #[serde(rename = "ruta_json", default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(rename = "ruta_xml", default, skip_serializing_if = "Option::is_none")]
    pub xml_path: Option<String>,
    #[serde(rename = "valor_nuevo")]
    pub new_value: Value,
}

/// Display counters. `approved + rejected + pending == total` always;
/// `aggregate_approved` gates whether there is anything to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionCounts {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub manual: usize,
    pub aggregate_approved: usize,
}

/// Per-review-cycle decision state.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSession {
    proposals: Vec<CorrectionProposal>,
    decisions: Vec<Decision>,
    edited_values: Vec<Value>,
    manual_corrections: Vec<ManualCorrection>,
}

impl CorrectionSession {
    pub fn new(proposals: Vec<CorrectionProposal>) -> Self {
        let decisions = vec![Decision::Pending; proposals.len()];
        let edited_values = proposals.iter().map(|p| p.proposed_value.clone()).collect();
        Self {
            proposals,
            decisions,
            edited_values,
            manual_corrections: Vec::new(),
        }
    }

    pub fn proposals(&self) -> &[CorrectionProposal] {
        &self.proposals
    }

    pub fn decision(&self, index: usize) -> Option<Decision> {
        self.decisions.get(index).copied()
    }

    /// Current (possibly operator-edited) value for a proposal.
    pub fn edited_value(&self, index: usize) -> Option<&Value> {
        self.edited_values.get(index)
    }

    /// Out-of-range indexes are a no-op; re-approving is idempotent.
    pub fn approve(&mut self, index: usize) {
        if let Some(decision) = self.decisions.get_mut(index) {
            *decision = Decision::Approved;
        }
    }

    pub fn reject(&mut self, index: usize) {
        if let Some(decision) = self.decisions.get_mut(index) {
            *decision = Decision::Rejected;
        }
    }

    /// Allowed in any decision state. A rejected proposal's edited value is
    /// still excluded from the assembled change set.
    pub fn edit_proposed_value(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.edited_values.get_mut(index) {
            *slot = value;
        }
    }

    /// Boundary validation; invalid entries are rejected, never stored.
    pub fn add_manual_correction(&mut self, entry: ManualCorrection) -> crate::Result<()> {
        entry.validate()?;
        self.manual_corrections.push(entry);
        Ok(())
    }

    pub fn remove_manual_correction(&mut self, index: usize) {
        if index < self.manual_corrections.len() {
            self.manual_corrections.remove(index);
        }
    }

    pub fn manual_corrections(&self) -> &[ManualCorrection] {
        &self.manual_corrections
    }

    /// Start a new analysis round: decisions and edited values are
    /// reinitialized, manual corrections survive.
    pub fn replace_proposals(&mut self, proposals: Vec<CorrectionProposal>) {
        self.decisions = vec![Decision::Pending; proposals.len()];
        self.edited_values = proposals.iter().map(|p| p.proposed_value.clone()).collect();
        self.proposals = proposals;
    }

    pub fn counts(&self) -> DecisionCounts {
        let approved = self
            .decisions
            .iter()
            .filter(|d| **d == Decision::Approved)
            .count();
        let rejected = self
            .decisions
            .iter()
            .filter(|d| **d == Decision::Rejected)
            .count();
        let total = self.proposals.len();
        let manual = self.manual_corrections.len();
        DecisionCounts {
            total,
            approved,
            rejected,
            pending: total - approved - rejected,
            manual,
            aggregate_approved: approved + manual,
        }
    }

    pub fn is_submittable(&self) -> bool {
        self.counts().aggregate_approved > 0
    }

    /// Assemble the ordered change set: approved proposals in original
    /// proposal order (with the edited value, not the original proposed
    /// one), then manual corrections in creation order. Pending and
    /// rejected proposals contribute nothing, and neither does an approved
    /// proposal with no resolvable location.
    pub fn assemble_change_set(&self) -> Vec<ChangeEntry> {
        let mut changes = Vec::new();

        for (index, proposal) in self.proposals.iter().enumerate() {
            if self.decisions[index] != Decision::Approved {
                continue;
            }
            let new_value = self.edited_values[index].clone();
            if let Some(json_path) = &proposal.json_path {
                changes.push(ChangeEntry {
                    json_path: Some(json_path.clone()),
                    xml_path: None,
                    new_value,
                });
            } else if let Some(xml_path) = &proposal.xml_path {
                changes.push(ChangeEntry {
                    json_path: None,
                    xml_path: Some(xml_path.clone()),
                    new_value,
                });
            }
        }

        for manual in &self.manual_corrections {
            let new_value = Value::String(manual.new_value_text.clone());
            match manual.target_format {
                TargetFormat::Json => changes.push(ChangeEntry {
                    json_path: manual.json_path.clone(),
                    xml_path: None,
                    new_value,
                }),
                TargetFormat::Xml => changes.push(ChangeEntry {
                    json_path: None,
                    xml_path: manual.xml_path.clone(),
                    new_value,
                }),
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proposal(json_path: Option<&str>, xml_path: Option<&str>, proposed: Value) -> CorrectionProposal {
        CorrectionProposal {
            error_code: "RVC044".to_string(),
            error_description: "Tipo de usuario no corresponde".to_string(),
            field_label: "tipoUsuario".to_string(),
            json_path: json_path.map(String::from),
            xml_path: xml_path.map(String::from),
            current_value: json!("01"),
            proposed_value: proposed,
            justification: "Coincide con el régimen del afiliado".to_string(),
        }
    }

    fn manual_xml(field: &str, path: &str, value: &str) -> ManualCorrection {
        ManualCorrection {
            field_label: field.to_string(),
            target_format: TargetFormat::Xml,
            json_path: None,
            xml_path: Some(path.to_string()),
            current_value_text: String::new(),
            new_value_text: value.to_string(),
            justification: String::new(),
        }
    }

    #[test]
    fn test_approve_then_assemble() {
        let mut session = CorrectionSession::new(vec![proposal(
            Some("usuarios[0].tipoUsuario"),
            None,
            json!("02"),
        )]);
        session.approve(0);
        let changes = session.assemble_change_set();
        assert_eq!(
            changes,
            vec![ChangeEntry {
                json_path: Some("usuarios[0].tipoUsuario".to_string()),
                xml_path: None,
                new_value: json!("02"),
            }]
        );
    }

    #[test]
    fn test_reject_excludes_from_change_set() {
        let mut session = CorrectionSession::new(vec![proposal(
            Some("usuarios[0].tipoUsuario"),
            None,
            json!("02"),
        )]);
        session.reject(0);
        assert!(session.assemble_change_set().is_empty());
        // An edit on a rejected proposal stays excluded.
        session.edit_proposed_value(0, json!("03"));
        assert!(session.assemble_change_set().is_empty());
    }

    #[test]
    fn test_edited_value_wins_over_proposed() {
        let mut session = CorrectionSession::new(vec![proposal(
            Some("usuarios[0].tipoUsuario"),
            None,
            json!("02"),
        )]);
        session.edit_proposed_value(0, json!("05"));
        session.approve(0);
        assert_eq!(session.assemble_change_set()[0].new_value, json!("05"));
    }

    #[test]
    fn test_manual_correction_appears_verbatim_without_approvals() {
        let mut session = CorrectionSession::new(Vec::new());
        session
            .add_manual_correction(manual_xml(
                "NIT",
                "Party/PartyTaxScheme/CompanyID",
                "900123456",
            ))
            .unwrap();
        let changes = session.assemble_change_set();
        assert_eq!(
            changes,
            vec![ChangeEntry {
                json_path: None,
                xml_path: Some("Party/PartyTaxScheme/CompanyID".to_string()),
                new_value: json!("900123456"),
            }]
        );
        assert!(session.is_submittable());
    }

    #[test]
    fn test_change_set_order_is_proposals_then_manual() {
        let mut session = CorrectionSession::new(vec![
            proposal(Some("usuarios[0].tipoUsuario"), None, json!("02")),
            proposal(None, Some("Invoice/cbc:ID"), json!("SETP990011")),
        ]);
        session
            .add_manual_correction(manual_xml("NIT", "Party/CompanyID", "900123456"))
            .unwrap();
        session.approve(1);
        session.approve(0);

        let changes = session.assemble_change_set();
        assert_eq!(changes.len(), 3);
        // Approval order does not matter: original proposal order does.
        assert_eq!(changes[0].json_path.as_deref(), Some("usuarios[0].tipoUsuario"));
        assert_eq!(changes[1].xml_path.as_deref(), Some("Invoice/cbc:ID"));
        assert_eq!(changes[2].xml_path.as_deref(), Some("Party/CompanyID"));
    }

    #[test]
    fn test_counts_invariant_holds_under_any_sequence() {
        let mut session = CorrectionSession::new(vec![
            proposal(Some("a"), None, json!(1)),
            proposal(Some("b"), None, json!(2)),
            proposal(Some("c"), None, json!(3)),
        ]);
        let steps: Vec<(&str, usize)> = vec![
            ("approve", 0),
            ("reject", 1),
            ("approve", 1),
            ("approve", 0), // idempotent re-approve
            ("reject", 2),
            ("approve", 99), // out of range: no-op
            ("edit", 2),
        ];
        for (op, index) in steps {
            match op {
                "approve" => session.approve(index),
                "reject" => session.reject(index),
                _ => session.edit_proposed_value(index, json!("edited")),
            }
            let counts = session.counts();
            assert_eq!(counts.approved + counts.rejected + counts.pending, counts.total);
            assert_eq!(counts.aggregate_approved, counts.approved + counts.manual);
        }
        assert_eq!(session.counts().approved, 2);
        assert_eq!(session.counts().rejected, 1);
    }

    #[test]
    fn test_invalid_manual_corrections_rejected_at_boundary() {
        let mut session = CorrectionSession::new(Vec::new());

        let mut entry = manual_xml("NIT", "Party/CompanyID", "900123456");
        entry.field_label = String::new();
        assert!(session.add_manual_correction(entry).is_err());

        let mut entry = manual_xml("NIT", "Party/CompanyID", "900123456");
        entry.new_value_text = "  ".to_string();
        assert!(session.add_manual_correction(entry).is_err());

        // Wrong path for the target format.
        let entry = ManualCorrection {
            field_label: "tipoUsuario".to_string(),
            target_format: TargetFormat::Json,
            json_path: None,
            xml_path: Some("Invoice/cbc:ID".to_string()),
            current_value_text: String::new(),
            new_value_text: "02".to_string(),
            justification: String::new(),
        };
        assert!(session.add_manual_correction(entry).is_err());

        // Nothing partial was stored.
        assert!(session.manual_corrections().is_empty());
    }

    #[test]
    fn test_remove_manual_correction() {
        let mut session = CorrectionSession::new(Vec::new());
        session
            .add_manual_correction(manual_xml("A", "r/a", "1"))
            .unwrap();
        session
            .add_manual_correction(manual_xml("B", "r/b", "2"))
            .unwrap();
        session.remove_manual_correction(0);
        assert_eq!(session.manual_corrections().len(), 1);
        assert_eq!(session.manual_corrections()[0].field_label, "B");
        // Out of range: no-op.
        session.remove_manual_correction(7);
        assert_eq!(session.manual_corrections().len(), 1);
    }

    #[test]
    fn test_replace_proposals_resets_decisions_keeps_manual() {
        let mut session = CorrectionSession::new(vec![proposal(Some("a"), None, json!("02"))]);
        session.approve(0);
        session.edit_proposed_value(0, json!("99"));
        session
            .add_manual_correction(manual_xml("NIT", "Party/CompanyID", "900123456"))
            .unwrap();

        session.replace_proposals(vec![
            proposal(Some("a"), None, json!("02")),
            proposal(Some("b"), None, json!("03")),
        ]);

        assert_eq!(session.decision(0), Some(Decision::Pending));
        assert_eq!(session.decision(1), Some(Decision::Pending));
        assert_eq!(session.edited_value(0), Some(&json!("02")));
        assert_eq!(session.manual_corrections().len(), 1);
    }

    #[test]
    fn test_approved_proposal_without_location_contributes_nothing() {
        let mut session = CorrectionSession::new(vec![proposal(None, None, json!("02"))]);
        assert!(!session.proposals()[0].has_location());
        session.approve(0);
        assert!(session.assemble_change_set().is_empty());
    }

    #[test]
    fn test_change_entry_wire_names() {
        let entry = ChangeEntry {
            json_path: Some("usuarios[0].tipoUsuario".to_string()),
            xml_path: None,
            new_value: json!("02"),
        };
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            wire,
            json!({"ruta_json": "usuarios[0].tipoUsuario", "valor_nuevo": "02"})
        );
    }
}
