use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted admission forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormId(pub String);

impl std::fmt::Display for FormId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// National identity number, the per-applicant secondary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cnic(pub String);

impl std::fmt::Display for Cnic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission lifecycle state of a single application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Pending,
    Appeared,
    NotAppeared,
    Passed,
    Failed,
    Selected,
    Enrolled,
    Approved,
    Revert,
    Trash,
}

/// Error raised when an inbound status string names no known state.
///
/// The source system silently coerced unknown strings to `Pending`; that
/// fallback is replaced with rejection here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown admission status '{0}'")]
pub struct UnknownStatus(pub String);

impl AdmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AdmissionStatus::Pending => "pending",
            AdmissionStatus::Appeared => "appeared",
            AdmissionStatus::NotAppeared => "not_appeared",
            AdmissionStatus::Passed => "passed",
            AdmissionStatus::Failed => "failed",
            AdmissionStatus::Selected => "selected",
            AdmissionStatus::Enrolled => "enrolled",
            AdmissionStatus::Approved => "approved",
            AdmissionStatus::Revert => "revert",
            AdmissionStatus::Trash => "trash",
        }
    }

    /// Parse a staff-supplied status string, trimming and case-folding first.
    pub fn parse(raw: &str) -> Result<Self, UnknownStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "appeared" => Ok(Self::Appeared),
            "not_appeared" | "not appeared" => Ok(Self::NotAppeared),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "selected" => Ok(Self::Selected),
            "enrolled" => Ok(Self::Enrolled),
            "approved" => Ok(Self::Approved),
            "revert" => Ok(Self::Revert),
            "trash" => Ok(Self::Trash),
            _ => Err(UnknownStatus(raw.trim().to_string())),
        }
    }
}

/// Fee ledger state mirrored onto the admission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Paid,
    Unpaid,
}

impl FeeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FeeStatus::Paid => "paid",
            FeeStatus::Unpaid => "unpaid",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, UnknownStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            _ => Err(UnknownStatus(raw.trim().to_string())),
        }
    }
}

/// Entry-test result stored alongside the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryTestMarks {
    pub obtained: u32,
    pub total: u32,
    pub percentage: f64,
}

impl EntryTestMarks {
    /// Build a marks entry, deriving the percentage rounded to two decimals.
    pub fn new(obtained: u32, total: u32) -> Self {
        let percentage = (obtained as f64 / total as f64 * 10_000.0).round() / 100.0;
        Self {
            obtained,
            total,
            percentage,
        }
    }
}

/// Applicant data captured when a form is first submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub cnic: Cnic,
    pub full_name: String,
}

/// Optional data accompanying a transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    pub remarks: Option<String>,
}

impl TransitionPayload {
    pub fn with_remarks(remarks: impl Into<String>) -> Self {
        Self {
            remarks: Some(remarks.into()),
        }
    }

    /// Remarks with surrounding whitespace stripped; `None` when effectively empty.
    pub fn trimmed_remarks(&self) -> Option<&str> {
        self.remarks
            .as_deref()
            .map(str::trim)
            .filter(|remarks| !remarks.is_empty())
    }
}

/// Append-only audit entry recording one applied status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub form_id: FormId,
    pub from_status: AdmissionStatus,
    pub to_status: AdmissionStatus,
    pub actor: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}
