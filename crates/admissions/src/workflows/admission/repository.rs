use serde::{Deserialize, Serialize};

use super::domain::{
    AdmissionStatus, Cnic, EntryTestMarks, FeeStatus, FormId, StatusTransition,
};

/// Repository record for one admission form.
///
/// `version` is the optimistic-concurrency counter: every write is a
/// compare-and-swap against the version the writer read. Records are never
/// physically deleted; `Trash` is a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    pub form_id: FormId,
    pub cnic: Cnic,
    pub full_name: String,
    pub status: AdmissionStatus,
    pub entry_test_marks: Option<EntryTestMarks>,
    pub final_percentage: Option<f64>,
    pub merit_list: Option<String>,
    pub department: Option<String>,
    pub fee_status: FeeStatus,
    pub version: u64,
}

impl AdmissionRecord {
    /// Fresh record in the initial state, as created at submission time.
    pub fn new(form_id: FormId, cnic: Cnic, full_name: String) -> Self {
        Self {
            form_id,
            cnic,
            full_name,
            status: AdmissionStatus::Pending,
            entry_test_marks: None,
            final_percentage: None,
            merit_list: None,
            department: None,
            fee_status: FeeStatus::Unpaid,
            version: 0,
        }
    }

    pub fn status_view(&self) -> AdmissionRecordView {
        AdmissionRecordView {
            form_id: self.form_id.clone(),
            cnic: self.cnic.clone(),
            full_name: self.full_name.clone(),
            status: self.status.label(),
            fee_status: self.fee_status.label(),
            entry_test_percentage: self.entry_test_marks.map(|marks| marks.percentage),
            final_percentage: self.final_percentage,
            merit_list: self.merit_list.clone(),
            department: self.department.clone(),
        }
    }
}

/// Sanitized representation of a record for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionRecordView {
    pub form_id: FormId,
    pub cnic: Cnic,
    pub full_name: String,
    pub status: &'static str,
    pub fee_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_test_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merit_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` takes the version the caller read and must refuse the write when
/// the stored version has moved on, surfacing `VersionMismatch`.
/// `upsert_marks_by_applicant` is the secondary key path retained from the
/// source system, where marks entry is keyed by cnic rather than form id.
pub trait AdmissionRepository: Send + Sync {
    fn insert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError>;
    fn fetch(&self, id: &FormId) -> Result<Option<AdmissionRecord>, RepositoryError>;
    fn update(
        &self,
        record: AdmissionRecord,
        expected_version: u64,
    ) -> Result<AdmissionRecord, RepositoryError>;
    fn upsert_marks_by_applicant(
        &self,
        cnic: &Cnic,
        marks: EntryTestMarks,
    ) -> Result<AdmissionRecord, RepositoryError>;
    fn list_by_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<AdmissionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified by a concurrent write")]
    VersionMismatch,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Append-only sink for status-transition audit entries.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: StatusTransition) -> Result<(), AuditError>;
    fn trail(&self, form_id: &FormId) -> Result<Vec<StatusTransition>, AuditError>;
}

/// Audit persistence error.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}
