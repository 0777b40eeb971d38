use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    AdmissionStatus, ApplicationSubmission, EntryTestMarks, FeeStatus, FormId, StatusTransition,
    TransitionPayload, UnknownStatus,
};
use super::policy::AdmissionPolicy;
use super::repository::{
    AdmissionRecord, AdmissionRepository, AuditError, AuditSink, RepositoryError,
};
use super::transitions::{check_payload, permits, MissingPayload};

/// Service composing the status machine, record store, and audit sink.
///
/// Status never changes except through [`AdmissionService::request_transition`];
/// every write is a compare-and-swap on the version the service read, so two
/// racing requests on one record resolve to exactly one winner.
pub struct AdmissionService<R, S> {
    repository: Arc<R>,
    audit: Arc<S>,
    policy: AdmissionPolicy,
}

static FORM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_form_id() -> FormId {
    let id = FORM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FormId(format!("form-{id:06}"))
}

impl<R, S> AdmissionService<R, S>
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<S>, policy: AdmissionPolicy) -> Self {
        Self {
            repository,
            audit,
            policy,
        }
    }

    /// Register a new application form in the initial `Pending` state.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        if submission.cnic.0.trim().is_empty() {
            return Err(ValidationError::EmptyCnic.into());
        }
        if submission.full_name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let record = AdmissionRecord::new(
            next_form_id(),
            submission.cnic,
            submission.full_name.trim().to_string(),
        );

        match self.repository.insert(record) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(AdmissionServiceError::Conflict {
                detail: "an application already exists for this cnic".to_string(),
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Apply a status transition after validating it against the machine.
    ///
    /// Fetch, guard, and write happen against one record version; a lost race
    /// surfaces as [`AdmissionServiceError::Conflict`] rather than a silent
    /// double-transition.
    pub fn request_transition(
        &self,
        form_id: &FormId,
        target: AdmissionStatus,
        payload: TransitionPayload,
        actor: &str,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        let record = self.fetch_required(form_id)?;
        let from = record.status;

        if !permits(from, target) {
            return Err(AdmissionServiceError::IllegalTransition { from, to: target });
        }
        check_payload(&record, target, &payload)?;

        let expected_version = record.version;
        let mut updated = record;
        updated.status = target;

        let stored = match self.repository.update(updated, expected_version) {
            Ok(stored) => stored,
            Err(RepositoryError::VersionMismatch) => {
                return Err(AdmissionServiceError::Conflict {
                    detail: "record was changed by a concurrent transition".to_string(),
                })
            }
            Err(RepositoryError::NotFound) => {
                return Err(AdmissionServiceError::NotFound(form_id.clone()))
            }
            Err(other) => return Err(other.into()),
        };

        self.audit.append(StatusTransition {
            form_id: form_id.clone(),
            from_status: from,
            to_status: target,
            actor: actor.to_string(),
            at: Utc::now(),
            remarks: payload.trimmed_remarks().map(str::to_string),
        })?;

        Ok(stored)
    }

    /// Record entry-test marks; does not change status.
    ///
    /// The write goes through the repository's applicant-key path, the
    /// secondary key the source system used for marks entry.
    pub fn record_entry_test_marks(
        &self,
        form_id: &FormId,
        obtained: u32,
        total: u32,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        if total == 0 {
            return Err(ValidationError::ZeroTotalMarks.into());
        }
        if obtained > total {
            return Err(ValidationError::MarksOutOfRange { obtained, total }.into());
        }

        let record = self.fetch_required(form_id)?;
        let marks = EntryTestMarks::new(obtained, total);
        let stored = self
            .repository
            .upsert_marks_by_applicant(&record.cnic, marks)?;
        Ok(stored)
    }

    /// Place an applicant on a merit list and assign a department,
    /// the precondition for the `Selected` transition.
    pub fn assign_merit_and_department(
        &self,
        form_id: &FormId,
        merit_list: &str,
        department: &str,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        let merit_list = merit_list.trim();
        if merit_list.is_empty() {
            return Err(ValidationError::EmptyMeritList.into());
        }
        if !self.policy.permits_department(department) {
            return Err(ValidationError::UnknownDepartment(department.to_string()).into());
        }

        let record = self.fetch_required(form_id)?;
        let expected_version = record.version;
        let mut updated = record;
        updated.merit_list = Some(merit_list.to_string());
        updated.department = Some(department.to_string());
        self.write_versioned(updated, expected_version)
    }

    /// Staff override of the computed percentage.
    pub fn record_final_percentage(
        &self,
        form_id: &FormId,
        percentage: f64,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(ValidationError::PercentageOutOfRange(percentage).into());
        }

        let record = self.fetch_required(form_id)?;
        let expected_version = record.version;
        let mut updated = record;
        updated.final_percentage = Some(percentage);
        self.write_versioned(updated, expected_version)
    }

    /// Flip the fee ledger state; independent of the status machine.
    pub fn update_fee_status(
        &self,
        form_id: &FormId,
        fee_status: FeeStatus,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        let record = self.fetch_required(form_id)?;
        let expected_version = record.version;
        let mut updated = record;
        updated.fee_status = fee_status;
        self.write_versioned(updated, expected_version)
    }

    pub fn get(&self, form_id: &FormId) -> Result<AdmissionRecord, AdmissionServiceError> {
        self.fetch_required(form_id)
    }

    pub fn list_by_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<AdmissionRecord>, AdmissionServiceError> {
        Ok(self.repository.list_by_status(status)?)
    }

    pub fn audit_trail(
        &self,
        form_id: &FormId,
    ) -> Result<Vec<StatusTransition>, AdmissionServiceError> {
        // Resolve the record first so an unknown form id reads as NotFound
        // rather than an empty trail.
        self.fetch_required(form_id)?;
        Ok(self.audit.trail(form_id)?)
    }

    fn fetch_required(&self, form_id: &FormId) -> Result<AdmissionRecord, AdmissionServiceError> {
        self.repository
            .fetch(form_id)?
            .ok_or_else(|| AdmissionServiceError::NotFound(form_id.clone()))
    }

    fn write_versioned(
        &self,
        record: AdmissionRecord,
        expected_version: u64,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        match self.repository.update(record, expected_version) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::VersionMismatch) => Err(AdmissionServiceError::Conflict {
                detail: "record was changed by a concurrent write".to_string(),
            }),
            Err(other) => Err(other.into()),
        }
    }
}

/// Malformed-input failures surfaced to the caller as `validation` errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("cnic must not be empty")]
    EmptyCnic,
    #[error("applicant name must not be empty")]
    EmptyName,
    #[error("total marks must be greater than zero")]
    ZeroTotalMarks,
    #[error("obtained marks {obtained} exceed total {total}")]
    MarksOutOfRange { obtained: u32, total: u32 },
    #[error("merit list tag must not be empty")]
    EmptyMeritList,
    #[error("department '{0}' is not in the allowed set")]
    UnknownDepartment(String),
    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(f64),
}

/// Error raised by the admission service, one variant per caller-visible kind.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error("admission form '{0}' not found")]
    NotFound(FormId),
    #[error("transition from {} to {} is not permitted", .from.label(), .to.label())]
    IllegalTransition {
        from: AdmissionStatus,
        to: AdmissionStatus,
    },
    #[error(transparent)]
    MissingPayload(#[from] MissingPayload),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{detail}")]
    Conflict { detail: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl AdmissionServiceError {
    /// Stable machine-readable discriminator exposed in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionServiceError::NotFound(_) => "not_found",
            AdmissionServiceError::IllegalTransition { .. } => "illegal_transition",
            AdmissionServiceError::MissingPayload(_) => "missing_payload",
            AdmissionServiceError::Validation(_) => "validation",
            AdmissionServiceError::Conflict { .. } => "conflict",
            AdmissionServiceError::Repository(_) | AdmissionServiceError::Audit(_) => "internal",
        }
    }
}
