use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;

use crate::workflows::admission::domain::{
    AdmissionStatus, ApplicationSubmission, Cnic, EntryTestMarks, FormId, StatusTransition,
    TransitionPayload,
};
use crate::workflows::admission::policy::AdmissionPolicy;
use crate::workflows::admission::repository::{
    AdmissionRecord, AdmissionRepository, AuditError, AuditSink, RepositoryError,
};
use crate::workflows::admission::service::AdmissionService;

pub(super) const ACTOR: &str = "registrar.clerk";

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<FormId, AdmissionRecord>>>,
}

impl AdmissionRepository for MemoryRepository {
    fn insert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let duplicate = guard.contains_key(&record.form_id)
            || guard.values().any(|existing| existing.cnic == record.cnic);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.form_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &FormId) -> Result<Option<AdmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        mut record: AdmissionRecord,
        expected_version: u64,
    ) -> Result<AdmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard.get(&record.form_id).ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionMismatch);
        }
        record.version = expected_version + 1;
        guard.insert(record.form_id.clone(), record.clone());
        Ok(record)
    }

    fn upsert_marks_by_applicant(
        &self,
        cnic: &Cnic,
        marks: EntryTestMarks,
    ) -> Result<AdmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard
            .values_mut()
            .find(|record| &record.cnic == cnic)
            .ok_or(RepositoryError::NotFound)?;
        record.entry_test_marks = Some(marks);
        record.version += 1;
        Ok(record.clone())
    }

    fn list_by_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<AdmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    entries: Arc<Mutex<Vec<StatusTransition>>>,
}

impl MemoryAudit {
    pub(super) fn entries(&self) -> Vec<StatusTransition> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn append(&self, entry: StatusTransition) -> Result<(), AuditError> {
        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        guard.push(entry);
        Ok(())
    }

    fn trail(&self, form_id: &FormId) -> Result<Vec<StatusTransition>, AuditError> {
        let guard = self.entries.lock().expect("audit mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| &entry.form_id == form_id)
            .cloned()
            .collect())
    }
}

/// Repository that fails every call, for infrastructure-error tests.
pub(super) struct UnavailableRepository;

impl AdmissionRepository for UnavailableRepository {
    fn insert(&self, _record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("records offline".to_string()))
    }

    fn fetch(&self, _id: &FormId) -> Result<Option<AdmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("records offline".to_string()))
    }

    fn update(
        &self,
        _record: AdmissionRecord,
        _expected_version: u64,
    ) -> Result<AdmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("records offline".to_string()))
    }

    fn upsert_marks_by_applicant(
        &self,
        _cnic: &Cnic,
        _marks: EntryTestMarks,
    ) -> Result<AdmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("records offline".to_string()))
    }

    fn list_by_status(
        &self,
        _status: AdmissionStatus,
    ) -> Result<Vec<AdmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("records offline".to_string()))
    }
}

pub(super) fn submission(cnic: &str, full_name: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        cnic: Cnic(cnic.to_string()),
        full_name: full_name.to_string(),
    }
}

pub(super) fn build_service() -> (
    Arc<AdmissionService<MemoryRepository, MemoryAudit>>,
    MemoryRepository,
    MemoryAudit,
) {
    let repository = MemoryRepository::default();
    let audit = MemoryAudit::default();
    let service = Arc::new(AdmissionService::new(
        Arc::new(repository.clone()),
        Arc::new(audit.clone()),
        AdmissionPolicy::default(),
    ));
    (service, repository, audit)
}

/// Walk a freshly submitted record to `Passed` through the public facade.
pub(super) fn advance_to_passed(
    service: &AdmissionService<MemoryRepository, MemoryAudit>,
    form_id: &FormId,
) -> AdmissionRecord {
    service
        .request_transition(
            form_id,
            AdmissionStatus::Appeared,
            TransitionPayload::default(),
            ACTOR,
        )
        .expect("pending -> appeared");
    service
        .record_entry_test_marks(form_id, 35, 50)
        .expect("marks recorded");
    service
        .request_transition(
            form_id,
            AdmissionStatus::Passed,
            TransitionPayload::default(),
            ACTOR,
        )
        .expect("appeared -> passed")
}

pub(super) async fn read_json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}
