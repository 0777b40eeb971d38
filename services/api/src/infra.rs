use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use admissions::workflows::admission::{
    AdmissionPolicy, AdmissionRecord, AdmissionRepository, AdmissionStatus, AuditError,
    AuditSink, Cnic, EntryTestMarks, FormId, RepositoryError, StatusTransition,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-backed record store; the version check in `update` gives every
/// write compare-and-swap semantics.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAdmissionRepository {
    records: Arc<Mutex<HashMap<FormId, AdmissionRecord>>>,
}

impl AdmissionRepository for InMemoryAdmissionRepository {
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

/// Append-only in-memory audit trail.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditSink {
    entries: Arc<Mutex<Vec<StatusTransition>>>,
}

impl AuditSink for InMemoryAuditSink {
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

pub(crate) fn default_admission_policy() -> AdmissionPolicy {
    AdmissionPolicy::default()
}
