//! Admission workflow: record intake, the status machine, marks/merit
//! gating, and the append-only transition audit trail.

pub mod domain;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    AdmissionStatus, ApplicationSubmission, Cnic, EntryTestMarks, FeeStatus, FormId,
    StatusTransition, TransitionPayload, UnknownStatus,
};
pub use policy::AdmissionPolicy;
pub use repository::{
    AdmissionRecord, AdmissionRecordView, AdmissionRepository, AuditError, AuditSink,
    RepositoryError,
};
pub use router::{admission_router, StaffActor, ACTOR_HEADER};
pub use service::{AdmissionService, AdmissionServiceError, ValidationError};
pub use transitions::MissingPayload;
