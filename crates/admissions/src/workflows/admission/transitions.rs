//! The admission status machine: which target states a record may move to,
//! and what data must already be in place before the move is legal.

use super::domain::{AdmissionStatus, TransitionPayload};
use super::repository::AdmissionRecord;

/// States with no outbound transitions.
pub const fn is_terminal(status: AdmissionStatus) -> bool {
    matches!(
        status,
        AdmissionStatus::Failed | AdmissionStatus::Trash | AdmissionStatus::Approved
    )
}

/// Forward edges of the workflow, excluding the `Revert`/`Trash` escape hatch.
pub(crate) const fn forward_targets(from: AdmissionStatus) -> &'static [AdmissionStatus] {
    match from {
        AdmissionStatus::Pending => {
            &[AdmissionStatus::Appeared, AdmissionStatus::NotAppeared]
        }
        AdmissionStatus::Appeared => &[AdmissionStatus::Passed, AdmissionStatus::Failed],
        AdmissionStatus::Passed => &[AdmissionStatus::Selected],
        AdmissionStatus::Selected => &[AdmissionStatus::Enrolled],
        AdmissionStatus::Enrolled => &[AdmissionStatus::Approved],
        AdmissionStatus::Revert => &[AdmissionStatus::Pending],
        AdmissionStatus::NotAppeared
        | AdmissionStatus::Failed
        | AdmissionStatus::Approved
        | AdmissionStatus::Trash => &[],
    }
}

/// Whether the machine permits `from -> to`.
///
/// Every non-terminal state may bail out to `Revert` or `Trash`;
/// self-transitions are never legal, so re-requesting an applied transition
/// fails rather than silently succeeding.
pub fn permits(from: AdmissionStatus, to: AdmissionStatus) -> bool {
    if is_terminal(from) || from == to {
        return false;
    }
    if matches!(to, AdmissionStatus::Revert | AdmissionStatus::Trash) {
        return true;
    }
    forward_targets(from).contains(&to)
}

/// Data that must accompany (or precede) a transition to the named target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingPayload {
    #[error("entry-test marks must be recorded before moving to passed")]
    EntryTestMarks,
    #[error("merit list and department must be assigned before moving to selected")]
    MeritAssignment,
    #[error("remarks are required when moving to {target}")]
    Remarks { target: &'static str },
}

/// Check the target's payload gate against the record and request payload.
pub fn check_payload(
    record: &AdmissionRecord,
    to: AdmissionStatus,
    payload: &TransitionPayload,
) -> Result<(), MissingPayload> {
    match to {
        AdmissionStatus::Passed if record.entry_test_marks.is_none() => {
            Err(MissingPayload::EntryTestMarks)
        }
        AdmissionStatus::Selected
            if record.merit_list.is_none() || record.department.is_none() =>
        {
            Err(MissingPayload::MeritAssignment)
        }
        AdmissionStatus::Revert | AdmissionStatus::Trash
            if payload.trimmed_remarks().is_none() =>
        {
            Err(MissingPayload::Remarks { target: to.label() })
        }
        _ => Ok(()),
    }
}
