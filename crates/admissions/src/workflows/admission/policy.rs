use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Configuration consumed by the merit subsystem: the fixed set of
/// departments an applicant may be placed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub departments: BTreeSet<String>,
}

impl AdmissionPolicy {
    pub fn new(departments: impl IntoIterator<Item = String>) -> Self {
        Self {
            departments: departments.into_iter().collect(),
        }
    }

    pub fn permits_department(&self, department: &str) -> bool {
        self.departments.contains(department)
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(
            [
                "Computer Science",
                "Electrical Engineering",
                "Business Administration",
                "Mathematics",
                "English",
            ]
            .map(String::from),
        )
    }
}
