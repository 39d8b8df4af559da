// Principal Domain Model

use serde::{Deserialize, Serialize};

/// The caller on whose behalf a process runs.
///
/// Carries the ambient group memberships in effect at launch time; they
/// are captured on the process handle and never re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub is_admin: bool,
}

impl Principal {
    pub fn new(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
            is_admin: false,
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            is_admin: true,
        }
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
