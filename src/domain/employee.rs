use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EmployeeId = Uuid;

/// Display name used when a sale references no employee, or one that is
/// missing from the directory.
pub const UNASSIGNED_NAME: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory id -> name lookup, fetched once per aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct EmployeeDirectory {
    names: HashMap<EmployeeId, String>,
}

impl EmployeeDirectory {
    pub fn from_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        Self {
            names: employees.into_iter().map(|e| (e.id, e.name)).collect(),
        }
    }

    /// Resolve an employee id to its display name. Missing references are a
    /// normal state and resolve to [`UNASSIGNED_NAME`].
    pub fn resolve(&self, id: Option<EmployeeId>) -> &str {
        id.and_then(|id| self.names.get(&id))
            .map(|s| s.as_str())
            .unwrap_or(UNASSIGNED_NAME)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_employee() {
        let ana = Employee::new("Ana");
        let directory = EmployeeDirectory::from_employees(vec![ana.clone()]);

        assert_eq!(directory.resolve(Some(ana.id)), "Ana");
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_resolve_missing_reference_is_unassigned() {
        let directory = EmployeeDirectory::from_employees(vec![Employee::new("Ana")]);

        assert_eq!(directory.resolve(Some(Uuid::new_v4())), UNASSIGNED_NAME);
        assert_eq!(directory.resolve(None), UNASSIGNED_NAME);
    }

    #[test]
    fn test_empty_directory() {
        let directory = EmployeeDirectory::default();
        assert!(directory.is_empty());
        assert_eq!(directory.resolve(Some(Uuid::new_v4())), UNASSIGNED_NAME);
    }
}
