//! The result of an update run and its commit message.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;

use super::VariableUpdate;
use crate::dependencies::DependencyInfo;

/// A variable that changed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUpdate {
    pub variable_name: String,
    pub old_value: String,
    pub new_value: String,
    /// Dependencies that justified the change
    pub dependencies: Vec<DependencyInfo>,
}

impl From<VariableUpdate> for AppliedUpdate {
    fn from(update: VariableUpdate) -> Self {
        Self {
            variable_name: update.variable_name,
            old_value: update.current_value,
            new_value: update.desired_value,
            dependencies: update.used_dependencies,
        }
    }
}

/// Everything a run changed, plus the problems it recorded along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub updates: Vec<AppliedUpdate>,
    /// Failures that leave a variable at its old value; any of these fails the run
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl UpdateReport {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.updates.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Dependencies behind all changes, sorted and without duplicates.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<&DependencyInfo> {
        self.updates.iter().flat_map(|u| u.dependencies.iter()).collect()
    }

    /// Renders a commit message for the changes.
    ///
    /// ```text
    /// Update runtime to 9.0.0, sdk to 9.0.100
    ///
    /// - runtime|9.0|build-version: 9.0.0-rc.2.24473.5 -> 9.0.0
    /// - sdk|9.0|build-version: 9.0.100-rc.2.24474.11 -> 9.0.100
    /// ```
    #[must_use]
    pub fn commit_message(&self) -> String {
        let dependencies = self.dependencies();
        let mut message = if dependencies.is_empty() {
            "Update manifest variables".to_string()
        } else {
            let parts: Vec<String> =
                dependencies.iter().map(|d| format!("{} to {}", d.name, d.version)).collect();
            format!("Update {}", parts.join(", "))
        };

        if !self.updates.is_empty() {
            message.push('\n');
            for update in &self.updates {
                let _ = write!(
                    message,
                    "\n- {}: {} -> {}",
                    update.variable_name, update.old_value, update.new_value
                );
            }
        }

        message
    }
}
