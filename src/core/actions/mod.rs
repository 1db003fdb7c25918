//! # Actions Module
//!
//! Applies resolution decisions to files on disk.
//!
//! Two plans are supported:
//! - **Removal** - delete every photo marked redundant
//! - **Rename** - rename every surviving photo to `<fingerprint>.<ext>` so
//!   near-duplicates sort next to each other for manual review
//!
//! Plans run as a dry run unless [`ActionMode::Apply`] is requested.

use crate::core::pipeline::ImageRecord;
use crate::core::resolution::{redundant_indices, ResolutionDecision};
use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Whether a plan touches the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionMode {
    /// Report what would happen
    #[default]
    DryRun,
    /// Perform the file operations
    Apply,
}

/// One file operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileAction {
    Delete { path: PathBuf },
    Rename { from: PathBuf, to: PathBuf },
}

/// Photos to delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    pub actions: Vec<FileAction>,
}

impl RemovalPlan {
    /// Delete the redundant photo of every decision, each path once
    pub fn from_decisions(records: &[ImageRecord], decisions: &[ResolutionDecision]) -> Self {
        let actions = redundant_indices(decisions)
            .into_iter()
            .filter_map(|index| records.get(index))
            .map(|record| FileAction::Delete {
                path: record.path.clone(),
            })
            .collect();
        Self { actions }
    }
}

/// Photos to rename after their fingerprint
#[derive(Debug, Default)]
pub struct RenamePlan {
    pub actions: Vec<FileAction>,
    /// Renames left out because another file already takes the name
    pub conflicts: Vec<ActionError>,
}

impl RenamePlan {
    /// Rename every fingerprinted photo that is not in `removed`.
    ///
    /// The new name stays in the same directory and keeps the original
    /// extension. Photos already carrying their target name are left alone.
    pub fn from_records(records: &[ImageRecord], removed: &HashSet<usize>) -> Self {
        let mut actions = Vec::new();
        let mut conflicts = Vec::new();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for record in records {
            if removed.contains(&record.index) {
                continue;
            }
            let Some(digest) = &record.digest else {
                continue;
            };

            let name = if record.extension.is_empty() {
                digest.fingerprint.to_string()
            } else {
                format!("{}.{}", digest.fingerprint, record.extension)
            };
            let target = record.path.with_file_name(name);

            if target == record.path {
                claimed.insert(target);
                continue;
            }

            if target.exists() || !claimed.insert(target.clone()) {
                conflicts.push(ActionError::TargetExists { path: target });
                continue;
            }

            actions.push(FileAction::Rename {
                from: record.path.clone(),
                to: target,
            });
        }

        Self { actions, conflicts }
    }
}

/// Outcome of executing a plan
#[derive(Debug, Default)]
pub struct ActionReport {
    /// Every action considered
    pub planned: Vec<FileAction>,
    /// Actions performed (empty for a dry run)
    pub applied: Vec<FileAction>,
    /// Actions that failed, one per entry in `errors`
    pub skipped: Vec<FileAction>,
    /// Per-file failures
    pub errors: Vec<ActionError>,
}

/// Runs file action plans
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn execute(actions: &[FileAction], mode: ActionMode) -> ActionReport {
        let mut report = ActionReport {
            planned: actions.to_vec(),
            ..Default::default()
        };

        if mode == ActionMode::DryRun {
            return report;
        }

        for action in actions {
            match Self::apply(action) {
                Ok(()) => {
                    tracing::info!(?action, "file action applied");
                    report.applied.push(action.clone());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "file action failed");
                    report.skipped.push(action.clone());
                    report.errors.push(e);
                }
            }
        }

        report
    }

    fn apply(action: &FileAction) -> Result<(), ActionError> {
        match action {
            FileAction::Delete { path } => {
                if !path.exists() {
                    return Err(ActionError::SourceMissing { path: path.clone() });
                }
                fs::remove_file(path).map_err(|source| ActionError::Delete {
                    path: path.clone(),
                    source,
                })
            }
            FileAction::Rename { from, to } => {
                if !from.exists() {
                    return Err(ActionError::SourceMissing { path: from.clone() });
                }
                if to.exists() {
                    return Err(ActionError::TargetExists { path: to.clone() });
                }
                fs::rename(from, to).map_err(|source| ActionError::Rename {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })
            }
        }
    }
}
