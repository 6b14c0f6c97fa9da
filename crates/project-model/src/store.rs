//! Single-writer owner of the current project value.
//!
//! Every change replaces the whole `Project` and bumps a version counter.
//! Synchronous edits go through [`ProjectStore::apply`] or
//! [`ProjectStore::update`]; asynchronous producers (upload, transcription)
//! either queue commands with [`ProjectStore::enqueue`] or write a full value
//! with [`ProjectStore::compare_and_swap`] against the version they read.

use std::collections::VecDeque;

use crate::command::{CommandError, ProjectCommand};
use crate::project::{compute_total_duration, EditLimits, Project};

/// Rejected optimistic write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Stale write: based on version {expected}, store is at {actual}")]
    StaleVersion { expected: u64, actual: u64 },
}

/// Result of applying the queued commands.
#[derive(Debug, Default)]
pub struct DrainSummary {
    /// Commands that produced a new project value.
    pub applied: usize,
    /// Commands that left the project unchanged, with the reason.
    pub rejected: Vec<(&'static str, CommandError)>,
}

/// Holds the authoritative project and its version.
#[derive(Debug)]
pub struct ProjectStore {
    project: Project,
    version: u64,
    queue: VecDeque<ProjectCommand>,
    limits: EditLimits,
}

impl ProjectStore {
    /// Take ownership of a project. Its cached duration is recomputed.
    pub fn new(project: Project) -> Self {
        Self::with_limits(project, EditLimits::default())
    }

    /// Like [`new`](Self::new), applying commands under `limits`.
    pub fn with_limits(mut project: Project, limits: EditLimits) -> Self {
        project.total_duration = compute_total_duration(&project.tracks);
        Self {
            project,
            version: 0,
            queue: VecDeque::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &EditLimits {
        &self.limits
    }

    /// Current project value.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Number of replacements so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply one command against the latest value.
    pub fn apply(&mut self, command: ProjectCommand) -> Result<u64, CommandError> {
        match command.apply_with(&self.project, &self.limits) {
            Ok(next) => {
                self.replace(next);
                tracing::debug!(
                    command = command.name(),
                    version = self.version,
                    total_duration = self.project.total_duration,
                    "Applied project command"
                );
                Ok(self.version)
            }
            Err(e) => {
                tracing::warn!(command = command.name(), error = %e, "Project command rejected");
                Err(e)
            }
        }
    }

    /// Read-modify-write against the latest value.
    pub fn update(&mut self, f: impl FnOnce(&Project) -> Project) -> u64 {
        let next = f(&self.project).touched();
        self.replace(next);
        self.version
    }

    /// Replace the project only if nobody wrote since `expected_version`.
    pub fn compare_and_swap(&mut self, expected_version: u64, next: Project) -> Result<u64, StoreError> {
        if expected_version != self.version {
            tracing::warn!(
                expected = expected_version,
                actual = self.version,
                "Rejected stale project write"
            );
            return Err(StoreError::StaleVersion {
                expected: expected_version,
                actual: self.version,
            });
        }
        self.replace(next.touched());
        Ok(self.version)
    }

    /// Queue a command for the next [`drain`](Self::drain).
    pub fn enqueue(&mut self, command: ProjectCommand) {
        self.queue.push_back(command);
    }

    /// Commands waiting to be applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply queued commands in arrival order.
    pub fn drain(&mut self) -> DrainSummary {
        let mut summary = DrainSummary::default();
        while let Some(command) = self.queue.pop_front() {
            let name = command.name();
            match self.apply(command) {
                Ok(_) => summary.applied += 1,
                Err(e) => summary.rejected.push((name, e)),
            }
        }
        summary
    }

    /// Give the project back.
    pub fn into_project(self) -> Project {
        self.project
    }

    fn replace(&mut self, next: Project) {
        self.project = next;
        self.version += 1;
    }
}
