// ── Batch requests and results ──
//
// A batch covers one operation over one or more targets. Batches are
// validated at schedule time (fail fast), queued FIFO, and settled as a
// whole; the per-target outcomes come back through a oneshot ticket.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::target::Target;

/// The four operation kinds a batch can carry.
///
/// The closed enum replaces the original's stringly-typed operation
/// routing — an unrecognized operation is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// One scheduler-queued operation covering one or more targets.
///
/// Built through the operation-specific constructors so payload and
/// entity-id requirements are visible at the call site; [`validate`]
/// (Self::validate) enforces them before the batch is admitted.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub operation: Operation,
    pub targets: Vec<Target>,
    /// Optional site identifier; changes addressing, not target identity.
    pub scope: Option<String>,
    /// Operation-specific body (required for create/update).
    pub payload: Option<Value>,
    /// Entity addressed by update/delete.
    pub entity_id: Option<String>,
}

impl BatchRequest {
    /// Fetch the current tables for `targets`.
    pub fn read(targets: Vec<Target>) -> Self {
        Self {
            operation: Operation::Read,
            targets,
            scope: None,
            payload: None,
            entity_id: None,
        }
    }

    /// Create a new entity under `target`.
    pub fn create(target: Target, payload: Value) -> Self {
        Self {
            operation: Operation::Create,
            targets: vec![target],
            scope: None,
            payload: Some(payload),
            entity_id: None,
        }
    }

    /// Replace the entity `id` under `target`.
    pub fn update(target: Target, id: impl Into<String>, payload: Value) -> Self {
        Self {
            operation: Operation::Update,
            targets: vec![target],
            scope: None,
            payload: Some(payload),
            entity_id: Some(id.into()),
        }
    }

    /// Delete the entity `id` under `target`.
    pub fn delete(target: Target, id: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            targets: vec![target],
            scope: None,
            payload: None,
            entity_id: Some(id.into()),
        }
    }

    /// Address the batch to a specific site.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Admission checks, run synchronously at schedule time.
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.targets.is_empty() {
            return Err(CoreError::EmptyBatch);
        }
        if let Some(&composite) = self.targets.iter().find(|t| t.is_composite()) {
            return Err(CoreError::NotFetchable(composite));
        }
        match self.operation {
            Operation::Create | Operation::Update if self.payload.is_none() => {
                return Err(CoreError::MissingPayload {
                    operation: self.operation,
                });
            }
            Operation::Update | Operation::Delete if self.entity_id.is_none() => {
                return Err(CoreError::MissingEntityId {
                    operation: self.operation,
                });
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// Per-target outcomes of one settled batch, keyed by target even when
/// the batch had a single target.
#[derive(Debug)]
pub struct BatchResults {
    by_target: HashMap<Target, Result<Value, CoreError>>,
}

impl BatchResults {
    pub(crate) fn new(settled: Vec<(Target, Result<Value, CoreError>)>) -> Self {
        Self {
            by_target: settled.into_iter().collect(),
        }
    }

    /// The outcome for one target, if it was part of the batch.
    pub fn get(&self, target: Target) -> Option<&Result<Value, CoreError>> {
        self.by_target.get(&target)
    }

    /// The successful body for one target, if any.
    pub fn ok(&self, target: Target) -> Option<&Value> {
        self.by_target.get(&target).and_then(|r| r.as_ref().ok())
    }

    /// `true` if every per-target request succeeded.
    pub fn is_fully_ok(&self) -> bool {
        self.by_target.values().all(Result::is_ok)
    }

    /// Targets whose requests failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (Target, &CoreError)> {
        self.by_target
            .iter()
            .filter_map(|(&t, r)| r.as_ref().err().map(|e| (t, e)))
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, &Result<Value, CoreError>)> {
        self.by_target.iter().map(|(&t, r)| (t, r))
    }
}

/// Completion handle returned by [`Scheduler::schedule`](crate::Scheduler::schedule).
///
/// Await [`settled`](Self::settled) for the per-target results, or drop
/// the ticket for fire-and-forget scheduling — the batch runs either way.
#[derive(Debug)]
pub struct BatchTicket {
    rx: oneshot::Receiver<BatchResults>,
}

impl BatchTicket {
    pub(crate) fn new(rx: oneshot::Receiver<BatchResults>) -> Self {
        Self { rx }
    }

    /// Wait until the whole batch has settled.
    pub async fn settled(self) -> Result<BatchResults, CoreError> {
        self.rx.await.map_err(|_| CoreError::SchedulerClosed)
    }
}
