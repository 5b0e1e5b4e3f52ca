//! Engine seam
//!
//! The engine turns a plan into provider API calls. Retries, reconciliation
//! and state diffing all live behind this trait; the first failed step fails
//! the apply and every later step is skipped.

use crate::error::{CloudError, Result};
use crate::graph::{DeclarationId, DeclarationKind};
use crate::plan::Plan;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

/// Infrastructure engine abstraction trait
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the engine name (e.g., "dry-run")
    fn name(&self) -> &str;

    /// Apply the planned steps
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied steps
    pub succeeded: Vec<StepResult>,

    /// Failed steps
    pub failed: Vec<StepResult>,

    /// Steps never attempted because an earlier step failed
    pub skipped: Vec<StepResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, step_id: DeclarationId, key: String, message: String) {
        self.succeeded.push(StepResult {
            step_id,
            key,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, step_id: DeclarationId, key: String, error: String) {
        self.failed.push(StepResult {
            step_id,
            key,
            message: String::new(),
            error: Some(error),
        });
    }

    pub fn add_skipped(&mut self, step_id: DeclarationId, key: String, reason: String) {
        self.skipped.push(StepResult {
            step_id,
            key,
            message: reason,
            error: None,
        });
    }

    pub fn was_applied(&self, key: &str) -> bool {
        self.succeeded.iter().any(|r| r.key == key)
    }

    pub fn was_skipped(&self, key: &str) -> bool {
        self.skipped.iter().any(|r| r.key == key)
    }
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: DeclarationId,

    /// `{type}:{name}` of the step
    pub key: String,

    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Engine that walks a plan without touching any provider
///
/// It keys every managed declaration by `(type, name)` the way a real engine
/// keys resources, so two components producing the same identifier fail here.
#[derive(Debug, Clone, Default)]
pub struct DryRunEngine {
    failures: HashMap<String, String>,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the step with this `{type}:{name}` key fail with `error`
    pub fn fail_on(mut self, key: impl Into<String>, error: impl Into<String>) -> Self {
        self.failures.insert(key.into(), error.into());
        self
    }
}

#[async_trait]
impl Engine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn apply(&self, plan: &Plan) -> Result<ApplyResult> {
        let start = Instant::now();
        let mut result = ApplyResult::new();
        let mut applied: HashSet<DeclarationId> = HashSet::new();
        let mut keys: HashSet<String> = HashSet::new();
        let mut halted_by: Option<String> = None;

        info!(steps = plan.len(), waves = plan.waves.len(), "Applying plan");

        for step in &plan.steps {
            let key = step.key();

            if let Some(cause) = &halted_by {
                warn!(key = %key, "Skipped after failure of {}", cause);
                result.add_skipped(step.id, key, format!("upstream failure: {}", cause));
                continue;
            }

            if let Some(missing) = step.depends_on.iter().find(|d| !applied.contains(*d)) {
                return Err(CloudError::ApplyFailed(format!(
                    "{} is ordered before its dependency {}",
                    key, missing
                )));
            }

            let outcome = if let Some(error) = self.failures.get(&key) {
                Err(error.clone())
            } else if step.kind != DeclarationKind::Lookup && !keys.insert(key.clone()) {
                Err(CloudError::ResourceAlreadyExists(key.clone()).to_string())
            } else {
                Ok(())
            };

            match outcome {
                Ok(()) => {
                    applied.insert(step.id);
                    result.add_success(step.id, key, format!("{} declared", step.kind));
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "Step failed");
                    halted_by = Some(key.clone());
                    result.add_failure(step.id, key, error);
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            "Apply finished"
        );
        Ok(result)
    }
}
