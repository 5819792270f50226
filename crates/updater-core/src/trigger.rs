//! Rollout trigger — patches the pod template annotation and reads the
//! generation counters off the patched object.
//!
//! The generation comparison is taken from the patch *response*. A controller
//! that reconciles between the write and the response, or an unrelated
//! generation bump already in flight, makes the classification wrong. That is
//! the contract callers rely on; there is no follow-up polling.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::trace;

use crate::error::TriggerResult;

/// Pod template annotation whose value is replaced on every trigger.
pub const ANNOTATION_KEY: &str = "thobits.com/updater";

/// Generation counters read from a deployment object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStatus {
    /// `metadata.generation`.
    pub generation: Option<i64>,
    /// `status.observedGeneration`.
    pub observed_generation: Option<i64>,
}

impl GenerationStatus {
    pub fn new(generation: i64, observed_generation: i64) -> Self {
        Self {
            generation: Some(generation),
            observed_generation: Some(observed_generation),
        }
    }

    /// True when the controller has not yet observed the latest generation.
    ///
    /// Unset counters read as zero.
    pub fn rollout_pending(&self) -> bool {
        self.observed_generation.unwrap_or(0) != self.generation.unwrap_or(0)
    }
}

/// Applies a strategic merge patch to a deployment and returns the
/// generation counters of the object the API server sent back.
#[async_trait]
pub trait DeploymentPatcher: Send + Sync {
    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> TriggerResult<GenerationStatus>;
}

/// Build the merge patch that sets the updater annotation to `value`.
pub fn annotation_patch(value: &str) -> Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        ANNOTATION_KEY: value
                    }
                }
            }
        }
    })
}

/// Triggers rollouts of one configured deployment.
#[derive(Clone)]
pub struct RolloutTrigger {
    patcher: Arc<dyn DeploymentPatcher>,
    namespace: String,
    deployment: String,
}

impl RolloutTrigger {
    pub fn new(
        patcher: Arc<dyn DeploymentPatcher>,
        namespace: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            patcher,
            namespace: namespace.into(),
            deployment: deployment.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// Stamp `timestamp` into the pod template and report whether a new
    /// rollout was scheduled.
    ///
    /// Errors from the patch call are returned unclassified. One attempt,
    /// no retries.
    pub async fn trigger(&self, timestamp: &str) -> TriggerResult<bool> {
        let patch = annotation_patch(timestamp);
        let status = self
            .patcher
            .patch_deployment(&self.namespace, &self.deployment, &patch)
            .await?;

        let pending = status.rollout_pending();
        trace!(
            namespace = %self.namespace,
            deployment = %self.deployment,
            generation = ?status.generation,
            observed_generation = ?status.observed_generation,
            pending,
            "deployment patched"
        );
        Ok(pending)
    }
}
