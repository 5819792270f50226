//! `DeploymentPatcher` backed by the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::Client;
use kube::api::{Api, Patch, PatchParams};
use serde_json::Value;

use crate::error::TriggerResult;
use crate::trigger::{DeploymentPatcher, GenerationStatus};

/// Patches `apps/v1` deployments through a shared `kube::Client`.
#[derive(Clone)]
pub struct KubePatcher {
    client: Client,
}

impl KubePatcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeploymentPatcher for KubePatcher {
    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> TriggerResult<GenerationStatus> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployment = api
            .patch(name, &PatchParams::default(), &Patch::Strategic(patch))
            .await?;
        Ok(generation_status(&deployment))
    }
}

/// Pull the generation counters out of a deployment object.
pub fn generation_status(deployment: &Deployment) -> GenerationStatus {
    GenerationStatus {
        generation: deployment.metadata.generation,
        observed_generation: deployment
            .status
            .as_ref()
            .and_then(|s| s.observed_generation),
    }
}
