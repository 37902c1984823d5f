use crate::types::PodSummary;
use crate::utils::time_to_utc;
use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt, config};
use std::path::Path;
use tracing::{debug, warn};

/// The slice of the cluster API that discovery needs.
#[async_trait]
pub trait Orchestrator {
    async fn list_namespaces(&self) -> anyhow::Result<Vec<String>>;
    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<PodSummary>>;
}

pub struct KubeOrchestrator {
    client: Client,
}

impl KubeOrchestrator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from an explicit kubeconfig file, using its current context.
    pub async fn from_kubeconfig(path: &Path) -> anyhow::Result<Self> {
        let kubeconfig = config::Kubeconfig::read_from(path)
            .with_context(|| format!("Error reading kubeconfig from {}", path.display()))?;
        let current_context = kubeconfig
            .current_context
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let config =
            config::Config::from_custom_kubeconfig(kubeconfig, &config::KubeConfigOptions::default())
                .await
                .with_context(|| format!("Error building kubeconfig from {}", path.display()))?;
        let client = Client::try_from(config).context("Error creating Kubernetes client")?;
        debug!("Using kubeconfig context: {}", current_context);
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Orchestrator for KubeOrchestrator {
    async fn list_namespaces(&self) -> anyhow::Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespaces = api
            .list(&ListParams::default())
            .await
            .context("Failed to list namespaces")?;
        Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<PodSummary>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list pods in namespace {}", namespace))?;
        Ok(pods.items.iter().map(pod_summary).collect())
    }
}

/// Name and start time of a listed pod. `start_time` is `None` until the kubelet has
/// started it.
pub fn pod_summary(pod: &Pod) -> PodSummary {
    let name = pod.name_any();
    let raw = pod.status.as_ref().and_then(|s| s.start_time.as_ref());
    let start_time = raw.and_then(|t| {
        let converted = time_to_utc(t);
        if converted.is_none() {
            warn!("Pod {} has a start time that cannot be read: {:?}", name, t);
        }
        converted
    });
    PodSummary { name, start_time }
}
