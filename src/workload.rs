//! Pieces shared by deployments and stateful sets

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSecurityContext, Probe, ResourceRequirements,
    SecurityContext, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};

/// Label every generated object carries, keyed by the factory `id`
pub const SERVICE_LABEL: &str = "io.service";

/// Default service port for web workloads
pub const DEFAULT_PORT: i32 = 80;

/// Default container port for web workloads
pub const DEFAULT_CONTAINER_PORT: i32 = 8080;

/// Service and container port pair. Unset fields take the factory's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePorts {
    pub port: Option<i32>,
    pub container_port: Option<i32>,
}

impl ServicePorts {
    pub fn new(port: i32, container_port: i32) -> Self {
        Self {
            port: Some(port),
            container_port: Some(container_port),
        }
    }

    pub fn resolve(&self, default_port: i32, default_container_port: i32) -> ResolvedPorts {
        ResolvedPorts {
            port: self.port.unwrap_or(default_port),
            container_port: self.container_port.unwrap_or(default_container_port),
        }
    }
}

/// Ports after defaulting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPorts {
    pub port: i32,
    pub container_port: i32,
}

pub(crate) fn service_labels(id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(SERVICE_LABEL.to_string(), id.to_string())])
}

/// `io.service=<id>` plus `<network>=true` when the workload joins a network.
pub(crate) fn pod_labels(id: &str, network: Option<&str>) -> BTreeMap<String, String> {
    let mut labels = service_labels(id);
    if let Some(network) = network {
        labels.insert(network.to_string(), "true".to_string());
    }
    labels
}

pub(crate) fn service_selector(id: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(service_labels(id)),
        ..Default::default()
    }
}

pub(crate) fn container_security_context() -> SecurityContext {
    SecurityContext {
        read_only_root_filesystem: Some(false),
        run_as_non_root: Some(false),
        privileged: Some(false),
        allow_privilege_escalation: Some(false),
        ..Default::default()
    }
}

pub(crate) fn pod_security_context() -> PodSecurityContext {
    PodSecurityContext {
        run_as_non_root: Some(false),
        ..Default::default()
    }
}

/// Container description before it is turned into a typed [`Container`].
pub(crate) struct ContainerSpec<'a> {
    pub name: String,
    pub image: &'a str,
    pub container_port: i32,
    pub variables: &'a BTreeMap<String, String>,
    pub mounts: Vec<VolumeMount>,
    pub liveness: Option<Probe>,
}

impl ContainerSpec<'_> {
    pub(crate) fn build(self) -> Container {
        Container {
            name: self.name,
            image: Some(self.image.to_string()),
            ports: Some(vec![ContainerPort {
                container_port: self.container_port,
                ..Default::default()
            }]),
            resources: Some(ResourceRequirements::default()),
            security_context: Some(container_security_context()),
            liveness_probe: self.liveness,
            env: non_empty(env_vars(self.variables)),
            volume_mounts: non_empty(self.mounts),
            ..Default::default()
        }
    }
}

pub(crate) fn env_vars(variables: &BTreeMap<String, String>) -> Vec<EnvVar> {
    variables
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect()
}

/// One mount per `(mount path, volume)`, named after the volume.
pub(crate) fn volume_mounts(volumes: &BTreeMap<String, Volume>) -> Vec<VolumeMount> {
    volumes
        .iter()
        .map(|(path, volume)| VolumeMount {
            mount_path: path.clone(),
            name: volume.name.clone(),
            ..Default::default()
        })
        .collect()
}

/// A ClusterIP service with one port named after its number.
pub(crate) fn cluster_ip_service(
    name: Option<String>,
    labels: BTreeMap<String, String>,
    id: &str,
    ports: ResolvedPorts,
) -> Service {
    Service {
        metadata: ObjectMeta {
            name,
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(service_labels(id)),
            ports: Some(vec![ServicePort {
                name: Some(ports.port.to_string()),
                port: ports.port,
                target_port: Some(IntOrString::Int(ports.container_port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Pod volumes, one per distinct volume name. The same volume may be
/// mounted at several paths.
pub(crate) fn pod_volumes(volumes: BTreeMap<String, Volume>) -> Option<Vec<Volume>> {
    let mut seen = std::collections::BTreeSet::new();
    let unique = volumes
        .into_values()
        .filter(|volume| seen.insert(volume.name.clone()))
        .collect();
    non_empty(unique)
}

pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_resolve_defaults() {
        let ports = ServicePorts::default().resolve(DEFAULT_PORT, DEFAULT_CONTAINER_PORT);
        assert_eq!(ports, ResolvedPorts { port: 80, container_port: 8080 });

        let ports = ServicePorts {
            port: Some(443),
            container_port: None,
        }
        .resolve(DEFAULT_PORT, DEFAULT_CONTAINER_PORT);
        assert_eq!(ports, ResolvedPorts { port: 443, container_port: 8080 });
    }

    #[test]
    fn test_pod_labels_with_network() {
        let labels = pod_labels("api", Some("backend-net"));
        assert_eq!(labels.get(SERVICE_LABEL).map(String::as_str), Some("api"));
        assert_eq!(labels.get("backend-net").map(String::as_str), Some("true"));
        assert_eq!(pod_labels("api", None).len(), 1);
    }

    #[test]
    fn test_pod_volumes_deduplicated_by_name() {
        let shared = Volume {
            name: "shared".to_string(),
            ..Default::default()
        };
        let volumes = BTreeMap::from([
            ("/a".to_string(), shared.clone()),
            ("/b".to_string(), shared),
        ]);

        assert_eq!(volume_mounts(&volumes).len(), 2);
        let pod = pod_volumes(volumes).unwrap();
        assert_eq!(pod.len(), 1);
        assert_eq!(pod[0].name, "shared");
        assert_eq!(pod_volumes(BTreeMap::new()), None);
    }

    #[test]
    fn test_env_vars_sorted_by_name() {
        let vars = BTreeMap::from([
            ("B".to_string(), "2".to_string()),
            ("A".to_string(), "1".to_string()),
        ]);
        let names: Vec<_> = env_vars(&vars).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_container_omits_empty_lists() {
        let vars = BTreeMap::new();
        let container = ContainerSpec {
            name: "api".to_string(),
            image: "nginx",
            container_port: 8080,
            variables: &vars,
            mounts: Vec::new(),
            liveness: None,
        }
        .build();
        assert!(container.env.is_none());
        assert!(container.volume_mounts.is_none());
        assert_eq!(container.ports.unwrap()[0].container_port, 8080);
    }
}
