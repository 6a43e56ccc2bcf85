use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec, Volume};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::construct::{Chart, ObjectRef};
use crate::error::Result;
use crate::workload::{
    cluster_ip_service, pod_labels, pod_volumes, pod_security_context, service_labels,
    service_selector, volume_mounts, ContainerSpec, ResolvedPorts, ServicePorts, DEFAULT_CONTAINER_PORT,
    DEFAULT_PORT,
};

/// Objects created by [`new_backend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResource {
    pub deployment: ObjectRef,
    pub service: ObjectRef,
    pub ports: ResolvedPorts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendProps {
    /// Defaults to 80 -> 8080
    pub ports: ServicePorts,
    /// Network label the pods join (`<network>=true`)
    pub network: Option<String>,
    pub variables: BTreeMap<String, String>,
    /// Mount path -> pod volume
    pub volumes: BTreeMap<String, Volume>,
}

/// A single-replica Deployment exposed through a ClusterIP `<id>-service`.
pub fn new_backend(
    chart: &mut Chart,
    id: &str,
    image: &str,
    props: BackendProps,
) -> Result<BackendResource> {
    let ports = props.ports.resolve(DEFAULT_PORT, DEFAULT_CONTAINER_PORT);

    let container = ContainerSpec {
        name: id.to_string(),
        image,
        container_port: ports.container_port,
        variables: &props.variables,
        mounts: volume_mounts(&props.volumes),
        liveness: None,
    }
    .build();

    let deployment = Deployment {
        metadata: ObjectMeta {
            labels: Some(service_labels(id)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: service_selector(id),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels(id, props.network.as_deref())),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    security_context: Some(pod_security_context()),
                    automount_service_account_token: Some(false),
                    volumes: pod_volumes(props.volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };
    let deployment = chart.add("deployment", deployment)?;

    let service = cluster_ip_service(
        Some(format!("{}-service", id)),
        service_labels(id),
        id,
        ports,
    );
    let service = chart.add("deployment-service", service)?;

    debug!(id, deployment = %deployment.name, service = %service.name, "created backend");

    Ok(BackendResource {
        deployment,
        service,
        ports,
    })
}
