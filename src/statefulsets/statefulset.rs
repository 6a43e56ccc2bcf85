use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PodSpec, PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::construct::{Chart, ObjectRef};
use crate::error::{Error, Result};
use crate::workload::{
    cluster_ip_service, non_empty, pod_labels, pod_volumes, pod_security_context, service_labels,
    service_selector, volume_mounts, ContainerSpec, ResolvedPorts, ServicePorts,
    DEFAULT_CONTAINER_PORT, DEFAULT_PORT,
};

/// Objects created by [`new_stateful_set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatefulSetResource {
    pub stateful_set: ObjectRef,
    pub service: ObjectRef,
    pub ports: ResolvedPorts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatefulSetProps {
    /// Defaults to 80 -> 8080
    pub ports: ServicePorts,
    pub network: Option<String>,
    pub variables: BTreeMap<String, String>,
    /// Mount path -> pod volume
    pub volumes: BTreeMap<String, Volume>,
    /// Mount path -> claim template. Templates must be named; the mount uses
    /// the template name.
    pub volume_claim_templates: BTreeMap<String, PersistentVolumeClaim>,
    pub liveness: Option<Probe>,
}

/// A single-replica StatefulSet `<id>-statefulset` governed by a ClusterIP
/// service.
pub fn new_stateful_set(
    chart: &mut Chart,
    id: &str,
    image: &str,
    props: StatefulSetProps,
) -> Result<StatefulSetResource> {
    let ports = props.ports.resolve(DEFAULT_PORT, DEFAULT_CONTAINER_PORT);
    let labels = pod_labels(id, props.network.as_deref());

    let service = cluster_ip_service(None, labels.clone(), id, ports);
    let service = chart.add("service", service)?;

    let mut mounts = volume_mounts(&props.volumes);
    let mut claim_templates = Vec::with_capacity(props.volume_claim_templates.len());
    for (path, claim) in props.volume_claim_templates {
        let name = claim.metadata.name.clone().ok_or_else(|| {
            Error::Config(format!("volume claim template mounted at {} has no name", path))
        })?;
        mounts.push(VolumeMount {
            mount_path: path,
            name,
            ..Default::default()
        });
        claim_templates.push(claim);
    }

    let container = ContainerSpec {
        name: format!("{}-statefulset-pod", id),
        image,
        container_port: ports.container_port,
        variables: &props.variables,
        mounts,
        liveness: props.liveness,
    }
    .build();

    let stateful_set = StatefulSet {
        metadata: ObjectMeta {
            name: Some(format!("{}-statefulset", id)),
            labels: Some(service_labels(id)),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            selector: service_selector(id),
            service_name: service.name.clone().into(),
            volume_claim_templates: non_empty(claim_templates),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
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
    let stateful_set = chart.add("statefulset", stateful_set)?;

    debug!(id, stateful_set = %stateful_set.name, service = %service.name, "created stateful set");

    Ok(StatefulSetResource {
        stateful_set,
        service,
        ports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ChartProps;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::{ExecAction, PersistentVolumeClaimSpec};
    use serde_json::json;

    fn chart() -> Chart {
        Chart::new(
            "cache",
            ChartProps {
                disable_resource_name_hashes: true,
                ..Default::default()
            },
        )
    }

    fn claim(name: Option<&str>) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: name.map(str::to_string),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_stateful_set_wiring() {
        let mut chart = chart();
        let props = StatefulSetProps {
            network: Some("cache-net".to_string()),
            volume_claim_templates: BTreeMap::from([("/data".to_string(), claim(Some("data")))]),
            liveness: Some(Probe {
                exec: Some(ExecAction {
                    command: Some(vec!["redis-cli".to_string(), "ping".to_string()]),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let resource = new_stateful_set(&mut chart, "redis", "redis:7", props).unwrap();

        assert_eq!(resource.service.name, "cache-service");
        assert_eq!(resource.stateful_set.name, "redis-statefulset");

        let service = chart.api_object("service").unwrap().to_json().unwrap();
        assert_eq!(service.pointer("/metadata/labels/io.service"), Some(&json!("redis")));
        assert_eq!(service.pointer("/metadata/labels/cache-net"), Some(&json!("true")));
        assert_eq!(service.pointer("/spec/ports/0/targetPort"), Some(&json!(8080)));

        let sts = chart.api_object("statefulset").unwrap().to_json().unwrap();
        assert_eq!(sts.pointer("/spec/serviceName"), Some(&json!("cache-service")));
        assert_eq!(sts.pointer("/spec/replicas"), Some(&json!(1)));
        assert_eq!(sts.pointer("/spec/volumeClaimTemplates/0/metadata/name"), Some(&json!("data")));
        assert_eq!(
            sts.pointer("/spec/template/spec/automountServiceAccountToken"),
            Some(&json!(false))
        );

        let container = sts.pointer("/spec/template/spec/containers/0").unwrap();
        assert_eq!(container["name"], json!("redis-statefulset-pod"));
        assert_eq!(container.pointer("/livenessProbe/exec/command/1"), Some(&json!("ping")));
        assert_eq!(container.pointer("/volumeMounts/0/mountPath"), Some(&json!("/data")));
        assert_eq!(container.pointer("/volumeMounts/0/name"), Some(&json!("data")));
        assert_eq!(
            sts.pointer("/spec/template/metadata/labels/cache-net"),
            Some(&json!("true"))
        );
    }

    #[test]
    fn test_unnamed_claim_template_rejected() {
        let mut chart = chart();
        let props = StatefulSetProps {
            volume_claim_templates: BTreeMap::from([("/data".to_string(), claim(None))]),
            ..Default::default()
        };
        let result = new_stateful_set(&mut chart, "redis", "redis:7", props);
        assert_matches!(result, Err(Error::Config(_)));
    }
}
