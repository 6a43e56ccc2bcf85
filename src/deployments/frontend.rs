use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Volume;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::backend::{new_backend, BackendProps};
use crate::construct::{Chart, ObjectRef};
use crate::error::Result;
use crate::workload::{service_labels, ServicePorts};

/// Annotation read by cert-manager to issue the ingress certificate
pub const CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";

/// Objects created by [`new_frontend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendResource {
    pub deployment: ObjectRef,
    pub service: ObjectRef,
    pub ingress: ObjectRef,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontendProps {
    pub ports: ServicePorts,
    pub network: Option<String>,
    pub variables: BTreeMap<String, String>,
    pub volumes: BTreeMap<String, Volume>,
    /// cert-manager ClusterIssuer for the TLS certificate
    pub cluster_issuer: Option<String>,
}

/// A backend plus an Ingress routing `host/` to its service over TLS.
pub fn new_frontend(
    chart: &mut Chart,
    id: &str,
    host: &str,
    image: &str,
    props: FrontendProps,
) -> Result<FrontendResource> {
    let backend = new_backend(
        chart,
        id,
        image,
        BackendProps {
            ports: props.ports,
            network: props.network,
            variables: props.variables,
            volumes: props.volumes,
        },
    )?;

    let annotations = props
        .cluster_issuer
        .map(|issuer| BTreeMap::from([(CLUSTER_ISSUER_ANNOTATION.to_string(), issuer)]));

    let ingress = Ingress {
        metadata: ObjectMeta {
            labels: Some(service_labels(id)),
            annotations,
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: backend.service.name.clone(),
                                port: Some(ServiceBackendPort {
                                    number: Some(backend.ports.port),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![host.to_string()]),
                secret_name: Some(format!("{}-tls", id)),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let ingress = chart.add("ingress", ingress)?;

    debug!(id, host, ingress = %ingress.name, "created frontend");

    Ok(FrontendResource {
        deployment: backend.deployment,
        service: backend.service,
        ingress,
    })
}
