use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    NetworkPolicy, NetworkPolicyIngressRule, NetworkPolicyPeer, NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use crate::construct::{Chart, ObjectRef};
use crate::error::Result;

/// Isolate pods labelled `<network>=true` so they only accept traffic from
/// each other.
pub fn new_network_policy(chart: &mut Chart, id: &str, network: &str) -> Result<ObjectRef> {
    let selector = LabelSelector {
        match_labels: Some(BTreeMap::from([(network.to_string(), "true".to_string())])),
        ..Default::default()
    };

    let policy = NetworkPolicy {
        spec: Some(NetworkPolicySpec {
            pod_selector: selector.clone().into(),
            policy_types: Some(vec!["Ingress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(vec![NetworkPolicyPeer {
                    pod_selector: Some(selector),
                    ..Default::default()
                }]),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };
    chart.add(id, policy)
}
