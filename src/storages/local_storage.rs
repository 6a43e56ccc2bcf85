use std::collections::BTreeMap;

use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::construct::{Chart, ObjectRef};
use crate::error::Result;

pub const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";
pub const NO_PROVISIONER: &str = "kubernetes.io/no-provisioner";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStorageProps {
    /// Mark as the cluster default storage class. Defaults to `false`
    pub is_default: Option<bool>,
}

/// StorageClass `id` for statically provisioned local volumes. Binding waits
/// for the first consumer so the scheduler can honour node affinity.
pub fn new_local_storage(chart: &mut Chart, id: &str, props: LocalStorageProps) -> Result<ObjectRef> {
    let is_default = props.is_default.unwrap_or(false);

    let storage = StorageClass {
        metadata: ObjectMeta {
            name: Some(id.to_string()),
            annotations: Some(BTreeMap::from([(
                DEFAULT_CLASS_ANNOTATION.to_string(),
                is_default.to_string(),
            )])),
            ..Default::default()
        },
        provisioner: NO_PROVISIONER.to_string(),
        volume_binding_mode: Some("WaitForFirstConsumer".to_string()),
        ..Default::default()
    };
    chart.add(id, storage)
}
