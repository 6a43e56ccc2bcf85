use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::construct::{Chart, ObjectRef};
use crate::error::Result;

pub const DEFAULT_STORAGE_CLASS: &str = "standard";
pub const DEFAULT_CAPACITY: &str = "0.1Gi";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimProps {
    /// Defaults to `standard`
    pub storage_class_name: Option<String>,
    /// Defaults to `0.1Gi`
    pub capacity: Option<Quantity>,
    /// Pre-bind the claim to this persistent volume
    pub volume_name: Option<String>,
}

impl ClaimProps {
    pub(crate) fn storage_class_or_default(&self) -> String {
        self.storage_class_name
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_string())
    }

    pub(crate) fn capacity_or_default(&self) -> Quantity {
        self.capacity
            .clone()
            .unwrap_or_else(|| Quantity(DEFAULT_CAPACITY.to_string()))
    }
}

/// A ReadWriteOnce filesystem claim.
pub fn new_claim(chart: &mut Chart, id: &str, props: ClaimProps) -> Result<ObjectRef> {
    let claim = PersistentVolumeClaim {
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            volume_mode: Some("Filesystem".to_string()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    props.capacity_or_default(),
                )])),
                ..Default::default()
            }),
            storage_class_name: Some(props.storage_class_or_default()),
            volume_name: props.volume_name,
            ..Default::default()
        }),
        ..Default::default()
    };
    chart.add(id, claim)
}
