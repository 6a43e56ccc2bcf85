use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ObjectReference, PersistentVolume, PersistentVolumeSpec, Volume,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::claim::{new_claim, ClaimProps};
use super::volume::claim_volume;
use crate::construct::{Chart, ObjectRef};
use crate::error::Result;

/// A persistent volume, the claim bound to it, and a pod volume for the claim
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentVolumeResource {
    pub persistent_volume: ObjectRef,
    pub volume: Volume,
    pub claim: ObjectRef,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistentVolumeProps {
    /// Defaults to `standard`
    pub storage_class_name: Option<String>,
    /// Defaults to `0.1Gi`
    pub capacity: Option<Quantity>,
}

/// Statically provisioned volume `id`, pre-bound to claim `<id>-claim`.
pub fn new_persistent_volume(
    chart: &mut Chart,
    id: &str,
    props: PersistentVolumeProps,
) -> Result<PersistentVolumeResource> {
    let claim_props = ClaimProps {
        storage_class_name: props.storage_class_name,
        capacity: props.capacity,
        volume_name: Some(chart.generate_name(id)),
    };
    let storage_class_name = claim_props.storage_class_or_default();
    let capacity = claim_props.capacity_or_default();

    let claim = new_claim(chart, &format!("{}-claim", id), claim_props)?;

    let persistent_volume = PersistentVolume {
        metadata: ObjectMeta::default(),
        spec: Some(PersistentVolumeSpec {
            volume_mode: Some("Filesystem".to_string()),
            access_modes: Some(vec![
                "ReadWriteOnce".to_string(),
                "ReadOnlyMany".to_string(),
            ]),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            capacity: Some(BTreeMap::from([("storage".to_string(), capacity)])),
            storage_class_name: Some(storage_class_name),
            claim_ref: Some(ObjectReference {
                api_version: Some("v1".to_string()),
                kind: Some("PersistentVolumeClaim".to_string()),
                name: Some(claim.name.clone()),
                namespace: claim.namespace.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    let persistent_volume = chart.add(id, persistent_volume)?;

    debug!(
        id,
        persistent_volume = %persistent_volume.name,
        claim = %claim.name,
        "created persistent volume"
    );

    Ok(PersistentVolumeResource {
        persistent_volume,
        volume: claim_volume(&claim),
        claim,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ChartProps;
    use serde_json::json;

    #[test]
    fn test_persistent_volume_bound_to_claim() {
        let mut chart = Chart::new(
            "db",
            ChartProps {
                namespace: Some("data".to_string()),
                disable_resource_name_hashes: true,
                ..Default::default()
            },
        );
        let resource = new_persistent_volume(&mut chart, "pgdata", PersistentVolumeProps::default()).unwrap();

        assert_eq!(resource.persistent_volume.name, "db-pgdata");
        assert_eq!(resource.persistent_volume.namespace, None);
        assert_eq!(resource.claim.name, "db-pgdata-claim");
        assert_eq!(resource.volume.name, "db-pgdata-claim");

        let claim = chart.api_object("pgdata-claim").unwrap().to_json().unwrap();
        assert_eq!(claim.pointer("/spec/volumeName"), Some(&json!("db-pgdata")));
        assert_eq!(claim.pointer("/metadata/namespace"), Some(&json!("data")));

        let pv = chart.api_object("pgdata").unwrap().to_json().unwrap();
        assert_eq!(pv["kind"], json!("PersistentVolume"));
        assert!(pv.pointer("/metadata/namespace").is_none());
        assert_eq!(pv.pointer("/spec/volumeMode"), Some(&json!("Filesystem")));
        assert_eq!(pv.pointer("/spec/accessModes/1"), Some(&json!("ReadOnlyMany")));
        assert_eq!(pv.pointer("/spec/persistentVolumeReclaimPolicy"), Some(&json!("Retain")));
        assert_eq!(pv.pointer("/spec/capacity/storage"), Some(&json!("0.1Gi")));
        assert_eq!(pv.pointer("/spec/storageClassName"), Some(&json!("standard")));
        assert_eq!(pv.pointer("/spec/claimRef/name"), Some(&json!("db-pgdata-claim")));
        assert_eq!(pv.pointer("/spec/claimRef/namespace"), Some(&json!("data")));
    }
}
