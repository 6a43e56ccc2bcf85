use k8s_openapi::api::core::v1::{PersistentVolumeClaimVolumeSource, Volume};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use super::claim::{new_claim, ClaimProps};
use crate::construct::{Chart, ObjectRef};
use crate::error::Result;

/// A claim plus the pod volume that mounts it
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeResource {
    pub volume: Volume,
    pub claim: ObjectRef,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeProps {
    pub storage_class_name: Option<String>,
    pub capacity: Option<Quantity>,
}

/// Claim `<id>-claim` and a pod volume of the same name referencing it.
pub fn new_volume(chart: &mut Chart, id: &str, props: VolumeProps) -> Result<VolumeResource> {
    let claim = new_claim(
        chart,
        &format!("{}-claim", id),
        ClaimProps {
            storage_class_name: props.storage_class_name,
            capacity: props.capacity,
            volume_name: None,
        },
    )?;

    Ok(VolumeResource {
        volume: claim_volume(&claim),
        claim,
    })
}

pub(crate) fn claim_volume(claim: &ObjectRef) -> Volume {
    Volume {
        name: claim.name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: claim.name.clone(),
            read_only: Some(false),
        }),
        ..Default::default()
    }
}
