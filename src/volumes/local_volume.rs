use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde_json::json;

use super::persistent_volume::{
    new_persistent_volume, PersistentVolumeProps, PersistentVolumeResource,
};
use crate::construct::{Chart, JsonPatch};
use crate::error::Result;

/// Node label matched by the local volume's node affinity
pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalVolumeProps {
    pub storage_class_name: Option<String>,
    pub capacity: Option<Quantity>,
    /// Hostnames the volume may live on. Defaults to `["master-node"]`
    pub nodes: Option<Vec<String>>,
}

/// A persistent volume backed by `folder` on one of `nodes`.
///
/// `spec.local` and `spec.nodeAffinity` are set through JSON patches on the
/// persistent volume.
pub fn new_local_volume(
    chart: &mut Chart,
    id: &str,
    folder: &str,
    props: LocalVolumeProps,
) -> Result<PersistentVolumeResource> {
    let nodes = props
        .nodes
        .unwrap_or_else(|| vec!["master-node".to_string()]);

    let resource = new_persistent_volume(
        chart,
        id,
        PersistentVolumeProps {
            storage_class_name: props.storage_class_name,
            capacity: props.capacity,
        },
    )?;

    chart
        .api_object_mut(&resource.persistent_volume.id)?
        .add_json_patch(JsonPatch::add("/spec/local", json!({ "path": folder })))
        .add_json_patch(JsonPatch::add(
            "/spec/nodeAffinity",
            json!({
                "required": {
                    "nodeSelectorTerms": [{
                        "matchExpressions": [{
                            "key": HOSTNAME_LABEL,
                            "operator": "In",
                            "values": nodes,
                        }],
                    }],
                },
            }),
        ));

    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ChartProps;
    use k8s_openapi::api::core::v1::PersistentVolume;

    fn chart() -> Chart {
        Chart::new(
            "storage",
            ChartProps {
                disable_resource_name_hashes: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_local_volume_patches() {
        let mut chart = chart();
        let props = LocalVolumeProps {
            storage_class_name: Some("local-storage".to_string()),
            nodes: Some(vec!["node-a".to_string(), "node-b".to_string()]),
            ..Default::default()
        };
        let resource = new_local_volume(&mut chart, "pgdata", "/mnt/pgdata", props).unwrap();

        let pv = chart.api_object(&resource.persistent_volume.id).unwrap();
        assert_eq!(pv.patches().len(), 2);

        let doc = pv.to_json().unwrap();
        assert_eq!(doc.pointer("/spec/local/path"), Some(&json!("/mnt/pgdata")));
        let expr = doc
            .pointer("/spec/nodeAffinity/required/nodeSelectorTerms/0/matchExpressions/0")
            .unwrap();
        assert_eq!(expr["key"], json!("kubernetes.io/hostname"));
        assert_eq!(expr["operator"], json!("In"));
        assert_eq!(expr["values"], json!(["node-a", "node-b"]));
        assert_eq!(doc.pointer("/spec/storageClassName"), Some(&json!("local-storage")));
    }

    #[test]
    fn test_local_volume_default_node_and_typed_roundtrip() {
        let mut chart = chart();
        new_local_volume(&mut chart, "data", "/srv/data", LocalVolumeProps::default()).unwrap();

        let pv: PersistentVolume = chart.api_object("data").unwrap().to_typed().unwrap();
        let spec = pv.spec.unwrap();
        assert_eq!(spec.local.unwrap().path, "/srv/data");
        let terms = spec.node_affinity.unwrap().required.unwrap().node_selector_terms;
        let values = terms[0].match_expressions.as_ref().unwrap()[0].values.clone();
        assert_eq!(values, Some(vec!["master-node".to_string()]));
    }
}
