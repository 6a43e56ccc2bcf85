//! Registered api objects

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::patch::{apply_patches, JsonPatch};
use crate::error::Result;

/// Handle to an object registered in a [`Chart`](super::Chart).
///
/// Factories return handles instead of references so the chart keeps
/// ownership of its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Construct id, unique within the chart
    pub id: String,
    /// `metadata.name`
    pub name: String,
    /// Kubernetes kind
    pub kind: String,
    /// `metadata.namespace`, unset for cluster-scoped kinds
    pub namespace: Option<String>,
}

/// A Kubernetes object as registered in a chart, plus the JSON patches
/// queued against it.
#[derive(Debug, Clone)]
pub struct ApiObject {
    id: String,
    name: String,
    kind: String,
    api_version: String,
    namespace: Option<String>,
    body: Value,
    patches: Vec<JsonPatch>,
}

impl ApiObject {
    pub(crate) fn new(
        id: String,
        name: String,
        kind: &str,
        api_version: &str,
        namespace: Option<String>,
        body: Value,
    ) -> Self {
        Self {
            id,
            name,
            kind: kind.to_string(),
            api_version: api_version.to_string(),
            namespace,
            body,
            patches: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Handle for wiring this object into others.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Queue a JSON patch. Patches run in insertion order on render.
    pub fn add_json_patch(&mut self, patch: JsonPatch) -> &mut Self {
        debug!(object = %self.name, op = %patch.as_json(), "queued json patch");
        self.patches.push(patch);
        self
    }

    pub fn patches(&self) -> &[JsonPatch] {
        &self.patches
    }

    /// Set `metadata.labels[key]`.
    pub fn add_label(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some(labels) = self.metadata_map("labels") {
            labels.insert(key.to_string(), Value::String(value.to_string()));
        }
        self
    }

    /// Set `metadata.annotations[key]`.
    pub fn add_annotation(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some(annotations) = self.metadata_map("annotations") {
            annotations.insert(key.to_string(), Value::String(value.to_string()));
        }
        self
    }

    /// Render the final manifest: queued patches applied, nulls stripped.
    pub fn to_json(&self) -> Result<Value> {
        let mut doc = self.body.clone();
        apply_patches(&format!("{}/{}", self.kind, self.name), &mut doc, &self.patches)?;
        strip_nulls(&mut doc);
        Ok(doc)
    }

    /// Render and read the manifest back as a typed object.
    pub fn to_typed<K: DeserializeOwned>(&self) -> Result<K> {
        Ok(serde_json::from_value(self.to_json()?)?)
    }

    fn metadata_map(&mut self, field: &str) -> Option<&mut Map<String, Value>> {
        self.body
            .as_object_mut()?
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?
            .entry(field)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}
