//! Charts: the scope factories register objects into

use std::any::TypeId;
use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{Metadata, NamespaceResourceScope, Resource};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::api_object::{ApiObject, ObjectRef};
use super::names::to_dns_label;
use crate::error::{Error, Result};

/// Chart-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartProps {
    /// Namespace applied to every namespaced object
    pub namespace: Option<String>,

    /// Labels merged into every object. Labels set on the object win.
    pub labels: BTreeMap<String, String>,

    /// Generate `<chart>-<id>` instead of `<chart>-<id>-<hash>`
    pub disable_resource_name_hashes: bool,
}

/// A named group of api objects, synthesized into one manifest file.
#[derive(Debug, Clone)]
pub struct Chart {
    id: String,
    props: ChartProps,
    objects: Vec<ApiObject>,
}

impl Chart {
    pub fn new(id: impl Into<String>, props: ChartProps) -> Self {
        Self {
            id: id.into(),
            props,
            objects: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.props.namespace.as_deref()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.props.labels
    }

    /// Name that [`Chart::add`] gives an unnamed object registered as `id`.
    pub fn generate_name(&self, id: &str) -> String {
        to_dns_label(&[&self.id, id], !self.props.disable_resource_name_hashes)
    }

    /// Register a typed object under `id`.
    ///
    /// Unnamed objects get [`Chart::generate_name`]. Namespaced kinds get the
    /// chart namespace unless they carry their own.
    pub fn add<K>(&mut self, id: &str, mut object: K) -> Result<ObjectRef>
    where
        K: Resource + Metadata<Ty = ObjectMeta> + Serialize,
        K::Scope: 'static,
    {
        if self.objects.iter().any(|o| o.id() == id) {
            return Err(Error::DuplicateId {
                scope: self.id.clone(),
                id: id.to_string(),
            });
        }

        let generated = self.generate_name(id);
        let metadata = object.metadata_mut();
        let name = metadata.name.get_or_insert(generated).clone();

        if is_namespaced::<K>() {
            if let Some(namespace) = &self.props.namespace {
                metadata.namespace.get_or_insert_with(|| namespace.clone());
            }
        }

        if !self.props.labels.is_empty() {
            let labels = metadata.labels.get_or_insert_with(BTreeMap::new);
            for (key, value) in &self.props.labels {
                labels.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        let namespace = metadata.namespace.clone();
        let body = serde_json::to_value(&object)?;
        let api_object = ApiObject::new(
            id.to_string(),
            name,
            K::KIND,
            K::API_VERSION,
            namespace,
            body,
        );

        debug!(
            chart = %self.id,
            id,
            kind = K::KIND,
            name = %api_object.name(),
            "registered api object"
        );

        let object_ref = api_object.object_ref();
        self.objects.push(api_object);
        Ok(object_ref)
    }

    pub fn objects(&self) -> &[ApiObject] {
        &self.objects
    }

    pub fn api_object(&self, id: &str) -> Option<&ApiObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Mutable access for labels, annotations and JSON patches.
    pub fn api_object_mut(&mut self, id: &str) -> Result<&mut ApiObject> {
        let chart = self.id.clone();
        self.objects
            .iter_mut()
            .find(|o| o.id() == id)
            .ok_or_else(|| Error::ObjectNotFound {
                chart,
                id: id.to_string(),
            })
    }

    /// Render every object, in registration order.
    pub fn to_json(&self) -> Result<Vec<Value>> {
        self.objects.iter().map(ApiObject::to_json).collect()
    }

    /// Render every object as one multi-document YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        to_yaml_documents(&self.to_json()?)
    }
}

fn is_namespaced<K>() -> bool
where
    K: Resource,
    K::Scope: 'static,
{
    TypeId::of::<K::Scope>() == TypeId::of::<NamespaceResourceScope>()
}

/// Join documents with `---` separators.
pub(crate) fn to_yaml_documents(docs: &[Value]) -> Result<String> {
    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(doc)?);
    }
    Ok(out)
}
