//! JSON patches (RFC 6902) applied to api objects at synthesis time

use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A single RFC 6902 operation.
///
/// Patches are queued on an [`ApiObject`](super::ApiObject) and applied, in
/// order, when the object is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPatch(Value);

impl JsonPatch {
    /// Add `value` at `path`, creating the member or inserting into an array.
    pub fn add(path: &str, value: Value) -> Self {
        Self(json!({ "op": "add", "path": path, "value": value }))
    }

    /// Replace the existing value at `path`.
    pub fn replace(path: &str, value: Value) -> Self {
        Self(json!({ "op": "replace", "path": path, "value": value }))
    }

    /// Remove the value at `path`.
    pub fn remove(path: &str) -> Self {
        Self(json!({ "op": "remove", "path": path }))
    }

    /// Move the value at `from` to `path`.
    pub fn move_(from: &str, path: &str) -> Self {
        Self(json!({ "op": "move", "from": from, "path": path }))
    }

    /// Copy the value at `from` to `path`.
    pub fn copy(from: &str, path: &str) -> Self {
        Self(json!({ "op": "copy", "from": from, "path": path }))
    }

    /// Fail the whole patch set unless `path` holds `value`.
    pub fn test(path: &str, value: Value) -> Self {
        Self(json!({ "op": "test", "path": path, "value": value }))
    }

    /// The operation as a JSON object.
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Apply `patches` to `doc` in order. `object` names the target in errors.
pub(crate) fn apply_patches(object: &str, doc: &mut Value, patches: &[JsonPatch]) -> Result<()> {
    if patches.is_empty() {
        return Ok(());
    }

    let ops = Value::Array(patches.iter().map(|p| p.0.clone()).collect());
    let patch: json_patch::Patch = serde_json::from_value(ops)?;

    json_patch::patch(doc, &patch.0).map_err(|source| Error::JsonPatch {
        object: object.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_add_nested_object() {
        let mut doc = json!({ "spec": { "capacity": { "storage": "1Gi" } } });
        apply_patches(
            "pv",
            &mut doc,
            &[JsonPatch::add("/spec/local", json!({ "path": "/data" }))],
        )
        .unwrap();
        assert_eq!(doc.pointer("/spec/local/path"), Some(&json!("/data")));
    }

    #[test]
    fn test_patches_apply_in_order() {
        let mut doc = json!({ "stringData": { "key": "value" } });
        apply_patches(
            "secret",
            &mut doc,
            &[
                JsonPatch::move_("/stringData", "/data"),
                JsonPatch::replace("/data/key", json!("other")),
            ],
        )
        .unwrap();
        assert_eq!(doc, json!({ "data": { "key": "other" } }));
    }

    #[test]
    fn test_remove_missing_path_fails() {
        let mut doc = json!({ "metadata": {} });
        let result = apply_patches("sc", &mut doc, &[JsonPatch::remove("/metadata/namespace")]);
        assert_matches!(result, Err(Error::JsonPatch { object, .. }) if object == "sc");
    }

    #[test]
    fn test_failed_test_op_rejects_patch_set() {
        let mut doc = json!({ "kind": "Service" });
        let result = apply_patches(
            "svc",
            &mut doc,
            &[
                JsonPatch::test("/kind", json!("Deployment")),
                JsonPatch::add("/spec", json!({})),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_copy_duplicates_value() {
        let mut doc = json!({ "a": [1, 2] });
        apply_patches("obj", &mut doc, &[JsonPatch::copy("/a", "/b")]).unwrap();
        assert_eq!(doc.pointer("/b"), Some(&json!([1, 2])));
    }
}
