//! Reading synthesized manifests back
//!
//! Every YAML document must parse as a [`DynamicObject`] with `apiVersion`,
//! `kind` and `metadata.name` set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kube::core::DynamicObject;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Object count per kind
pub type KindCounts = BTreeMap<String, usize>;

/// Parse a multi-document YAML string. `source_name` only shows up in errors.
pub fn parse_manifests(source_name: &str, yaml: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let invalid = |reason: String| Error::InvalidManifest {
            source_name: format!("{} (document {})", source_name, index),
            reason,
        };

        let object: DynamicObject =
            serde_yaml::from_value(value).map_err(|e| invalid(e.to_string()))?;
        let types = object
            .types
            .as_ref()
            .ok_or_else(|| invalid("missing apiVersion or kind".to_string()))?;
        if types.api_version.is_empty() || types.kind.is_empty() {
            return Err(invalid("empty apiVersion or kind".to_string()));
        }
        if object.metadata.name.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("missing metadata.name".to_string()));
        }
        objects.push(object);
    }
    Ok(objects)
}

/// Validate a manifest file, or every `.yaml`/`.yml` file below a directory.
pub fn validate_path(path: impl AsRef<Path>) -> Result<KindCounts> {
    let path = path.as_ref();
    let mut files = Vec::new();
    if path.is_dir() {
        collect_yaml_files(path, &mut files)?;
    } else {
        files.push(path.to_path_buf());
    }

    let mut counts = KindCounts::new();
    for file in files {
        let yaml = fs::read_to_string(&file).map_err(|source| Error::FileRead {
            path: file.clone(),
            source,
        })?;
        let objects = parse_manifests(&file.display().to_string(), &yaml)?;
        debug!(file = %file.display(), objects = objects.len(), "validated manifest");
        for object in objects {
            if let Some(types) = object.types {
                *counts.entry(types.kind).or_default() += 1;
            }
        }
    }
    Ok(counts)
}

fn collect_yaml_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_yaml_files(&path, files)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        ) {
            files.push(path);
        }
    }
    Ok(())
}
