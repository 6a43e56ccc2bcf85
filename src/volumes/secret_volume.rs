use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use k8s_openapi::api::core::v1::{KeyToPath, Secret, SecretVolumeSource, Volume};
use k8s_openapi::ByteString;
use tracing::debug;

use crate::construct::{Chart, ObjectRef};
use crate::error::{Error, Result};

/// A secret plus the pod volume that projects its single key
#[derive(Debug, Clone, PartialEq)]
pub struct SecretVolumeResource {
    pub volume: Volume,
    pub secret: ObjectRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecretVolumeProps {
    /// `true` (default) stores the value in `stringData`; `false` stores it
    /// base64-encoded in `data`
    pub encrypt: Option<bool>,
}

/// Contents of a single-key secret
enum SecretValue<'a> {
    /// Stored as-is in `stringData`
    Text(&'a str),
    /// Stored base64-encoded in `data`
    Bytes(&'a [u8]),
}

/// Opaque secret `id` holding `value` under `key`, and a volume named `key`
/// that projects it to the file `key`.
///
/// The key doubles as the pod volume name, so it must be a DNS-1123 label
/// (no dots) for the pod spec to be accepted.
pub fn new_secret_volume(
    chart: &mut Chart,
    id: &str,
    key: &str,
    value: &str,
    props: SecretVolumeProps,
) -> Result<SecretVolumeResource> {
    let value = if props.encrypt.unwrap_or(true) {
        SecretValue::Text(value)
    } else {
        SecretValue::Bytes(value.as_bytes())
    };
    add_secret_volume(chart, id, key, value)
}

/// [`new_secret_volume`] with the raw bytes of `path`, stored in `data`.
pub fn secret_volume_from_file(
    chart: &mut Chart,
    id: &str,
    path: impl AsRef<Path>,
    key: &str,
) -> Result<SecretVolumeResource> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    add_secret_volume(chart, id, key, SecretValue::Bytes(&content))
}

fn add_secret_volume(
    chart: &mut Chart,
    id: &str,
    key: &str,
    value: SecretValue<'_>,
) -> Result<SecretVolumeResource> {
    let mut secret = Secret {
        type_: Some("Opaque".to_string()),
        immutable: Some(false),
        ..Default::default()
    };
    let encrypt = match value {
        SecretValue::Text(text) => {
            secret.string_data = Some(BTreeMap::from([(key.to_string(), text.to_string())]));
            true
        }
        SecretValue::Bytes(bytes) => {
            secret.data = Some(BTreeMap::from([(key.to_string(), ByteString(bytes.to_vec()))]));
            false
        }
    };
    let secret = chart.add(id, secret)?;

    let volume = Volume {
        name: key.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.name.clone()),
            items: Some(vec![KeyToPath {
                key: key.to_string(),
                path: key.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    debug!(id, key, secret = %secret.name, encrypt, "created secret volume");

    Ok(SecretVolumeResource { volume, secret })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ChartProps;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::io::Write;

    fn chart() -> Chart {
        Chart::new(
            "app",
            ChartProps {
                disable_resource_name_hashes: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_encrypted_secret_uses_string_data() {
        let mut chart = chart();
        let resource = new_secret_volume(&mut chart, "token", "api-token", "abc", SecretVolumeProps::default()).unwrap();

        assert_eq!(resource.volume.name, "api-token");
        let source = resource.volume.secret.unwrap();
        assert_eq!(source.secret_name.as_deref(), Some("app-token"));
        let item = &source.items.unwrap()[0];
        assert_eq!((item.key.as_str(), item.path.as_str()), ("api-token", "api-token"));

        let doc = chart.api_object("token").unwrap().to_json().unwrap();
        assert_eq!(doc["type"], json!("Opaque"));
        assert_eq!(doc["immutable"], json!(false));
        assert_eq!(doc.pointer("/stringData/api-token"), Some(&json!("abc")));
        assert!(doc.get("data").is_none());
    }

    #[test]
    fn test_plain_secret_uses_base64_data() {
        let mut chart = chart();
        let props = SecretVolumeProps { encrypt: Some(false) };
        new_secret_volume(&mut chart, "token", "api-token", "abc", props).unwrap();

        let doc = chart.api_object("token").unwrap().to_json().unwrap();
        assert_eq!(doc.pointer("/data/api-token"), Some(&json!("YWJj")));
        assert!(doc.get("stringData").is_none());
    }

    #[test]
    fn test_secret_name_follows_chart_hashing() {
        let mut chart = Chart::new("app", ChartProps::default());
        let resource = new_secret_volume(&mut chart, "token", "k", "v", SecretVolumeProps::default()).unwrap();
        assert_eq!(
            resource.volume.secret.unwrap().secret_name,
            Some(chart.generate_name("token"))
        );
    }

    #[test]
    fn test_secret_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-----BEGIN CERT-----").unwrap();

        let mut chart = chart();
        let resource = secret_volume_from_file(&mut chart, "cert", file.path(), "tls.crt").unwrap();
        assert_eq!(resource.volume.name, "tls.crt");

        let secret: Secret = chart.api_object("cert").unwrap().to_typed().unwrap();
        let data = secret.data.unwrap();
        assert_eq!(data.get("tls.crt").map(|b| b.0.as_slice()), Some(&b"-----BEGIN CERT-----"[..]));
    }

    #[test]
    fn test_secret_from_binary_file() {
        let bytes = [0xff_u8, 0xfe, 0x00, 0x01];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let mut chart = chart();
        secret_volume_from_file(&mut chart, "keystore", file.path(), "keystore").unwrap();

        let doc = chart.api_object("keystore").unwrap().to_json().unwrap();
        assert_eq!(doc.pointer("/data/keystore"), Some(&json!("//4AAQ==")));

        let secret: Secret = chart.api_object("keystore").unwrap().to_typed().unwrap();
        assert_eq!(secret.data.unwrap()["keystore"].0, bytes.to_vec());
    }

    #[test]
    fn test_secret_from_missing_file() {
        let mut chart = chart();
        let result = secret_volume_from_file(&mut chart, "cert", "/nonexistent/kubekit/cert.pem", "tls.crt");
        assert_matches!(result, Err(Error::FileRead { .. }));
        assert!(chart.objects().is_empty());
    }
}
