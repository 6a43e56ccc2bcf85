//! Stack file configuration
//!
//! A stack file lists charts and the components each chart holds:
//!
//! ```yaml
//! outdir: dist
//! charts:
//!   - id: web
//!     namespace: apps
//!     components:
//!       - kind: frontend
//!         id: web
//!         host: example.com
//!         image: ghcr.io/acme/web:1.0
//!         clusterIssuer: letsencrypt
//!         network: web-net
//!       - kind: networkPolicy
//!         id: web-net
//!         network: web-net
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::workload::ServicePorts;

/// Root of a stack file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackConfig {
    /// Output directory, relative to the working directory
    #[serde(default)]
    pub outdir: Option<PathBuf>,

    /// Write one file per object instead of one per chart
    #[serde(default)]
    pub file_per_resource: bool,

    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChartConfig {
    pub id: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub disable_resource_name_hashes: bool,

    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// One factory call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComponentConfig {
    Backend(BackendConfig),
    Frontend(FrontendConfig),
    StatefulSet(StatefulSetConfig),
    Postgres(PostgresConfig),
    Volume(VolumeConfig),
    PersistentVolume(VolumeConfig),
    LocalVolume(LocalVolumeConfig),
    LocalStorage(LocalStorageConfig),
    NetworkPolicy(NetworkPolicyConfig),
}

impl ComponentConfig {
    pub fn id(&self) -> &str {
        match self {
            ComponentConfig::Backend(c) => &c.id,
            ComponentConfig::Frontend(c) => &c.backend.id,
            ComponentConfig::StatefulSet(c) => &c.id,
            ComponentConfig::Postgres(c) => &c.id,
            ComponentConfig::Volume(c) | ComponentConfig::PersistentVolume(c) => &c.id,
            ComponentConfig::LocalVolume(c) => &c.id,
            ComponentConfig::LocalStorage(c) => &c.id,
            ComponentConfig::NetworkPolicy(c) => &c.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub ports: ServicePorts,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Mount path -> claim-backed volume
    #[serde(default)]
    pub claims: BTreeMap<String, ClaimMountConfig>,
    /// Mount path -> file-backed secret
    #[serde(default)]
    pub secret_files: BTreeMap<String, SecretFileConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendConfig {
    #[serde(flatten)]
    pub backend: BackendConfig,
    pub host: String,
    #[serde(default)]
    pub cluster_issuer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClaimMountConfig {
    /// Claim id; defaults to the last path segment of the mount path
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretFileConfig {
    /// File to read, relative to the stack file
    pub path: PathBuf,
    /// Key and file name inside the mounted volume. Also names the pod
    /// volume, so it must be a DNS-1123 label
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatefulSetConfig {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub ports: ServicePorts,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Mount path -> claim template
    #[serde(default)]
    pub claim_templates: BTreeMap<String, ClaimTemplateConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClaimTemplateConfig {
    pub name: String,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostgresConfig {
    pub id: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ports: ServicePorts,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub prefix_secret_name: Option<String>,
    #[serde(default)]
    pub prefix_persistent_name: Option<String>,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VolumeConfig {
    pub id: String,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalVolumeConfig {
    pub id: String,
    pub folder: String,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalStorageConfig {
    pub id: String,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkPolicyConfig {
    pub id: String,
    pub network: String,
}

impl StackConfig {
    /// Parse a stack file from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: StackConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a stack file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Reject configs the factories would only fail on halfway through.
    pub fn validate(&self) -> Result<()> {
        let mut chart_ids = std::collections::BTreeSet::new();
        for chart in &self.charts {
            if chart.id.trim().is_empty() {
                return Err(Error::Config("chart id must not be empty".to_string()));
            }
            if !chart_ids.insert(chart.id.as_str()) {
                return Err(Error::Config(format!("duplicate chart id '{}'", chart.id)));
            }
            for component in &chart.components {
                if component.id().trim().is_empty() {
                    return Err(Error::Config(format!(
                        "component in chart '{}' has an empty id",
                        chart.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const STACK: &str = r#"
outdir: out
charts:
  - id: web
    namespace: apps
    labels:
      team: platform
    components:
      - kind: frontend
        id: web
        host: example.com
        image: web:1.0
        clusterIssuer: letsencrypt
        ports:
          port: 8000
        secretFiles:
          /etc/web/tls:
            path: certs/tls.crt
            key: tls.crt
      - kind: networkPolicy
        id: web-net
        network: web-net
  - id: db
    components:
      - kind: postgres
        id: db
        password: hunter2
        capacity: 1Gi
      - kind: localStorage
        id: local
        isDefault: true
"#;

    #[test]
    fn test_parse_stack() {
        let config = StackConfig::from_yaml(STACK).unwrap();
        assert_eq!(config.outdir, Some(PathBuf::from("out")));
        assert_eq!(config.charts.len(), 2);

        let web = &config.charts[0];
        assert_eq!(web.namespace.as_deref(), Some("apps"));
        assert_matches!(&web.components[0], ComponentConfig::Frontend(f) => {
            assert_eq!(f.host, "example.com");
            assert_eq!(f.backend.image, "web:1.0");
            assert_eq!(f.backend.ports.port, Some(8000));
            assert_eq!(f.backend.ports.container_port, None);
            assert_eq!(f.backend.secret_files["/etc/web/tls"].key, "tls.crt");
        });
        assert_eq!(web.components[1].id(), "web-net");

        assert_matches!(&config.charts[1].components[0], ComponentConfig::Postgres(p) => {
            assert_eq!(p.password.as_deref(), Some("hunter2"));
            assert_eq!(p.capacity.as_deref(), Some("1Gi"));
        });
        assert_matches!(
            &config.charts[1].components[1],
            ComponentConfig::LocalStorage(LocalStorageConfig { is_default: Some(true), .. })
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let yaml = "charts:\n  - id: a\n    components:\n      - kind: cronJob\n        id: x\n";
        assert_matches!(StackConfig::from_yaml(yaml), Err(Error::Yaml(_)));
    }

    #[test]
    fn test_duplicate_chart_rejected() {
        let yaml = "charts:\n  - id: a\n  - id: a\n";
        assert_matches!(StackConfig::from_yaml(yaml), Err(Error::Config(msg)) if msg.contains("duplicate"));
    }

    #[test]
    fn test_empty_component_id_rejected() {
        let yaml = "charts:\n  - id: a\n    components:\n      - kind: localStorage\n        id: ''\n";
        assert_matches!(StackConfig::from_yaml(yaml), Err(Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        assert_matches!(
            StackConfig::load("/nonexistent/kubekit/stack.yaml"),
            Err(Error::FileRead { .. })
        );
    }
}
