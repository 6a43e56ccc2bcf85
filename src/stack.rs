//! Turns a [`StackConfig`] into an [`App`] by calling the factories

use std::collections::BTreeMap;
use std::path::Path;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, Volume, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::{debug, info};

use crate::config::{
    BackendConfig, ChartConfig, ClaimTemplateConfig, ComponentConfig, StackConfig,
};
use crate::construct::{App, AppProps, Chart, ChartProps, YamlOutputType};
use crate::deployments::{new_backend, new_frontend, BackendProps, FrontendProps};
use crate::error::Result;
use crate::networks::new_network_policy;
use crate::statefulsets::{
    new_postgres, new_stateful_set, PostgresDatabase, PostgresProps, PostgresVolumeSettings,
    StatefulSetProps,
};
use crate::storages::{new_local_storage, LocalStorageProps};
use crate::volumes::{
    new_local_volume, new_persistent_volume, new_volume, secret_volume_from_file,
    LocalVolumeProps, PersistentVolumeProps, VolumeProps, DEFAULT_CAPACITY,
};

/// Build every chart of `config`. Relative secret file paths resolve against
/// `base_dir`, normally the stack file's directory.
pub fn build_app(config: &StackConfig, base_dir: &Path) -> Result<App> {
    config.validate()?;

    let mut props = AppProps::default();
    if let Some(outdir) = &config.outdir {
        props.outdir = outdir.clone();
    }
    if config.file_per_resource {
        props.yaml_output_type = YamlOutputType::FilePerResource;
    }

    let mut app = App::new(props);
    for chart_config in &config.charts {
        let chart = build_chart(chart_config, base_dir)?;
        info!(
            chart = %chart.id(),
            objects = chart.objects().len(),
            "built chart"
        );
        app.add_chart(chart)?;
    }
    Ok(app)
}

fn build_chart(config: &ChartConfig, base_dir: &Path) -> Result<Chart> {
    let mut chart = Chart::new(
        config.id.clone(),
        ChartProps {
            namespace: config.namespace.clone(),
            labels: config.labels.clone(),
            disable_resource_name_hashes: config.disable_resource_name_hashes,
        },
    );

    for component in &config.components {
        debug!(chart = %config.id, component = component.id(), "building component");
        build_component(&mut chart, component, base_dir)?;
    }
    Ok(chart)
}

fn build_component(chart: &mut Chart, component: &ComponentConfig, base_dir: &Path) -> Result<()> {
    match component {
        ComponentConfig::Backend(c) => {
            let props = backend_props(chart, c, base_dir)?;
            new_backend(chart, &c.id, &c.image, props)?;
        }
        ComponentConfig::Frontend(c) => {
            let backend = backend_props(chart, &c.backend, base_dir)?;
            let props = FrontendProps {
                ports: backend.ports,
                network: backend.network,
                variables: backend.variables,
                volumes: backend.volumes,
                cluster_issuer: c.cluster_issuer.clone(),
            };
            new_frontend(chart, &c.backend.id, &c.host, &c.backend.image, props)?;
        }
        ComponentConfig::StatefulSet(c) => {
            let props = StatefulSetProps {
                ports: c.ports,
                network: c.network.clone(),
                variables: c.variables.clone(),
                volume_claim_templates: c
                    .claim_templates
                    .iter()
                    .map(|(path, template)| (path.clone(), claim_template(&c.id, template)))
                    .collect(),
                ..Default::default()
            };
            new_stateful_set(chart, &c.id, &c.image, props)?;
        }
        ComponentConfig::Postgres(c) => {
            let props = PostgresProps {
                image: c.image.clone(),
                database: PostgresDatabase {
                    name: c.database.clone(),
                    username: c.username.clone(),
                    password: c.password.clone(),
                },
                ports: c.ports,
                volume_settings: PostgresVolumeSettings {
                    prefix_secret_name: c.prefix_secret_name.clone(),
                    prefix_persistent_name: c.prefix_persistent_name.clone(),
                    storage_class_name: c.storage_class_name.clone(),
                    capacity: quantity(&c.capacity),
                    volume_claim_template: None,
                },
                network: c.network.clone(),
                liveness: None,
            };
            new_postgres(chart, &c.id, props)?;
        }
        ComponentConfig::Volume(c) => {
            let props = VolumeProps {
                storage_class_name: c.storage_class_name.clone(),
                capacity: quantity(&c.capacity),
            };
            new_volume(chart, &c.id, props)?;
        }
        ComponentConfig::PersistentVolume(c) => {
            let props = PersistentVolumeProps {
                storage_class_name: c.storage_class_name.clone(),
                capacity: quantity(&c.capacity),
            };
            new_persistent_volume(chart, &c.id, props)?;
        }
        ComponentConfig::LocalVolume(c) => {
            let props = LocalVolumeProps {
                storage_class_name: c.storage_class_name.clone(),
                capacity: quantity(&c.capacity),
                nodes: c.nodes.clone(),
            };
            new_local_volume(chart, &c.id, &c.folder, props)?;
        }
        ComponentConfig::LocalStorage(c) => {
            let props = LocalStorageProps {
                is_default: c.is_default,
            };
            new_local_storage(chart, &c.id, props)?;
        }
        ComponentConfig::NetworkPolicy(c) => {
            new_network_policy(chart, &c.id, &c.network)?;
        }
    }
    Ok(())
}

/// Creates the claims and secrets a backend mounts, then its props.
fn backend_props(chart: &mut Chart, config: &BackendConfig, base_dir: &Path) -> Result<BackendProps> {
    let mut volumes: BTreeMap<String, Volume> = BTreeMap::new();

    for (mount_path, claim) in &config.claims {
        let id = claim
            .id
            .clone()
            .unwrap_or_else(|| default_claim_id(&config.id, mount_path));
        let resource = new_volume(
            chart,
            &id,
            VolumeProps {
                storage_class_name: claim.storage_class_name.clone(),
                capacity: quantity(&claim.capacity),
            },
        )?;
        volumes.insert(mount_path.clone(), resource.volume);
    }

    for (mount_path, secret) in &config.secret_files {
        let path = base_dir.join(&secret.path);
        let id = format!("{}-{}-secret", config.id, secret.key.replace('.', "-"));
        let resource = secret_volume_from_file(chart, &id, &path, &secret.key)?;
        volumes.insert(mount_path.clone(), resource.volume);
    }

    Ok(BackendProps {
        ports: config.ports,
        network: config.network.clone(),
        variables: config.variables.clone(),
        volumes,
    })
}

fn default_claim_id(owner: &str, mount_path: &str) -> String {
    let last = mount_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("data");
    format!("{}-{}", owner, last)
}

fn claim_template(owner: &str, config: &ClaimTemplateConfig) -> PersistentVolumeClaim {
    let capacity = quantity(&config.capacity).unwrap_or_else(|| Quantity(DEFAULT_CAPACITY.to_string()));
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(config.name.clone()),
            labels: Some(BTreeMap::from([(
                crate::workload::SERVICE_LABEL.to_string(),
                owner.to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([("storage".to_string(), capacity)])),
                ..Default::default()
            }),
            storage_class_name: config.storage_class_name.clone(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn quantity(value: &Option<String>) -> Option<Quantity> {
    value.clone().map(Quantity)
}
