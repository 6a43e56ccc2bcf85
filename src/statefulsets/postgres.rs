use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ExecAction, PersistentVolumeClaim, PersistentVolumeClaimSpec, Probe,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::statefulset::{new_stateful_set, StatefulSetProps};
use crate::construct::{Chart, ObjectRef};
use crate::error::Result;
use crate::volumes::{new_secret_volume, SecretVolumeProps, DEFAULT_CAPACITY, DEFAULT_STORAGE_CLASS};
use crate::workload::{service_labels, ResolvedPorts, ServicePorts};

pub const DEFAULT_POSTGRES_IMAGE: &str = "postgres:latest";
pub const DEFAULT_POSTGRES_PORT: i32 = 5432;
const DEFAULT_CREDENTIAL: &str = "postgres";
const DEFAULT_SECRET_PREFIX: &str = "postgres";
const DEFAULT_PERSISTENT_PREFIX: &str = "persistent-volume";
const DATA_DIR: &str = "/var/lib/postgresql/data";

/// Objects created by [`new_postgres`], plus the settings they were built from
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresResource {
    pub stateful_set: ObjectRef,
    pub service: ObjectRef,
    /// Database name, user and password secrets, in that order
    pub secrets: Vec<ObjectRef>,
    pub settings: PostgresSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresDatabase {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostgresVolumeSettings {
    /// Key of the database-name secret; user and password keys append
    /// `-user` and `-passwd`
    pub prefix_secret_name: Option<String>,
    /// Data claim template is named `<prefix>-claim`. Defaults to
    /// `persistent-volume`
    pub prefix_persistent_name: Option<String>,
    pub storage_class_name: Option<String>,
    pub capacity: Option<Quantity>,
    /// Replaces the generated data claim template entirely
    pub volume_claim_template: Option<PersistentVolumeClaim>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostgresProps {
    pub image: Option<String>,
    pub database: PostgresDatabase,
    /// Defaults to 5432 -> 5432
    pub ports: ServicePorts,
    pub volume_settings: PostgresVolumeSettings,
    pub network: Option<String>,
    pub liveness: Option<Probe>,
}

/// [`PostgresProps`] with every default filled in
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresSettings {
    pub image: String,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub ports: ResolvedPorts,
    pub prefix_secret_name: String,
    pub prefix_persistent_name: String,
    pub storage_class_name: String,
    pub capacity: Quantity,
    pub volume_claim_template: PersistentVolumeClaim,
    pub network: Option<String>,
    pub liveness: Probe,
}

impl PostgresProps {
    /// Fill in defaults. `id` labels the generated claim template.
    pub fn resolve(self, id: &str) -> PostgresSettings {
        let volume = self.volume_settings;
        let prefix_secret_name = volume
            .prefix_secret_name
            .unwrap_or_else(|| DEFAULT_SECRET_PREFIX.to_string());
        let prefix_persistent_name = volume
            .prefix_persistent_name
            .unwrap_or_else(|| DEFAULT_PERSISTENT_PREFIX.to_string());
        let storage_class_name = volume
            .storage_class_name
            .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_string());
        let capacity = volume
            .capacity
            .unwrap_or_else(|| Quantity(DEFAULT_CAPACITY.to_string()));
        let volume_claim_template = volume.volume_claim_template.unwrap_or_else(|| {
            data_claim_template(
                id,
                &format!("{}-claim", prefix_persistent_name),
                &capacity,
                &storage_class_name,
            )
        });

        PostgresSettings {
            image: self
                .image
                .unwrap_or_else(|| DEFAULT_POSTGRES_IMAGE.to_string()),
            database_name: self
                .database
                .name
                .unwrap_or_else(|| DEFAULT_CREDENTIAL.to_string()),
            username: self
                .database
                .username
                .unwrap_or_else(|| DEFAULT_CREDENTIAL.to_string()),
            password: self
                .database
                .password
                .unwrap_or_else(|| DEFAULT_CREDENTIAL.to_string()),
            ports: self
                .ports
                .resolve(DEFAULT_POSTGRES_PORT, DEFAULT_POSTGRES_PORT),
            prefix_secret_name,
            prefix_persistent_name,
            storage_class_name,
            capacity,
            volume_claim_template,
            network: self.network,
            liveness: self.liveness.unwrap_or_else(pg_isready_probe),
        }
    }
}

fn data_claim_template(
    id: &str,
    name: &str,
    capacity: &Quantity,
    storage_class_name: &str,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(service_labels(id)),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([("storage".to_string(), capacity.clone())])),
                ..Default::default()
            }),
            storage_class_name: Some(storage_class_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn pg_isready_probe() -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                "exec pg_isready -h 127.0.0.1".to_string(),
            ]),
        }),
        failure_threshold: Some(5),
        period_seconds: Some(5),
        timeout_seconds: Some(5),
        ..Default::default()
    }
}

/// PostgreSQL as a stateful set.
///
/// Credentials live in three secrets mounted under `/run/secrets/<key>` and
/// are passed through the image's `POSTGRES_*_FILE` variables. Data lives on
/// a claim template mounted at `/var/lib/postgresql/data`.
pub fn new_postgres(chart: &mut Chart, id: &str, props: PostgresProps) -> Result<PostgresResource> {
    let settings = props.resolve(id);
    let prefix = &settings.prefix_secret_name;

    let credentials = [
        ("name-secret", prefix.clone(), &settings.database_name),
        ("user-secret", format!("{}-user", prefix), &settings.username),
        ("passwd-secret", format!("{}-passwd", prefix), &settings.password),
    ];

    let mut volumes = BTreeMap::new();
    let mut secrets = Vec::with_capacity(credentials.len());
    for (secret_id, key, value) in &credentials {
        let secret = new_secret_volume(chart, secret_id, key, value, SecretVolumeProps::default())?;
        volumes.insert(format!("/run/secrets/{}", key), secret.volume);
        secrets.push(secret.secret);
    }

    let secret_file = |key: &str| format!("/run/secrets/{0}/{0}", key);
    let variables = BTreeMap::from([
        ("POSTGRES_DB_FILE".to_string(), secret_file(prefix)),
        (
            "POSTGRES_USER_FILE".to_string(),
            secret_file(&format!("{}-user", prefix)),
        ),
        (
            "POSTGRES_PASSWORD_FILE".to_string(),
            secret_file(&format!("{}-passwd", prefix)),
        ),
    ]);

    let stateful_set = new_stateful_set(
        chart,
        id,
        &settings.image,
        StatefulSetProps {
            ports: ServicePorts::new(settings.ports.port, settings.ports.container_port),
            network: settings.network.clone(),
            variables,
            volumes,
            volume_claim_templates: BTreeMap::from([(
                DATA_DIR.to_string(),
                settings.volume_claim_template.clone(),
            )]),
            liveness: Some(settings.liveness.clone()),
        },
    )?;

    debug!(id, image = %settings.image, "created postgres");

    Ok(PostgresResource {
        stateful_set: stateful_set.stateful_set,
        service: stateful_set.service,
        secrets,
        settings,
    })
}
