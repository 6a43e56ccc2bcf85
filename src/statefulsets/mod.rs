//! StatefulSet-based workloads
//!
//! - [`new_stateful_set`]: StatefulSet + governing ClusterIP Service
//! - [`new_postgres`]: PostgreSQL with secret-file credentials and a data
//!   claim template

mod postgres;
mod statefulset;

pub use postgres::{
    new_postgres, PostgresDatabase, PostgresProps, PostgresResource, PostgresSettings,
    PostgresVolumeSettings, DEFAULT_POSTGRES_IMAGE, DEFAULT_POSTGRES_PORT,
};
pub use statefulset::{new_stateful_set, StatefulSetProps, StatefulSetResource};
