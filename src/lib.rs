//! kubekit - Kubernetes manifest generation helpers
//!
//! Builds typed Kubernetes objects for common workload shapes and writes
//! them out as multi-document YAML.
//!
//! # Architecture
//!
//! ```text
//! stack.yaml ──▶ config ──▶ stack::build_app ──▶ factories ──▶ Chart ──▶ App::synth ──▶ dist/
//! ```
//!
//! # Modules
//!
//! - [`construct`] - App/Chart/ApiObject tree, naming and JSON patches
//! - [`deployments`] - Backend and frontend Deployments
//! - [`statefulsets`] - StatefulSets and PostgreSQL
//! - [`volumes`] - Claims, persistent, local and secret volumes
//! - [`storages`] - Local storage class
//! - [`networks`] - Network policies
//! - [`config`] - Stack file configuration
//! - [`stack`] - Stack file to app
//! - [`manifest`] - Manifest validation
//! - [`error`] - Error types

pub mod config;
pub mod construct;
pub mod deployments;
pub mod error;
pub mod manifest;
pub mod networks;
pub mod stack;
pub mod statefulsets;
pub mod storages;
pub mod volumes;
pub mod workload;

// Re-export commonly used types
pub use config::StackConfig;
pub use construct::{ApiObject, App, AppProps, Chart, ChartProps, JsonPatch, ObjectRef, YamlOutputType};
pub use error::{Error, Result};
pub use stack::build_app;
pub use workload::{ResolvedPorts, ServicePorts};
