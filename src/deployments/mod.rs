//! Deployment-based workloads
//!
//! - [`new_backend`]: Deployment + ClusterIP Service
//! - [`new_frontend`]: backend + TLS Ingress

mod backend;
mod frontend;

pub use backend::{new_backend, BackendProps, BackendResource};
pub use frontend::{new_frontend, FrontendProps, FrontendResource, CLUSTER_ISSUER_ANNOTATION};
