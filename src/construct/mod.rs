//! Construct tree
//!
//! A minimal app/chart/object tree. Charts give objects their names and
//! namespaces, api objects carry queued JSON patches, and the app writes
//! everything out as multi-document YAML.
//!
//! ```text
//! App ──▶ Chart ──▶ ApiObject (typed body + JSON patches)
//! ```

mod api_object;
mod app;
mod chart;
pub mod names;
mod patch;

pub use api_object::{ApiObject, ObjectRef};
pub use app::{App, AppProps, YamlOutputType};
pub use chart::{Chart, ChartProps};
pub use patch::JsonPatch;
