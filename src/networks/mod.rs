//! Network policies

mod network_policy;

pub use network_policy::new_network_policy;
