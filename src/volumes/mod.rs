//! Volumes and the objects backing them
//!
//! - [`new_claim`]: PersistentVolumeClaim
//! - [`new_volume`]: claim + pod volume
//! - [`new_persistent_volume`]: PersistentVolume pre-bound to a claim
//! - [`new_local_volume`]: persistent volume on a node-local folder
//! - [`new_secret_volume`], [`secret_volume_from_file`]: Secret + pod volume

mod claim;
mod local_volume;
mod persistent_volume;
mod secret_volume;
mod volume;

pub use claim::{new_claim, ClaimProps, DEFAULT_CAPACITY, DEFAULT_STORAGE_CLASS};
pub use local_volume::{new_local_volume, LocalVolumeProps, HOSTNAME_LABEL};
pub use persistent_volume::{new_persistent_volume, PersistentVolumeProps, PersistentVolumeResource};
pub use secret_volume::{
    new_secret_volume, secret_volume_from_file, SecretVolumeProps, SecretVolumeResource,
};
pub use volume::{new_volume, VolumeProps, VolumeResource};
