//! Storage classes

mod local_storage;

pub use local_storage::{
    new_local_storage, LocalStorageProps, DEFAULT_CLASS_ANNOTATION, NO_PROVISIONER,
};
