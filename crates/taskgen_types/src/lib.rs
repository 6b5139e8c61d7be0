//! Shared data model for the taskgen episode-generation framework.
//!
//! This crate defines the value types that cross the simulation-backend
//! boundary: poses, entity descriptors, namespaces, and the model-provider
//! contract. It deliberately contains no I/O and no engine-specific code;
//! everything here is plain data that the framework crate translates into
//! engine payloads at the adapter boundary.

pub mod types {
    pub mod model;
    pub mod world;
}

pub mod prelude {
    pub use crate::types::model::{EntityModel, ModelProvider, ModelType};
    pub use crate::types::world::{
        EntityDescriptor, EntityKind, Namespace, PositionOrientation, Quaternion,
    };
}
