//! Model-provider boundary.
//!
//! Entity models are opaque serialized documents (SDF, URDF) produced by an
//! external collaborator. The framework forwards them verbatim to the
//! engine; nothing in this workspace parses or validates their content.

use serde::{Deserialize, Serialize};

/// Supported model document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    Sdf,
    Urdf,
}

impl ModelType {
    pub fn as_str(&self) -> &str {
        match self {
            ModelType::Sdf => "sdf",
            ModelType::Urdf => "urdf",
        }
    }
}

/// One opaque model document plus its format tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityModel {
    pub model_type: ModelType,
    /// Serialized model document, forwarded verbatim to the engine.
    pub description: String,
}

impl EntityModel {
    pub fn new(model_type: ModelType, description: impl Into<String>) -> Self {
        Self {
            model_type,
            description: description.into(),
        }
    }
}

/// External collaborator that resolves a model-type key to a document.
pub trait ModelProvider: Send + Sync {
    /// Returns the model document for the requested format, if available.
    fn model(&self, model_type: ModelType) -> Option<&EntityModel>;
}

impl ModelProvider for EntityModel {
    fn model(&self, model_type: ModelType) -> Option<&EntityModel> {
        (self.model_type == model_type).then_some(self)
    }
}
