//! Model export: the artifact format and the artifact directory

mod serializer;
mod store;

pub use serializer::{ArtifactEnvelope, ArtifactMetadata};
pub use store::{ArtifactStore, ARTIFACT_EXTENSION};
