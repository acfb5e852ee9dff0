//! Artifacts: named binary blobs attached to a state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broad content class of an artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Document,
    #[default]
    Data,
    Image,
    Audio,
    Other,
}

/// A named, typed blob addressable by id within a state.
///
/// Ids are assigned by [`State::add_artifact`](super::State::add_artifact)
/// when empty and never change afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique id; empty until assigned on insert.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub kind: ArtifactKind,
    /// MIME type, when known (e.g. `image/png`).
    #[serde(default)]
    pub mime_type: String,
    #[serde(with = "serde_bytes_vec")]
    pub bytes: Vec<u8>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

// Plain Vec<u8> serde; kept as a named module so the representation can
// change (e.g. base64) without touching the struct.
mod serde_bytes_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        bytes.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        Vec::<u8>::deserialize(d)
    }
}

impl Artifact {
    /// A generic data artifact with no id yet.
    pub fn data(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: ArtifactKind::Data,
            bytes,
            ..Default::default()
        }
    }

    /// An image artifact with the given MIME type.
    pub fn image(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: ArtifactKind::Image,
            mime_type: mime_type.into(),
            bytes,
            ..Default::default()
        }
    }

    /// A document artifact with the given MIME type.
    pub fn document(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: ArtifactKind::Document,
            mime_type: mime_type.into(),
            bytes,
            ..Default::default()
        }
    }

    /// Attaches a metadata entry, returning the artifact for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Constructors set kind and MIME type; metadata chains.
    #[test]
    fn constructors_and_metadata() {
        let a = Artifact::image("chart", "image/png", vec![0x89, 0x50])
            .with_metadata("width", serde_json::json!(640));
        assert_eq!(a.kind, ArtifactKind::Image);
        assert_eq!(a.mime_type, "image/png");
        assert!(a.id.is_empty());
        assert_eq!(a.metadata["width"], serde_json::json!(640));
    }

    /// **Scenario**: Artifacts round-trip through serde including bytes.
    #[test]
    fn artifact_serde_roundtrip() {
        let a = Artifact::document("readme", "text/plain", b"hello".to_vec());
        let s = serde_json::to_string(&a).expect("serialize");
        let back: Artifact = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(a, back);
    }
}
