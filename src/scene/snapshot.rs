use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::store::Background;
use crate::element::{Element, ElementType};
use crate::error::{EditorError, EditorResult};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized, portable representation of a full scene.
///
/// The content is opaque to everything except the scene store; two
/// snapshots of the same scene compare byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneSnapshot(String);

impl SceneSnapshot {
    pub fn from_string(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse and validate without touching any scene
    pub fn decode(&self) -> EditorResult<SnapshotDocument> {
        let doc: SnapshotDocument = serde_json::from_str(&self.0)?;
        doc.validate()?;
        Ok(doc)
    }
}

/// The structured content of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub objects: Vec<ElementType>,
}

impl SnapshotDocument {
    pub fn encode(&self) -> EditorResult<SceneSnapshot> {
        serde_json::to_string(self)
            .map(SceneSnapshot)
            .map_err(|e| EditorError::Encode(e.to_string()))
    }

    fn validate(&self) -> EditorResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(EditorError::Deserialize(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(EditorError::Deserialize(format!(
                "invalid document size {}x{}",
                self.width, self.height
            )));
        }
        let mut seen = HashSet::new();
        for object in &self.objects {
            if !seen.insert(object.id()) {
                return Err(EditorError::Deserialize(format!("duplicate object id {}", object.id())));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Transform, factory};

    fn document() -> SnapshotDocument {
        SnapshotDocument {
            version: SNAPSHOT_VERSION,
            width: 640,
            height: 480,
            background: Background::Color {
                color: "#ffffff".to_owned(),
            },
            objects: vec![
                factory::create_image("https://ik.imagekit.io/demo/a.png", 640, 480, Transform::default()),
                factory::create_text("Hello", "Arial", 20.0, "#000000", Transform::at(5.0, 5.0)),
            ],
        }
    }

    #[test]
    fn encode_is_stable() {
        let doc = document();
        let first = doc.encode().unwrap();
        let second = first.decode().unwrap().encode().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn objects_are_tagged() {
        let blob = document().encode().unwrap();
        assert!(blob.as_str().contains(r#""type":"image""#));
        assert!(blob.as_str().contains(r#""type":"text""#));
    }

    #[test]
    fn rejects_foreign_formats() {
        assert!(matches!(
            SceneSnapshot::from_string("{\"objects\":[]}").decode(),
            Err(EditorError::Deserialize(_))
        ));
        assert!(SceneSnapshot::from_string("not json").decode().is_err());

        let mut doc = document();
        doc.version = 99;
        let blob = serde_json::to_string(&doc).unwrap();
        assert!(SceneSnapshot::from_string(blob).decode().is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut doc = document();
        let copy = doc.objects[0].clone();
        doc.objects.push(copy);
        let blob = serde_json::to_string(&doc).unwrap();
        assert!(SceneSnapshot::from_string(blob).decode().is_err());
    }
}
