use serde::{Deserialize, Serialize};

use crate::scene::SceneSnapshot;

/// Identifier of a project record in external storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flags that describe how the current image was derived from the original
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFlags {
    #[serde(default)]
    pub background_removed: bool,
    /// Transformation string last applied by the hosting service, if any
    #[serde(default)]
    pub active_transformations: Option<String>,
}

/// The fixed-resolution unit an editing session opens.
///
/// `width`/`height` are document pixels and do not depend on zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: ProjectId,
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Image the project was created from; never changes
    pub original_image: Option<String>,
    /// Latest baked raster, replaced by background removal and AI tools
    pub current_image: Option<String>,
    /// Last saved scene, if the project was edited before
    pub scene_snapshot: Option<SceneSnapshot>,
    #[serde(default)]
    pub flags: ImageFlags,
}

impl Document {
    /// The image a fresh scene should start from
    pub fn working_image(&self) -> Option<&str> {
        self.current_image.as_deref().or(self.original_image.as_deref())
    }

    /// File name for an export with the given extension
    pub fn export_file_name(&self, extension: &str) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
            .collect();
        let stem = if stem.is_empty() { "untitled".to_owned() } else { stem };
        format!("{}.{}", stem, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(title: &str) -> Document {
        Document {
            id: ProjectId("p1".to_owned()),
            title: title.to_owned(),
            width: 100,
            height: 100,
            original_image: Some("orig.png".to_owned()),
            current_image: None,
            scene_snapshot: None,
            flags: ImageFlags::default(),
        }
    }

    #[test]
    fn working_image_prefers_current() {
        let mut doc = document("x");
        assert_eq!(doc.working_image(), Some("orig.png"));
        doc.current_image = Some("cur.png".to_owned());
        assert_eq!(doc.working_image(), Some("cur.png"));
    }

    #[test]
    fn export_names_are_safe() {
        assert_eq!(document("Summer/Trip").export_file_name("png"), "Summer_Trip.png");
        assert_eq!(document("  ").export_file_name("jpg"), "untitled.jpg");
    }
}
