use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::error::{EditorError, EditorResult};

/// Result of uploading a raster to the hosting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub thumbnail_url: String,
    pub width: u32,
    pub height: u32,
}

/// Generative edits the hosting service can apply to an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "prompt", rename_all = "snake_case")]
pub enum AiEdit {
    Retouch,
    Upscale,
    Prompt(String),
}

/// Query parameter carrying the transformation chain
const TR_PARAM: &str = "tr";

/// Image upload plus URL-addressed transformations
pub trait ImageHost {
    fn upload_image<'a>(&'a self, bytes: Vec<u8>, file_name: &'a str) -> LocalBoxFuture<'a, EditorResult<UploadedImage>>;

    fn background_removed_url(&self, source: &str) -> EditorResult<String>;

    /// Generative fill padding the source out to `width` x `height`
    fn extended_url(&self, source: &str, width: u32, height: u32) -> EditorResult<String>;

    fn edited_url(&self, source: &str, edit: &AiEdit) -> EditorResult<String>;
}

/// Builds transformation URLs in the `?tr=step:step` style.
///
/// Only URLs served by `host` can be transformed. Steps already present on a
/// URL are kept, so transformations chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTransforms {
    host: String,
}

impl Default for UrlTransforms {
    fn default() -> Self {
        Self::new("ik.imagekit.io")
    }
}

impl UrlTransforms {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The parsed URL when it is an http(s) URL on this host
    fn parse_served(&self, source: &str) -> EditorResult<Url> {
        let url = Url::parse(source.trim())
            .map_err(|e| EditorError::ExternalService(format!("{} is not a valid image URL: {}", source, e)))?;
        let on_host = matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| host.eq_ignore_ascii_case(&self.host));
        if !on_host {
            return Err(EditorError::ExternalService(format!(
                "{} is not served by {}",
                source, self.host
            )));
        }
        Ok(url)
    }

    pub fn serves(&self, url: &str) -> bool {
        self.parse_served(url).is_ok()
    }

    /// Transformation steps already carried by `url`
    pub fn steps(url: &str) -> Vec<String> {
        let Ok(url) = Url::parse(url.trim()) else {
            return Vec::new();
        };
        url.query_pairs()
            .filter(|(key, _)| key == TR_PARAM)
            .flat_map(|(_, tr)| {
                tr.split(':')
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn append(&self, source: &str, step: &str) -> EditorResult<String> {
        let mut url = self.parse_served(source)?;
        let mut steps = Vec::new();
        let mut others = Vec::new();
        for (key, value) in url.query_pairs() {
            if key == TR_PARAM {
                steps.extend(value.split(':').filter(|s| !s.is_empty()).map(str::to_owned));
            } else {
                others.push((key.into_owned(), value.into_owned()));
            }
        }
        steps.push(step.to_owned());

        url.set_query(None);
        url.query_pairs_mut()
            .append_pair(TR_PARAM, &steps.join(":"))
            .extend_pairs(others);
        Ok(url.into())
    }

    pub fn thumbnail(&self, source: &str, width: u32, height: u32) -> EditorResult<String> {
        self.append(source, &format!("w-{},h-{}", width, height))
    }

    pub fn background_removed(&self, source: &str) -> EditorResult<String> {
        self.append(source, "e-bgremove")
    }

    pub fn extended(&self, source: &str, width: u32, height: u32) -> EditorResult<String> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidState(format!("invalid target size {}x{}", width, height)));
        }
        self.append(source, &format!("bg-genfill,w-{},h-{},cm-pad_resize", width, height))
    }

    pub fn edited(&self, source: &str, edit: &AiEdit) -> EditorResult<String> {
        match edit {
            AiEdit::Retouch => self.append(source, "e-retouch"),
            AiEdit::Upscale => self.append(source, "e-upscale"),
            AiEdit::Prompt(prompt) => {
                let prompt = prompt.trim();
                if prompt.is_empty() {
                    return Err(EditorError::InvalidState("edit prompt is empty".to_owned()));
                }
                // Encoded on its own so a ':' in the prompt cannot split the step
                let encoded: String = form_urlencoded::byte_serialize(prompt.as_bytes()).collect();
                self.append(source, &format!("e-edit-prompt-{}", encoded))
            }
        }
    }
}
