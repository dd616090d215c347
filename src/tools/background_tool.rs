use super::{Tool, ToolContext, ToolId};
use crate::element::{ElementType, parse_hex_color};
use crate::error::{EditorError, EditorResult};
use crate::id_generator::{ObjectId, generate_id};
use crate::scene::{Background, BackgroundImage};
use crate::services::{ImageHost, ImageSearch, SearchResult};

/// Background fill, stock photo backgrounds, and AI background removal.
#[derive(Debug, Default)]
pub struct BackgroundTool {
    results: Vec<SearchResult>,
    last_query: Option<String>,
    removing: bool,
}

impl BackgroundTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn is_removing(&self) -> bool {
        self.removing
    }

    pub fn set_color(&mut self, color: &str, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        if parse_hex_color(color).is_none() {
            return Err(EditorError::InvalidState(format!("{} is not a hex color", color)));
        }
        cx.scene.set_background(Background::color(color))?;
        cx.surface.request_redraw();
        Ok(())
    }

    pub fn clear_background(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        cx.scene.set_background(Background::None)?;
        cx.surface.request_redraw();
        Ok(())
    }

    /// Search stock photos. A blank query returns nothing without calling the service.
    pub async fn search(&mut self, search: &dyn ImageSearch, query: &str) -> EditorResult<&[SearchResult]> {
        let query = query.trim();
        if query.is_empty() {
            self.results.clear();
            self.last_query = None;
            return Ok(&self.results);
        }
        self.results = search.search(query).await?;
        self.last_query = Some(query.to_owned());
        log::debug!("{} backgrounds for {:?}", self.results.len(), query);
        Ok(&self.results)
    }

    /// Use a search result as a cover-scaled background image
    pub async fn apply_image_background(&mut self, cx: &mut ToolContext<'_>, search: &dyn ImageSearch, result: &SearchResult) -> EditorResult<()> {
        search.track_download(&result.id);
        let (width, height) = cx.surface.load_image(&result.full_url).await?;
        let background = BackgroundImage::cover(
            result.full_url.clone(),
            width,
            height,
            cx.scene.width(),
            cx.scene.height(),
        );
        cx.scene.set_background(Background::Image(background))?;
        cx.surface.request_redraw();
        log::info!("background set to {} ({})", result.id, result.attribution);
        Ok(())
    }

    /// Swap the main image for a copy with its background removed.
    ///
    /// Returns the new object, or `None` when the image went away while the
    /// result was loading. Placement and filters carry over.
    pub async fn remove_background(&mut self, cx: &mut ToolContext<'_>, host: &dyn ImageHost) -> EditorResult<Option<ObjectId>> {
        let target = cx
            .scene
            .main_image()
            .ok_or_else(|| EditorError::NotFound("no image to remove the background from".to_owned()))?;
        let source = cx
            .scene
            .get(target)
            .and_then(ElementType::as_image)
            .map(|image| image.src.clone())
            .ok_or_else(|| EditorError::NotFound(format!("object {}", target)))?;
        let url = host.background_removed_url(&source)?;

        self.removing = true;
        let loaded = cx.surface.load_image(&url).await;
        self.removing = false;
        let (width, height) = loaded?;

        let Some(image) = cx.scene.get(target).and_then(ElementType::as_image) else {
            log::warn!("object {} is gone, discarding background removal", target);
            return Ok(None);
        };
        let replacement = image.with_source(generate_id(), url, width, height);
        let id = replacement.common.id;
        cx.scene.replace_object(target, ElementType::Image(replacement))?;
        cx.surface.request_redraw();
        log::info!("background removed from {} as {}", target, id);
        Ok(Some(id))
    }
}

impl Tool for BackgroundTool {
    fn id(&self) -> ToolId {
        ToolId::Background
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {
        self.removing = false;
    }

    fn current_state_name(&self) -> &'static str {
        if self.removing { "Removing" } else { "Idle" }
    }
}
