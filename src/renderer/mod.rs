//! Presents the scene fitted to a container and renders rasters of it.

mod export;
mod image_cache;
mod raster;
mod text;

use std::collections::BTreeSet;
use std::rc::Rc;

use egui::{Vec2, vec2};
use image::RgbaImage;

pub use export::{EXPORT_PRESETS, ExportFormat, ExportPreset, ExportedImage, encode};
pub use image_cache::ImageCache;
pub use raster::compose;
pub use text::FontBook;

use crate::config::EditorConfig;
use crate::element::{Element, ElementType};
use crate::error::EditorResult;
use crate::scene::{Background, SceneStore, Viewport};
use crate::services::ImageSource;

/// Largest zoom that fits a `document` into `container` minus `padding`, never above 1
pub fn fit_scale(container: Vec2, document: Vec2, padding: f32) -> f32 {
    let available = vec2((container.x - padding).max(1.0), (container.y - padding).max(1.0));
    let sx = available.x / document.x.max(1.0);
    let sy = available.y / document.y.max(1.0);
    sx.min(sy).min(1.0)
}

pub struct RenderSurface {
    source: Rc<dyn ImageSource>,
    cache: ImageCache,
    fonts: FontBook,
    container: Option<Vec2>,
    padding: f32,
    needs_redraw: bool,
}

impl RenderSurface {
    pub fn new(source: Rc<dyn ImageSource>, config: &EditorConfig) -> Self {
        Self {
            source,
            cache: ImageCache::new(config.image_cache_size),
            fonts: FontBook::new(),
            container: None,
            padding: config.viewport_padding,
            needs_redraw: true,
        }
    }

    /// Fit the document into a container of the given size. Returns the zoom.
    pub fn present(&mut self, scene: &mut SceneStore, container: Vec2) -> f32 {
        self.container = Some(container);
        let zoom = fit_scale(container, scene.size(), self.padding);
        scene.set_viewport(Viewport::with_zoom(zoom));
        self.needs_redraw = true;
        log::debug!("presenting {}x{} at zoom {:.3}", scene.width(), scene.height(), zoom);
        zoom
    }

    /// Fit again after the document size changed, using the last container
    pub fn refit(&mut self, scene: &mut SceneStore) -> Option<f32> {
        let container = self.container?;
        Some(self.present(scene, container))
    }

    pub fn container(&self) -> Option<Vec2> {
        self.container
    }

    /// On-screen size of the document at the current zoom
    pub fn display_size(&self, scene: &SceneStore) -> Vec2 {
        scene.size() * scene.viewport().zoom
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Returns whether a redraw was requested, clearing the request
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> EditorResult<()> {
        self.fonts.register(family, bytes)?;
        self.needs_redraw = true;
        Ok(())
    }

    /// Size text boxes from the registered fonts. Texts without a font keep the estimated width.
    pub fn measure_texts(&self, scene: &mut SceneStore) {
        if self.fonts.is_empty() {
            return;
        }
        for text_object in scene.texts_mut() {
            if let Some(font) = self.fonts.resolve(&text_object.font_family) {
                let width = text::measure(text_object, font);
                if text_object.measured_width != Some(width) {
                    log::trace!("text {} measured {:.1}px wide", text_object.id(), width);
                    text_object.measured_width = Some(width);
                }
            }
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Fetch and decode an image, returning its natural size. Cached sources are not fetched again.
    pub async fn load_image(&mut self, src: &str) -> EditorResult<(u32, u32)> {
        if let Some(image) = self.cache.source(src) {
            return Ok(image.dimensions());
        }
        let bytes = self.source.fetch(src).await?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        let dimensions = image.dimensions();
        self.cache.insert_source(src, image);
        self.needs_redraw = true;
        log::debug!("loaded {} ({}x{})", src, dimensions.0, dimensions.1);
        Ok(dimensions)
    }

    /// Load every image the scene references. Returns the sources that failed.
    pub async fn load_scene_images(&mut self, scene: &SceneStore) -> Vec<String> {
        let mut sources = BTreeSet::new();
        if let Background::Image(background) = scene.background() {
            sources.insert(background.src.clone());
        }
        for object in scene.objects() {
            if let ElementType::Image(image) = object {
                sources.insert(image.src.clone());
            }
        }
        let mut failed = Vec::new();
        for src in sources {
            if self.cache.has_source(&src) {
                continue;
            }
            if let Err(e) = self.load_image(&src).await {
                log::warn!("could not load {}: {}", src, e);
                failed.push(src);
            }
        }
        failed
    }

    /// Render what the user sees: the current viewport, overlays included
    pub fn render_view(&mut self, scene: &SceneStore) -> RgbaImage {
        let size = self.display_size(scene);
        compose(
            scene,
            scene.viewport(),
            size.x.ceil() as u32,
            size.y.ceil() as u32,
            &mut self.cache,
            &self.fonts,
            true,
        )
    }

    /// Render the document at its native resolution without tool overlays.
    ///
    /// The viewport is reset to identity for the render and restored afterwards,
    /// so the export never depends on the on-screen zoom.
    pub async fn export_raster(&mut self, scene: &mut SceneStore, preset: &ExportPreset, file_name: String) -> EditorResult<ExportedImage> {
        self.load_scene_images(scene).await;
        self.measure_texts(scene);

        let saved = scene.viewport();
        scene.set_viewport(Viewport::IDENTITY);
        let raster = compose(
            scene,
            scene.viewport(),
            scene.width(),
            scene.height(),
            &mut self.cache,
            &self.fonts,
            false,
        );
        scene.set_viewport(saved);

        let bytes = encode(&raster, preset)?;
        log::info!("exported {} ({} bytes)", file_name, bytes.len());
        Ok(ExportedImage {
            file_name,
            format: preset.format,
            width: raster.width(),
            height: raster.height(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_scale(vec2(5000.0, 5000.0), vec2(100.0, 100.0), 40.0), 1.0);
    }

    #[test]
    fn fit_uses_tighter_axis() {
        let zoom = fit_scale(vec2(440.0, 1040.0), vec2(1000.0, 1000.0), 40.0);
        assert!((zoom - 0.4).abs() < 1e-6);
    }

    #[test]
    fn tiny_containers_stay_positive() {
        let zoom = fit_scale(vec2(10.0, 10.0), vec2(1000.0, 1000.0), 40.0);
        assert!(zoom > 0.0);
    }
}
