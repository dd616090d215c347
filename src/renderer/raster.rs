use egui::{Color32, Pos2, Rect, Vec2, pos2};
use image::{Rgba, RgbaImage};

use super::image_cache::ImageCache;
use super::text::{self, FontBook};
use crate::element::{Element, ElementType, ImageElement, OverlayRect, Transform, parse_hex_color};
use crate::scene::{Background, SceneStore, Viewport};

/// Length of one dash (and one gap) of a dashed stroke, in screen pixels
const DASH_LENGTH: f32 = 6.0;

/// Source-over blend of an unpremultiplied color onto an unpremultiplied pixel
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let value = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba([r, g, b, a])
}

/// Screen-space pixel range covering a document rect, clipped to the canvas
fn pixel_bounds(canvas: &RgbaImage, viewport: Viewport, rect: Rect) -> Option<(u32, u32, u32, u32)> {
    let min = viewport.document_to_screen(rect.min);
    let max = viewport.document_to_screen(rect.max);
    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (max.y.ceil().max(0.0) as u32).min(canvas.height());
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Paint an object-shaped region by sampling its local box for every covered screen pixel
fn paint_local(
    canvas: &mut RgbaImage,
    viewport: Viewport,
    transform: &Transform,
    size: Vec2,
    mut sample: impl FnMut(Pos2) -> Option<Rgba<u8>>,
) {
    let Some((x0, y0, x1, y1)) = pixel_bounds(canvas, viewport, transform.bounding_rect(size)) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let doc = viewport.screen_to_document(pos2(x as f32 + 0.5, y as f32 + 0.5));
            let local = transform.document_to_local(size, doc);
            if local.x < 0.0 || local.y < 0.0 || local.x >= size.x || local.y >= size.y {
                continue;
            }
            if let Some(color) = sample(local) {
                blend(canvas.get_pixel_mut(x, y), color);
            }
        }
    }
}

fn sample_raster(raster: &RgbaImage, offset: Vec2, local: Pos2) -> Option<Rgba<u8>> {
    let sx = (offset.x + local.x).floor();
    let sy = (offset.y + local.y).floor();
    if sx < 0.0 || sy < 0.0 || sx >= raster.width() as f32 || sy >= raster.height() as f32 {
        return None;
    }
    Some(*raster.get_pixel(sx as u32, sy as u32))
}

fn draw_image(canvas: &mut RgbaImage, viewport: Viewport, image: &ImageElement, cache: &mut ImageCache) {
    let Some(pixels) = cache.filtered(&image.src, &image.filters) else {
        log::warn!("image {} is not loaded, skipping", image.src);
        return;
    };
    let offset = egui::vec2(image.crop_x, image.crop_y);
    paint_local(canvas, viewport, image.transform(), image.size(), |local| {
        sample_raster(&pixels, offset, local)
    });
}

fn draw_overlay(canvas: &mut RgbaImage, viewport: Viewport, rect: &OverlayRect) {
    let fill = rect.fill.as_deref().and_then(parse_hex_color).map(to_rgba);
    let stroke = rect.stroke.as_deref().and_then(parse_hex_color).map(to_rgba);
    let transform = rect.transform();
    let size = rect.size();
    let zoom = viewport.zoom.max(f32::EPSILON);
    let scale = transform.scale_x.abs().min(transform.scale_y.abs()).max(f32::EPSILON);
    // Stroke width is in document pixels; convert to local units
    let stroke_local = rect.stroke_width / scale;
    let dash_local = DASH_LENGTH / (zoom * scale);

    paint_local(canvas, viewport, transform, size, |local| {
        if let Some(color) = stroke {
            let distances = [local.x, local.y, size.x - local.x, size.y - local.y];
            let edge = distances.iter().copied().fold(f32::INFINITY, f32::min);
            if edge < stroke_local {
                let along = if local.y < stroke_local || size.y - local.y < stroke_local {
                    local.x
                } else {
                    local.y
                };
                let on = !rect.dashed || ((along / dash_local) as u32) % 2 == 0;
                if on {
                    return Some(color);
                }
            }
        }
        fill
    });
}

fn draw_background(canvas: &mut RgbaImage, viewport: Viewport, scene: &SceneStore, cache: &mut ImageCache) {
    match scene.background() {
        Background::None => {}
        Background::Color { color } => {
            let Some(color) = parse_hex_color(color).map(to_rgba) else {
                log::warn!("ignoring invalid background color {}", color);
                return;
            };
            let doc = Rect::from_min_size(Pos2::ZERO, scene.size());
            if let Some((x0, y0, x1, y1)) = pixel_bounds(canvas, viewport, doc) {
                for y in y0..y1 {
                    for x in x0..x1 {
                        blend(canvas.get_pixel_mut(x, y), color);
                    }
                }
            }
        }
        Background::Image(background) => {
            let Some(pixels) = cache.source(&background.src) else {
                log::warn!("background {} is not loaded, skipping", background.src);
                return;
            };
            let doc = Rect::from_min_size(Pos2::ZERO, scene.size());
            paint_local(canvas, viewport, &background.transform, background.size(), |local| {
                let point = background.transform.local_to_document(background.size(), local);
                if doc.contains(point) {
                    sample_raster(&pixels, Vec2::ZERO, local)
                } else {
                    None
                }
            });
        }
    }
}

/// Composite the scene into a `width` x `height` raster as seen through `viewport`.
///
/// Tool overlays are only drawn when `include_overlays` is set.
pub fn compose(
    scene: &SceneStore,
    viewport: Viewport,
    width: u32,
    height: u32,
    cache: &mut ImageCache,
    fonts: &FontBook,
    include_overlays: bool,
) -> RgbaImage {
    cache.begin_frame();
    let mut canvas = RgbaImage::new(width.max(1), height.max(1));
    draw_background(&mut canvas, viewport, scene, cache);

    for object in scene.objects() {
        if object.is_transient() && !include_overlays {
            continue;
        }
        match object {
            ElementType::Image(image) => draw_image(&mut canvas, viewport, image, cache),
            ElementType::Overlay(rect) => draw_overlay(&mut canvas, viewport, rect),
            ElementType::Text(text_object) => match fonts.resolve(&text_object.font_family) {
                Some(font) => {
                    let raster = text::rasterize(text_object, font);
                    paint_local(&mut canvas, viewport, text_object.transform(), text_object.size(), |local| {
                        sample_raster(&raster, Vec2::ZERO, local)
                    });
                }
                None => log::warn!("no font registered for text {}, skipping", text_object.id()),
            },
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;

    fn scene(background: Background) -> SceneStore {
        let mut scene = SceneStore::new();
        scene.initialize(100, 50, background).unwrap();
        scene
    }

    #[test]
    fn color_background_fills_document() {
        let scene = scene(Background::color("#ff0000"));
        let mut cache = ImageCache::new(4);
        let out = compose(&scene, Viewport::IDENTITY, 100, 50, &mut cache, &FontBook::new(), false);
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(99, 49).0, [255, 0, 0, 255]);
    }

    #[test]
    fn image_is_placed_and_cropped() {
        let mut scene = scene(Background::None);
        let mut source = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 255, 255]));
        for y in 0..10 {
            for x in 0..10 {
                source.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        let mut cache = ImageCache::new(4);
        cache.insert_source("a", source);
        let mut object = factory::create_image("a", 20, 10, Transform::at(10.0, 10.0));
        object.as_image_mut().unwrap().set_crop(10.0, 0.0, 10.0, 10.0).unwrap();
        scene.add_object(object).unwrap();

        let out = compose(&scene, Viewport::IDENTITY, 100, 50, &mut cache, &FontBook::new(), false);
        assert_eq!(out.get_pixel(5, 5).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(12, 12).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(25, 12).0, [0, 0, 0, 0]);
    }

    #[test]
    fn overlays_are_optional() {
        let mut scene = scene(Background::None);
        scene
            .add_object(factory::create_crop_frame(Rect::from_min_size(pos2(0.0, 0.0), egui::vec2(50.0, 40.0))))
            .unwrap();
        let mut cache = ImageCache::new(4);
        let fonts = FontBook::new();
        let hidden = compose(&scene, Viewport::IDENTITY, 100, 50, &mut cache, &fonts, false);
        assert_eq!(hidden.get_pixel(0, 1).0[3], 0);
        let shown = compose(&scene, Viewport::IDENTITY, 100, 50, &mut cache, &fonts, true);
        assert_eq!(shown.get_pixel(0, 1).0, [0, 188, 212, 255]);
    }

    #[test]
    fn zoom_scales_output() {
        let scene = scene(Background::color("#000000"));
        let mut cache = ImageCache::new(4);
        let out = compose(&scene, Viewport::with_zoom(0.5), 50, 25, &mut cache, &FontBook::new(), false);
        assert_eq!(out.dimensions(), (50, 25));
        assert_eq!(out.get_pixel(49, 24).0, [0, 0, 0, 255]);
    }
}
